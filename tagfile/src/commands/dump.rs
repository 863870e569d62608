use std::io::{self, Read, Seek, Write};
use std::path::Path;

use humansize::{file_size_opts as options, FileSize};
use serde_json::json;
use tagfile_format::{Definitions, Item, NodeId, Severity, TagFileReader, Value, Vr};

use crate::error::Error;

/// One present (or defaulted) tag of an instance.
#[derive(Debug)]
struct Entry {
    tag: u8,
    vr: Vr,
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    Item(Item),
    Group {
        declared: u16,
        instances: Vec<Vec<Entry>>,
    },
}

pub fn run(definition: &Path, data: &Path, json: bool) -> anyhow::Result<()> {
    let mut reader =
        TagFileReader::open(definition, data).map_err(|source| Error::OpenTagfile {
            path: data.to_path_buf(),
            source,
        })?;
    let size = std::fs::metadata(data).map(|m| m.len()).unwrap_or(0);

    let defs = reader.definitions().clone();
    let entries = read_scope(&mut reader, &defs, defs.root())?;
    reader.close().map_err(|source| Error::Close {
        path: data.to_path_buf(),
        source,
    })?;

    if json {
        let doc = json!({
            "definition": definition.display().to_string(),
            "data": data.display().to_string(),
            "size": size,
            "items": entries_json(&entries),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        let size = size
            .file_size(options::BINARY)
            .unwrap_or_else(|_| format!("{} B", size));
        println!(
            "{} ({}) using definition file {}",
            data.display(),
            size,
            definition.display()
        );
        write_entries(&mut io::stdout().lock(), &entries, 0)?;
    }

    Ok(())
}

/// Reads every tag declared in a scope, recursing into each instance of a
/// present group.
fn read_scope<R: Read + Seek>(
    reader: &mut TagFileReader<R>,
    defs: &Definitions,
    first: Option<NodeId>,
) -> Result<Vec<Entry>, Error> {
    let mut entries = Vec::new();

    for (_, def) in defs.siblings(first) {
        let (tag, vr) = (def.tag(), def.vr());
        if vr == Vr::End {
            break;
        }

        let item = reader
            .read_any(tag)
            .map_err(|source| Error::Read { tag, source })?;

        let kind = match item {
            None => continue,
            Some(Item::Group(declared)) => {
                let mut instances = Vec::new();
                loop {
                    instances.push(read_scope(reader, defs, def.first_child())?);
                    let more = reader
                        .read_next()
                        .map_err(|source| Error::Read { tag, source })?;
                    if !more {
                        break;
                    }
                }
                reader
                    .read_leave(tag)
                    .map_err(|source| Error::Read { tag, source })?;
                pass_warning(reader);

                Kind::Group {
                    declared,
                    instances,
                }
            }
            Some(item) => Kind::Item(item),
        };

        entries.push(Entry { tag, vr, kind });
    }

    Ok(entries)
}

/// A count mismatch is only a warning; print it and keep going.
fn pass_warning<R: Read + Seek>(reader: &mut TagFileReader<R>) {
    let warning = match reader.last_report() {
        Some(report) if report.severity() == Severity::Warning => report.to_string(),
        _ => return,
    };
    eprintln!("warning: {}", warning);
    reader.clear_error();
}

fn write_entries<W: Write>(out: &mut W, entries: &[Entry], depth: usize) -> io::Result<()> {
    for entry in entries {
        match &entry.kind {
            Kind::Item(item) => writeln!(
                out,
                "{:indent$}{:#04x} {} {}",
                "",
                entry.tag,
                entry.vr,
                describe(item),
                indent = depth * 2
            )?,
            Kind::Group {
                declared,
                instances,
            } => {
                writeln!(
                    out,
                    "{:indent$}{:#04x} {} {} declared, {} found",
                    "",
                    entry.tag,
                    entry.vr,
                    declared,
                    instances.len(),
                    indent = depth * 2
                )?;
                for (index, instance) in instances.iter().enumerate() {
                    writeln!(out, "{:indent$}[{}]", "", index, indent = depth * 2 + 2)?;
                    write_entries(out, instance, depth + 2)?;
                }
            }
        }
    }
    Ok(())
}

fn describe(item: &Item) -> String {
    match item {
        Item::Value(value) => value.to_string(),
        Item::Default(value) => format!("{} (default)", value),
        Item::Bytes(v) => format!("{:?}", v),
        Item::U16s(v) => format!("{:?}", v),
        Item::I32s(v) => format!("{:?}", v),
        Item::F32s(v) => format!("{:?}", v),
        Item::String(s) => format!("{:?}", s),
        Item::Group(count) => format!("<group of {}>", count),
    }
}

fn entries_json(entries: &[Entry]) -> serde_json::Value {
    entries
        .iter()
        .map(|entry| {
            let tag = format!("{:#04x}", entry.tag);
            let vr = entry.vr.to_string();
            match &entry.kind {
                Kind::Item(Item::Default(value)) => json!({
                    "tag": tag,
                    "vr": vr,
                    "value": value_json(*value),
                    "default": true,
                }),
                Kind::Item(item) => json!({
                    "tag": tag,
                    "vr": vr,
                    "value": item_json(item),
                }),
                Kind::Group {
                    declared,
                    instances,
                } => json!({
                    "tag": tag,
                    "vr": vr,
                    "declared": declared,
                    "instances": instances.iter().map(|i| entries_json(i)).collect::<Vec<_>>(),
                }),
            }
        })
        .collect()
}

fn item_json(item: &Item) -> serde_json::Value {
    match item {
        Item::Value(value) | Item::Default(value) => value_json(*value),
        Item::Bytes(v) => json!(v),
        Item::U16s(v) => json!(v),
        Item::I32s(v) => json!(v),
        Item::F32s(v) => json!(v),
        Item::String(s) => json!(s),
        Item::Group(count) => json!(count),
    }
}

fn value_json(value: Value) -> serde_json::Value {
    match value {
        Value::Unsigned(v) => json!(v),
        Value::Signed(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::Bool(v) => json!(v),
    }
}
