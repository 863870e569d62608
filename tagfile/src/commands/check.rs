use std::io::{self, Write};
use std::path::Path;

use tagfile_format::definition::Siblings;
use tagfile_format::{Definitions, Vr};

use crate::error::Error;

pub fn run(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::ReadDefinition {
        path: path.to_path_buf(),
        source,
    })?;
    let defs: Definitions = text.parse().map_err(|source| Error::InvalidDefinition {
        path: path.to_path_buf(),
        source,
    })?;

    let mut out = io::stdout().lock();
    writeln!(out, "Tag   VR  Mult   Default  Line")?;
    writeln!(out, "----  --  -----  -------  ----")?;
    write_scope(&mut out, &defs, defs.top_level(), 0)?;
    writeln!(out, "\n{} definitions in `{}`", defs.len(), path.display())?;

    Ok(())
}

fn write_scope<W: Write>(
    out: &mut W,
    defs: &Definitions,
    scope: Siblings<'_>,
    depth: usize,
) -> io::Result<()> {
    for (id, def) in scope {
        let default = def
            .default()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".into());

        writeln!(
            out,
            "{:indent$}{:#04x}  {}  {:>5}  {:<7}  {}",
            "",
            def.tag(),
            def.vr(),
            def.multiplicity(),
            default,
            def.line(),
            indent = depth * 2
        )?;

        if def.vr() == Vr::Group {
            write_scope(out, defs, defs.children(id), depth + 1)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_definitions_are_indented() {
        let defs: Definitions = "01 US 1 101\n02 GR 1\n  01 US 3\n  ff EN 0\n"
            .parse()
            .unwrap();
        let mut out = Vec::new();
        write_scope(&mut out, &defs, defs.top_level(), 0).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "0x01  US      1  101      1",
                "0x02  GR      1  -        2",
                "  0x01  US      3  -        3",
                "  0xff  EN      0  -        4",
            ]
        );
    }
}
