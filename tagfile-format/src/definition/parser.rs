use std::iter::Enumerate;
use std::str::Lines;

use super::{Definition, Definitions, NodeId, ParseError, Value, Vr};
use crate::constants::{TAG_GROUP_END, TAG_SEPARATOR};

pub(super) fn parse(text: &str) -> Result<Definitions, ParseError> {
    let mut parser = Parser {
        lines: text.lines().enumerate(),
        nodes: Vec::new(),
        depth: 0,
    };

    let root = parser.parse_scope(None)?;
    debug_assert_eq!(parser.depth, 0);

    tracing::debug!(definitions = parser.nodes.len(), "parsed definitions");

    Ok(Definitions {
        nodes: parser.nodes,
        root,
    })
}

struct Parser<'a> {
    lines: Enumerate<Lines<'a>>,
    nodes: Vec<Definition>,
    /// Groups opened but not yet closed by an `EN` line.
    depth: usize,
}

impl Parser<'_> {
    /// Reads sibling definitions until the `EN` closing `parent`, or until the
    /// end of input for the top level. Returns the first sibling.
    fn parse_scope(&mut self, parent: Option<NodeId>) -> Result<Option<NodeId>, ParseError> {
        let mut first = None;
        let mut prev: Option<NodeId> = None;

        while let Some((index, raw)) = self.lines.next() {
            let line = index + 1;
            let text = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if text.is_empty() {
                continue;
            }

            let entry = parse_line(line, text)?;

            if entry.vr == Vr::End && parent.is_none() {
                return Err(ParseError::UnmatchedGroupEnd { line });
            }

            if let Some(prev) = prev {
                let previous = self.nodes[prev.0].tag;
                if entry.tag <= previous {
                    return Err(ParseError::NotAscending {
                        line,
                        tag: entry.tag,
                        previous,
                    });
                }
            }

            let id = NodeId(self.nodes.len());
            self.nodes.push(Definition {
                tag: entry.tag,
                vr: entry.vr,
                vm: entry.vm,
                default: entry.default,
                line,
                parent,
                child: None,
                next: None,
            });

            match prev {
                Some(prev) => self.nodes[prev.0].next = Some(id),
                None => first = Some(id),
            }
            prev = Some(id);

            match entry.vr {
                Vr::Group => {
                    self.depth += 1;
                    let child = self.parse_scope(Some(id))?;
                    self.nodes[id.0].child = child;
                }
                Vr::End => {
                    self.depth -= 1;
                    return Ok(first);
                }
                _ => {}
            }
        }

        match parent {
            Some(parent) => {
                let group = &self.nodes[parent.0];
                Err(ParseError::UnterminatedGroup {
                    tag: group.tag,
                    line: group.line,
                    depth: self.depth,
                })
            }
            None => Ok(first),
        }
    }
}

struct Entry {
    tag: u8,
    vr: Vr,
    vm: u32,
    default: Option<Value>,
}

fn parse_line(line: usize, text: &str) -> Result<Entry, ParseError> {
    let mut fields = text.split_whitespace();

    let (tag, vr, vm) = match (fields.next(), fields.next(), fields.next()) {
        (Some(tag), Some(vr), Some(vm)) => (tag, vr, vm),
        _ => return Err(ParseError::Malformed { line }),
    };

    let vr = Vr::from_code(vr).ok_or_else(|| ParseError::InvalidVr {
        line,
        value: vr.to_string(),
    })?;

    let digits = tag
        .strip_prefix("0x")
        .or_else(|| tag.strip_prefix("0X"))
        .unwrap_or(tag);
    let parsed = u8::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidTag {
        line,
        value: tag.to_string(),
    })?;

    // Group ends are addressed by the stream sentinel, whatever the file says.
    let tag = if vr == Vr::End {
        TAG_GROUP_END
    } else if parsed == TAG_SEPARATOR || parsed == TAG_GROUP_END {
        return Err(ParseError::ReservedTag { line, tag: parsed });
    } else {
        parsed
    };

    let vm = vm.parse::<u32>().map_err(|_| ParseError::InvalidMultiplicity {
        line,
        value: vm.to_string(),
    })?;

    let default = match fields.next() {
        None => None,
        Some(_) if !vr.accepts_default() => {
            return Err(ParseError::UnexpectedDefault { line, vr });
        }
        Some(value) => Some(parse_default(line, vr, value)?),
    };

    if let Some(value) = fields.next() {
        return Err(ParseError::TrailingField {
            line,
            value: value.to_string(),
        });
    }

    Ok(Entry {
        tag,
        vr,
        vm,
        default,
    })
}

fn parse_default(line: usize, vr: Vr, value: &str) -> Result<Value, ParseError> {
    let parsed = match vr {
        Vr::Signed => value.parse::<i32>().ok().map(Value::Signed),
        Vr::Unsigned => value.parse::<u32>().ok().map(Value::Unsigned),
        Vr::Float => value.parse::<f32>().ok().map(Value::Float),
        Vr::Bool => match value {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => value.parse::<u32>().ok().map(|v| Value::Bool(v != 0)),
        },
        Vr::String | Vr::Group | Vr::End => None,
    };

    parsed.ok_or_else(|| ParseError::InvalidDefault {
        line,
        vr,
        value: value.to_string(),
    })
}
