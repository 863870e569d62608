use super::Vr;

/// A definition file that could not be turned into a [Definitions](super::Definitions) tree.
///
/// Lines are 1-based and count comments and blank lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("bad definition on line {line}, expected `<tag> <VR> <multiplicity> [default]`")]
    Malformed { line: usize },

    #[error("invalid tag `{value}` on line {line}")]
    InvalidTag { line: usize, value: String },

    #[error("tag {tag:#04x} on line {line} is reserved for stream sentinels")]
    ReservedTag { line: usize, tag: u8 },

    #[error("invalid value representation `{value}` on line {line}")]
    InvalidVr { line: usize, value: String },

    #[error("invalid multiplicity `{value}` on line {line}")]
    InvalidMultiplicity { line: usize, value: String },

    #[error("invalid {vr} default `{value}` on line {line}")]
    InvalidDefault { line: usize, vr: Vr, value: String },

    #[error("{vr} on line {line} does not take a default value")]
    UnexpectedDefault { line: usize, vr: Vr },

    #[error("unexpected field `{value}` on line {line}")]
    TrailingField { line: usize, value: String },

    #[error("tag {tag:#04x} on line {line} does not follow {previous:#04x}; tags must increase within a group")]
    NotAscending { line: usize, tag: u8, previous: u8 },

    #[error("group end on line {line} has no matching group")]
    UnmatchedGroupEnd { line: usize },

    #[error("group {tag:#04x} opened on line {line} is never closed ({depth} groups open at end of input)")]
    UnterminatedGroup { tag: u8, line: usize, depth: usize },
}

impl ParseError {
    pub fn line(&self) -> usize {
        use ParseError::*;

        match self {
            Malformed { line }
            | InvalidTag { line, .. }
            | ReservedTag { line, .. }
            | InvalidVr { line, .. }
            | InvalidMultiplicity { line, .. }
            | InvalidDefault { line, .. }
            | UnexpectedDefault { line, .. }
            | TrailingField { line, .. }
            | NotAscending { line, .. }
            | UnmatchedGroupEnd { line }
            | UnterminatedGroup { line, .. } => *line,
        }
    }
}
