use std::io::Seek;
use std::path::PathBuf;

use crate::definition::{ParseError, Vr};
use crate::wire::WireType;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure to set up a session from a definition file and a data file.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("Could not read definition file. Path: '{}'", .1.display())]
    ReadDefinition(#[source] std::io::Error, PathBuf),

    #[error("Invalid definition file. Path: '{}'", .1.display())]
    InvalidDefinition(#[source] ParseError, PathBuf),

    #[error("Could not open data file. Path: '{}'", .1.display())]
    OpenData(#[source] std::io::Error, PathBuf),
}

/// Failure of a read or write operation on an open session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Trying to access tag {tag:#04x} that is not larger than previous tag {last:#04x}")]
    OutOfOrder { tag: u8, last: u8 },

    #[error("Unknown tag {tag:#04x} sought")]
    UnknownTag { tag: u8 },

    #[error("Tag {tag:#04x} is given as {expected} but is declared as {declared}")]
    TypeMismatch { tag: u8, expected: Vr, declared: Vr },

    #[error("Tag {tag:#04x} is reserved and cannot be addressed directly")]
    ReservedTag { tag: u8 },

    #[error("Tag {tag:#04x} not found and no default")]
    MissingTag { tag: u8 },

    #[error("Stream error{}: {source}", at_offset(.position))]
    Io {
        position: Option<u64>,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid wire type {wire:#04x} for tag {tag:#04x}")]
    InvalidWireType { tag: u8, wire: u8 },

    #[error("Tag {tag:#04x} is stored as {found}, which does not fit {vr}")]
    UnexpectedWireType { tag: u8, vr: Vr, found: WireType },

    #[error("Tag {tag:#04x} holds {found} elements, expected {expected}")]
    SizeMismatch { tag: u8, expected: usize, found: u16 },

    #[error("Array for tag {tag:#04x} has {len} elements, more than the format can hold")]
    ArrayTooLong { tag: u8, len: usize },

    #[error("Given string for tag {tag:#04x} is too long (size {size} > limit {limit})")]
    StringTooLong { tag: u8, size: usize, limit: usize },

    #[error("String for tag {tag:#04x} needs {size} bytes, larger than user maxlen {capacity}")]
    BufferTooSmall { tag: u8, size: u16, capacity: usize },

    #[error("Tag {tag:#04x} is a string that is not zero terminated")]
    UnterminatedString { tag: u8 },

    #[error("Tag {tag:#04x} is a string that is not valid UTF-8")]
    InvalidString {
        tag: u8,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Cannot leave group {tag:#04x}, at highest level already")]
    NotInGroup { tag: u8 },

    #[error("Trying to leave the wrong group! We are in {current:#04x}, leaving {tag:#04x}")]
    WrongGroup { tag: u8, current: u8 },

    #[error("Cannot leave group {tag:#04x}, group end tag not found")]
    GroupEndNotFound { tag: u8 },

    #[error("Expected {expected} items in group {tag:#04x}, found {found}")]
    CountMismatch { tag: u8, expected: u16, found: u32 },

    #[error("Session is unusable after an earlier error")]
    Poisoned,
}

impl Error {
    /// Wraps an I/O failure with the stream position it happened at, if the
    /// stream can still tell.
    pub(crate) fn at<S: Seek>(stream: &mut S, source: std::io::Error) -> Error {
        Error::Io {
            position: stream.stream_position().ok(),
            source,
        }
    }
}

fn at_offset(position: &Option<u64>) -> String {
    match position {
        Some(position) => format!(" at offset {:#x}", position),
        None => String::new(),
    }
}
