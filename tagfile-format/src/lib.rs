//! Reading and writing of tagfiles: compact binary records whose layout is
//! described by a separate, line-oriented definition file.
//!
//! Every item in a tagfile is a one byte tag, a one byte wire type and a
//! big-endian payload. Groups nest further items and may repeat. Because the
//! wire type tells how long an item is, readers skip whatever they do not ask
//! for, and writers omit values equal to their declared default.
//!
//! ```no_run
//! use tagfile_format::{TagFileReader, TagFileWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = TagFileWriter::create("save.def", "save.bin")?;
//! writer.write_uint(0x01, 7)?;
//! writer.write_enter(0x02, 1)?;
//! writer.write_u16_array(0x01, &[11, 13, 15])?;
//! writer.write_leave(0x02)?;
//! writer.close()?;
//!
//! let mut reader = TagFileReader::open("save.def", "save.bin")?;
//! assert_eq!(reader.read_uint(0x01)?, 7);
//! reader.read_enter(0x02)?;
//! let mut values = [0u16; 3];
//! reader.read_u16_array(0x01, &mut values)?;
//! reader.read_leave(0x02)?;
//! reader.close()?;
//! # Ok(())
//! # }
//! ```

mod de;
pub mod definition;
mod error;
mod file;
mod navigator;
pub mod report;
mod ser;
mod wire;

pub use definition::{Definition, Definitions, NodeId, ParseError, Value, Vr};
pub use error::{Error, OpenError, Result};
pub use file::{Item, TagFileReader, TagFileWriter};
pub use report::{Mode, Report, Severity, TraceFrame};
pub use wire::{constants, Element, WireType};
