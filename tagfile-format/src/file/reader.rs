use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use byteorder::ReadBytesExt;

use super::{read_definitions, Session};
use crate::constants::{TAG_GROUP_END, TAG_SEPARATOR};
use crate::de::{read_count, read_elements, read_scalar};
use crate::definition::{Definitions, NodeId, Value, Vr};
use crate::error::{Error, OpenError, Result};
use crate::navigator::Scan;
use crate::report::{Mode, Report};
use crate::wire::{Element, WireType};

/// A dynamically typed item, as returned by [TagFileReader::read_any].
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Value(Value),
    /// The tag is absent from the stream and its declared default applies.
    Default(Value),
    Bytes(Vec<u8>),
    U16s(Vec<u16>),
    I32s(Vec<i32>),
    F32s(Vec<f32>),
    String(String),
    /// The group has been entered; holds its declared instance count.
    Group(u16),
}

#[derive(Debug)]
pub struct TagFileReader<R> {
    stream: R,
    session: Session,
}

impl TagFileReader<BufReader<File>> {
    /// Parses the definition file and opens the data file for reading.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        definition: P,
        data: Q,
    ) -> std::result::Result<TagFileReader<BufReader<File>>, OpenError> {
        let (definition, data) = (definition.as_ref(), data.as_ref());
        let defs = read_definitions(definition)?;
        let file = OpenOptions::new()
            .read(true)
            .open(data)
            .map_err(|e| OpenError::OpenData(e, data.to_path_buf()))?;

        tracing::debug!(
            definition = %definition.display(),
            data = %data.display(),
            nodes = defs.len(),
            "opened tagfile for reading"
        );

        Ok(TagFileReader {
            stream: BufReader::new(file),
            session: Session::new(defs, Mode::Reading).with_paths(definition, data),
        })
    }
}

impl<R: Read + Seek> TagFileReader<R> {
    pub fn new(defs: Definitions, stream: R) -> TagFileReader<R> {
        TagFileReader {
            stream,
            session: Session::new(defs, Mode::Reading),
        }
    }

    #[inline(always)]
    pub fn definitions(&self) -> &Definitions {
        self.session.nav.defs()
    }

    /// Number of groups currently entered.
    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.session.nav.depth()
    }

    #[inline(always)]
    pub fn has_error(&self) -> bool {
        self.session.has_error()
    }

    #[inline(always)]
    pub fn last_report(&self) -> Option<&Report> {
        self.session.last_report()
    }

    #[inline(always)]
    pub fn clear_error(&mut self) {
        self.session.clear_error()
    }

    /// Ends the session, failing if an error was recorded along the way.
    pub fn close(self) -> Result<()> {
        tracing::debug!(error = self.has_error(), "closed tagfile reader");
        self.session.guard()
    }

    pub fn into_inner(self) -> R {
        self.stream
    }

    fn run<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.session.guard()?;
        let result = op(self);
        self.session.check(result)
    }

    /// Enters group `tag`, returning the number of instances it declares.
    pub fn read_enter(&mut self, tag: u8) -> Result<u16> {
        self.run(|r| {
            let id = r.session.nav.locate(tag, Vr::Group)?;
            r.require(tag)?;
            r.enter(tag, id)
        })
    }

    pub fn read_leave(&mut self, tag: u8) -> Result<()> {
        self.run(|r| {
            r.session.nav.check_leave(tag)?;
            r.session.nav.scan_to(TAG_GROUP_END)?;
            if r.scan(TAG_GROUP_END)? == Scan::Absent {
                return Err(Error::GroupEndNotFound { tag });
            }

            if let Some(mismatch) = r.session.nav.instance_mismatch() {
                r.session.warn(mismatch);
            }
            r.session.nav.leave(tag)?;
            tracing::debug!(tag = format_args!("{:#04x}", tag), "left group");
            Ok(())
        })
    }

    /// Moves to the next instance of the current group. Returns `false` once
    /// the group has no further instance.
    pub fn read_next(&mut self) -> Result<bool> {
        self.run(|r| match r.scan(TAG_SEPARATOR)? {
            Scan::Found => {
                r.session.nav.next_instance();
                Ok(true)
            }
            Scan::Absent => Ok(false),
        })
    }

    pub fn read_uint(&mut self, tag: u8) -> Result<u32> {
        self.run(|r| match r.read_value(tag, Vr::Unsigned)? {
            Value::Unsigned(v) => Ok(v),
            other => Err(mismatch(tag, Vr::Unsigned, other)),
        })
    }

    pub fn read_int(&mut self, tag: u8) -> Result<i32> {
        self.run(|r| match r.read_value(tag, Vr::Signed)? {
            Value::Signed(v) => Ok(v),
            other => Err(mismatch(tag, Vr::Signed, other)),
        })
    }

    pub fn read_float(&mut self, tag: u8) -> Result<f32> {
        self.run(|r| match r.read_value(tag, Vr::Float)? {
            Value::Float(v) => Ok(v),
            other => Err(mismatch(tag, Vr::Float, other)),
        })
    }

    pub fn read_bool(&mut self, tag: u8) -> Result<bool> {
        self.run(|r| match r.read_value(tag, Vr::Bool)? {
            Value::Bool(v) => Ok(v),
            Value::Unsigned(v) => Ok(v != 0),
            other => Err(mismatch(tag, Vr::Bool, other)),
        })
    }

    /// Fills `out` from an array whose stored length must equal `out.len()`.
    pub fn read_array<T: Element>(&mut self, tag: u8, out: &mut [T]) -> Result<()> {
        self.run(|r| {
            let count = r.array_header::<T>(tag)?;
            if usize::from(count) != out.len() {
                return Err(Error::SizeMismatch {
                    tag,
                    expected: out.len(),
                    found: count,
                });
            }
            read_elements(&mut r.stream, out).map_err(|e| Error::at(&mut r.stream, e))
        })
    }

    /// Reads an array of whatever length is stored.
    pub fn read_array_dup<T: Element>(&mut self, tag: u8) -> Result<Vec<T>> {
        self.run(|r| {
            let count = r.array_header::<T>(tag)?;
            r.elements(usize::from(count))
        })
    }

    #[inline(always)]
    pub fn read_u8_array(&mut self, tag: u8, out: &mut [u8]) -> Result<()> {
        self.read_array(tag, out)
    }

    #[inline(always)]
    pub fn read_u16_array(&mut self, tag: u8, out: &mut [u16]) -> Result<()> {
        self.read_array(tag, out)
    }

    #[inline(always)]
    pub fn read_i32_array(&mut self, tag: u8, out: &mut [i32]) -> Result<()> {
        self.read_array(tag, out)
    }

    #[inline(always)]
    pub fn read_f32_array(&mut self, tag: u8, out: &mut [f32]) -> Result<()> {
        self.read_array(tag, out)
    }

    #[inline(always)]
    pub fn read_u8_array_dup(&mut self, tag: u8) -> Result<Vec<u8>> {
        self.read_array_dup(tag)
    }

    /// Reads a string whose stored size, terminating NUL included, is at most
    /// `capacity` bytes.
    pub fn read_string(&mut self, tag: u8, capacity: usize) -> Result<String> {
        self.run(|r| {
            r.session.nav.locate(tag, Vr::String)?;
            r.require(tag)?;
            r.string(tag, Some(capacity))
        })
    }

    pub fn read_string_dup(&mut self, tag: u8) -> Result<String> {
        self.run(|r| {
            r.session.nav.locate(tag, Vr::String)?;
            r.require(tag)?;
            r.string(tag, None)
        })
    }

    /// Reads `tag` as whatever the stream holds for it. Groups are entered.
    ///
    /// Returns `None` when the tag is absent and declares no default.
    pub fn read_any(&mut self, tag: u8) -> Result<Option<Item>> {
        self.run(|r| {
            if tag == TAG_SEPARATOR || tag == TAG_GROUP_END {
                return Err(Error::ReservedTag { tag });
            }
            let id = r.session.nav.scan_to(tag)?;
            let def = &r.session.nav.defs()[id];
            let (vr, default) = (def.vr(), def.default());

            if r.scan(tag)? == Scan::Absent {
                return Ok(default.map(Item::Default));
            }

            let item = match vr {
                Vr::Group => Item::Group(r.enter(tag, id)?),
                Vr::String => r.string(tag, None).map(Item::String)?,
                _ => {
                    let wire = r.wire_type(tag)?;
                    match wire {
                        WireType::U8Array if vr == Vr::Unsigned || vr == Vr::Bool => {
                            Item::Bytes(r.counted()?)
                        }
                        WireType::U16Array if vr == Vr::Unsigned => Item::U16s(r.counted()?),
                        WireType::S32Array if vr == Vr::Signed => Item::I32s(r.counted()?),
                        WireType::FloatArray if vr == Vr::Float => Item::F32s(r.counted()?),
                        wire if accepts(vr, wire) => Item::Value(r.scalar(wire)?),
                        found => return Err(Error::UnexpectedWireType { tag, vr, found }),
                    }
                }
            };

            Ok(Some(item))
        })
    }

    fn read_value(&mut self, tag: u8, vr: Vr) -> Result<Value> {
        let id = self.session.nav.locate(tag, vr)?;
        if !self.find(tag, id)? {
            return self.session.nav.defs()[id]
                .default()
                .ok_or(Error::MissingTag { tag });
        }

        let wire = self.wire_type(tag)?;
        if !accepts(vr, wire) {
            return Err(Error::UnexpectedWireType {
                tag,
                vr,
                found: wire,
            });
        }
        self.scalar(wire)
    }

    /// Scans to `tag`, reporting absence only when its definition has a
    /// default to fall back on.
    fn find(&mut self, tag: u8, id: NodeId) -> Result<bool> {
        match self.scan(tag)? {
            Scan::Found => Ok(true),
            Scan::Absent if self.session.nav.defs()[id].default().is_some() => Ok(false),
            Scan::Absent => Err(Error::MissingTag { tag }),
        }
    }

    /// Scans to a tag that must be present.
    fn require(&mut self, tag: u8) -> Result<()> {
        match self.scan(tag)? {
            Scan::Found => Ok(()),
            Scan::Absent => Err(Error::MissingTag { tag }),
        }
    }

    #[inline(always)]
    fn scan(&mut self, tag: u8) -> Result<Scan> {
        self.session.nav.scan_stream(&mut self.stream, tag)
    }

    fn enter(&mut self, tag: u8, id: NodeId) -> Result<u16> {
        let wire = self.wire_type(tag)?;
        if wire != WireType::Group {
            return Err(Error::UnexpectedWireType {
                tag,
                vr: Vr::Group,
                found: wire,
            });
        }
        let count = self.count()?;
        self.session.nav.enter(id, count);

        tracing::debug!(
            tag = format_args!("{:#04x}", tag),
            instances = count,
            depth = self.session.nav.depth(),
            "entered group"
        );
        Ok(count)
    }

    fn array_header<T: Element>(&mut self, tag: u8) -> Result<u16> {
        self.session.nav.locate(tag, T::VR)?;
        self.require(tag)?;

        let wire = self.wire_type(tag)?;
        if wire != T::WIRE_TYPE {
            return Err(Error::UnexpectedWireType {
                tag,
                vr: T::VR,
                found: wire,
            });
        }
        self.count()
    }

    /// Reads the count and elements of an array whose wire type has been
    /// consumed.
    fn counted<T: Element>(&mut self) -> Result<Vec<T>> {
        let count = self.count()?;
        self.elements(usize::from(count))
    }

    fn elements<T: Element>(&mut self, count: usize) -> Result<Vec<T>> {
        let mut out = vec![T::default(); count];
        read_elements(&mut self.stream, &mut out).map_err(|e| Error::at(&mut self.stream, e))?;
        Ok(out)
    }

    /// Reads a string item positioned at its wire type byte.
    fn string(&mut self, tag: u8, capacity: Option<usize>) -> Result<String> {
        let wire = self.wire_type(tag)?;
        if wire != WireType::U8Array {
            return Err(Error::UnexpectedWireType {
                tag,
                vr: Vr::String,
                found: wire,
            });
        }

        let size = self.count()?;
        if let Some(capacity) = capacity {
            if usize::from(size) > capacity {
                return Err(Error::BufferTooSmall {
                    tag,
                    size,
                    capacity,
                });
            }
        }

        let mut bytes: Vec<u8> = self.elements(usize::from(size))?;
        if bytes.pop() != Some(0) {
            return Err(Error::UnterminatedString { tag });
        }
        String::from_utf8(bytes).map_err(|source| Error::InvalidString { tag, source })
    }

    fn wire_type(&mut self, tag: u8) -> Result<WireType> {
        let id = self
            .stream
            .read_u8()
            .map_err(|e| Error::at(&mut self.stream, e))?;
        WireType::from_id(id).ok_or(Error::InvalidWireType { tag, wire: id })
    }

    #[inline(always)]
    fn count(&mut self) -> Result<u16> {
        read_count(&mut self.stream).map_err(|e| Error::at(&mut self.stream, e))
    }

    fn scalar(&mut self, wire: WireType) -> Result<Value> {
        read_scalar(&mut self.stream, wire)
            .map(Value::from)
            .map_err(|e| Error::at(&mut self.stream, e))
    }
}

/// Scalar wire types a reader accepts for a declared value representation.
fn accepts(vr: Vr, wire: WireType) -> bool {
    use WireType::*;

    match vr {
        Vr::Unsigned => matches!(wire, U8 | U16 | U32),
        Vr::Signed => matches!(wire, S8 | S16 | S32),
        Vr::Float => wire == Float,
        Vr::Bool => matches!(wire, Bool | U8),
        Vr::String | Vr::Group | Vr::End => false,
    }
}

fn mismatch(tag: u8, expected: Vr, value: Value) -> Error {
    Error::TypeMismatch {
        tag,
        expected,
        declared: value.vr(),
    }
}
