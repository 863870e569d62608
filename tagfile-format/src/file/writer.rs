use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use byteorder::WriteBytesExt;

use super::{read_definitions, Session};
use crate::constants::{TAG_GROUP_END, TAG_SEPARATOR};
use crate::definition::{Definitions, Value, Vr};
use crate::error::{Error, OpenError, Result};
use crate::report::{Mode, Report};
use crate::ser::{GroupHeader, Scalar, Serialize};
use crate::wire::Element;

#[derive(Debug)]
pub struct TagFileWriter<W> {
    stream: W,
    session: Session,
}

impl TagFileWriter<BufWriter<File>> {
    /// Parses the definition file and creates (or truncates) the data file.
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(
        definition: P,
        data: Q,
    ) -> std::result::Result<TagFileWriter<BufWriter<File>>, OpenError> {
        let (definition, data) = (definition.as_ref(), data.as_ref());
        let defs = read_definitions(definition)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(data)
            .map_err(|e| OpenError::OpenData(e, data.to_path_buf()))?;

        tracing::debug!(
            definition = %definition.display(),
            data = %data.display(),
            nodes = defs.len(),
            "created tagfile for writing"
        );

        Ok(TagFileWriter {
            stream: BufWriter::new(file),
            session: Session::new(defs, Mode::Writing).with_paths(definition, data),
        })
    }
}

impl<W: Write + Seek> TagFileWriter<W> {
    pub fn new(defs: Definitions, stream: W) -> TagFileWriter<W> {
        TagFileWriter {
            stream,
            session: Session::new(defs, Mode::Writing),
        }
    }

    #[inline(always)]
    pub fn definitions(&self) -> &Definitions {
        self.session.nav.defs()
    }

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

    /// Flushes and hands back the stream, failing if an error was recorded.
    pub fn finish(mut self) -> Result<W> {
        self.session.guard()?;
        let position = self
            .stream
            .stream_position()
            .map_err(|e| Error::at(&mut self.stream, e))?;
        self.stream
            .flush()
            .map_err(|e| Error::at(&mut self.stream, e))?;

        tracing::debug!(
            end = format_args!("{:#x}", position),
            "finished tagfile"
        );
        Ok(self.stream)
    }

    #[inline(always)]
    pub fn close(self) -> Result<()> {
        self.finish().map(|_| ())
    }

    fn run<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.session.guard()?;
        let result = op(self);
        self.session.check(result)
    }

    /// Opens group `tag`, which will hold `elements` instances separated by
    /// [write_next](Self::write_next).
    pub fn write_enter(&mut self, tag: u8, elements: u16) -> Result<()> {
        self.run(|w| {
            let id = w.session.nav.locate(tag, Vr::Group)?;
            w.emit(tag, &GroupHeader(elements))?;
            w.session.nav.enter(id, elements);

            tracing::debug!(
                tag = format_args!("{:#04x}", tag),
                instances = elements,
                depth = w.session.nav.depth(),
                "entered group"
            );
            Ok(())
        })
    }

    pub fn write_leave(&mut self, tag: u8) -> Result<()> {
        self.run(|w| {
            w.session.nav.check_leave(tag)?;
            w.sentinel(TAG_GROUP_END)?;
            w.session.nav.scan_to(TAG_GROUP_END)?;

            if let Some(mismatch) = w.session.nav.instance_mismatch() {
                w.session.warn(mismatch);
            }
            w.session.nav.leave(tag)?;
            tracing::debug!(tag = format_args!("{:#04x}", tag), "left group");
            Ok(())
        })
    }

    /// Separates one instance of the current group from the next.
    pub fn write_next(&mut self) -> Result<()> {
        self.run(|w| {
            w.sentinel(TAG_SEPARATOR)?;
            w.session.nav.next_instance();
            Ok(())
        })
    }

    pub fn write_uint(&mut self, tag: u8, value: u32) -> Result<()> {
        self.run(|w| w.write_value(tag, Value::Unsigned(value), Scalar::unsigned(value)))
    }

    pub fn write_int(&mut self, tag: u8, value: i32) -> Result<()> {
        self.run(|w| w.write_value(tag, Value::Signed(value), Scalar::signed(value)))
    }

    pub fn write_float(&mut self, tag: u8, value: f32) -> Result<()> {
        self.run(|w| w.write_value(tag, Value::Float(value), Scalar::Float(value)))
    }

    pub fn write_bool(&mut self, tag: u8, value: bool) -> Result<()> {
        self.run(|w| w.write_value(tag, Value::Bool(value), Scalar::Bool(value)))
    }

    pub fn write_array<T: Element>(&mut self, tag: u8, values: &[T]) -> Result<()> {
        self.run(|w| {
            w.session.nav.locate(tag, T::VR)?;
            if values.len() > usize::from(u16::MAX) {
                return Err(Error::ArrayTooLong {
                    tag,
                    len: values.len(),
                });
            }
            w.emit(tag, values)
        })
    }

    #[inline(always)]
    pub fn write_u8_array(&mut self, tag: u8, values: &[u8]) -> Result<()> {
        self.write_array(tag, values)
    }

    #[inline(always)]
    pub fn write_u16_array(&mut self, tag: u8, values: &[u16]) -> Result<()> {
        self.write_array(tag, values)
    }

    #[inline(always)]
    pub fn write_i32_array(&mut self, tag: u8, values: &[i32]) -> Result<()> {
        self.write_array(tag, values)
    }

    #[inline(always)]
    pub fn write_f32_array(&mut self, tag: u8, values: &[f32]) -> Result<()> {
        self.write_array(tag, values)
    }

    /// Writes `value` and its terminating NUL. A nonzero multiplicity limits
    /// that size.
    pub fn write_string(&mut self, tag: u8, value: &str) -> Result<()> {
        self.run(|w| {
            let id = w.session.nav.locate(tag, Vr::String)?;
            let size = value.len() + 1;

            let vm = w.session.nav.defs()[id].multiplicity();
            let limit = match vm {
                0 => usize::from(u16::MAX),
                vm => usize::from(u16::MAX).min(vm as usize),
            };
            if size > limit {
                return Err(Error::StringTooLong { tag, size, limit });
            }

            let mut bytes = Vec::with_capacity(size);
            bytes.extend_from_slice(value.as_bytes());
            bytes.push(0);
            w.emit(tag, &bytes[..])
        })
    }

    /// Writes a scalar unless it equals the declared default.
    fn write_value(&mut self, tag: u8, value: Value, scalar: Scalar) -> Result<()> {
        let id = self.session.nav.locate(tag, value.vr())?;
        if self.session.nav.defs()[id].default() == Some(value) {
            tracing::trace!(tag = format_args!("{:#04x}", tag), %value, "elided default");
            return Ok(());
        }
        self.emit(tag, &scalar)
    }

    fn emit<S: Serialize + ?Sized>(&mut self, tag: u8, item: &S) -> Result<()> {
        self.stream
            .write_u8(tag)
            .and_then(|_| item.write(&mut self.stream))
            .map_err(|e| Error::at(&mut self.stream, e))
    }

    fn sentinel(&mut self, tag: u8) -> Result<()> {
        self.stream
            .write_u8(tag)
            .map_err(|e| Error::at(&mut self.stream, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn writer(defs: &str) -> TagFileWriter<Cursor<Vec<u8>>> {
        TagFileWriter::new(Definitions::parse(defs).unwrap(), Cursor::new(Vec::new()))
    }

    fn bytes(w: TagFileWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        w.finish().unwrap().into_inner()
    }

    #[test]
    fn defaults_are_elided() {
        let mut w = writer("01 US 1 101\n02 SI 1 -3\n03 BO 1 false\n");
        w.write_uint(0x01, 101).unwrap();
        w.write_int(0x02, -3).unwrap();
        w.write_bool(0x03, true).unwrap();
        assert_eq!(bytes(w), vec![0x03, 11, 1]);
    }

    #[test]
    fn groups_are_framed() {
        let mut w = writer("01 GR 2\n  01 US 1\n  ff EN 0\n");
        w.write_enter(0x01, 2).unwrap();
        w.write_uint(0x01, 1).unwrap();
        w.write_next().unwrap();
        w.write_uint(0x01, 2).unwrap();
        w.write_leave(0x01).unwrap();
        assert!(!w.has_error());
        assert_eq!(
            bytes(w),
            vec![0x01, 10, 0, 2, 0x01, 0, 1, 0x00, 0x01, 0, 2, 0xff]
        );
    }

    #[test]
    fn string_respects_declared_maximum() {
        let mut w = writer("01 ST 4\n");
        assert!(matches!(
            w.write_string(0x01, "abcd"),
            Err(Error::StringTooLong {
                tag: 1,
                size: 5,
                limit: 4
            })
        ));

        let mut w = writer("01 ST 4\n");
        w.write_string(0x01, "abc").unwrap();
        assert_eq!(bytes(w), vec![0x01, 9, 0, 4, b'a', b'b', b'c', 0]);
    }

    #[test]
    fn array_too_long_is_rejected() {
        let mut w = writer("01 US 1\n");
        let values = vec![0u8; usize::from(u16::MAX) + 1];
        assert!(matches!(
            w.write_u8_array(0x01, &values),
            Err(Error::ArrayTooLong { tag: 1, .. })
        ));
    }
}
