//! Positions the schema cursor and, when reading, the stream.
//!
//! Within one scope tags must be visited in strictly increasing order. That
//! lets both cursors move forward only: the schema cursor walks the sibling
//! list, and the stream scan can tell a tag is absent as soon as it sees a
//! larger one.

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::ReadBytesExt;

use crate::constants::{TAG_GROUP_END, TAG_SEPARATOR};
use crate::de::read_count;
use crate::definition::{Definitions, NodeId, Vr};
use crate::error::{Error, Result};
use crate::wire::WireType;

/// An entered group.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub(crate) group: NodeId,
    /// Instance count declared when the group was entered.
    pub(crate) expected: u16,
    /// Separators passed so far.
    pub(crate) count: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Scan {
    /// The stream is positioned right after the tag byte.
    Found,
    /// The tag is not in the current instance; the stream is positioned
    /// where it was found missing.
    Absent,
}

#[derive(Debug)]
pub(crate) struct Navigator {
    defs: Definitions,
    cursor: Option<NodeId>,
    frames: Vec<Frame>,
    /// Last tag accessed in the current scope.
    last_access: Option<u8>,
    /// Nested groups still to be stepped over by the running stream scan.
    groups_to_skip: u32,
    /// Length of the stream being read, taken on the first skip.
    stream_len: Option<u64>,
}

impl Navigator {
    pub(crate) fn new(defs: Definitions) -> Navigator {
        let cursor = defs.root();
        Navigator {
            defs,
            cursor,
            frames: Vec::new(),
            last_access: None,
            groups_to_skip: 0,
            stream_len: None,
        }
    }

    #[inline(always)]
    pub(crate) fn defs(&self) -> &Definitions {
        &self.defs
    }

    #[inline(always)]
    pub(crate) fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    #[inline(always)]
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    fn scope_start(&self) -> Option<NodeId> {
        match self.frames.last() {
            Some(frame) => self.defs[frame.group].first_child(),
            None => self.defs.root(),
        }
    }

    /// Moves the schema cursor forward to the definition of `tag`.
    pub(crate) fn scan_to(&mut self, tag: u8) -> Result<NodeId> {
        if let Some(last) = self.last_access {
            if last >= tag {
                return Err(Error::OutOfOrder { tag, last });
            }
        }
        self.last_access = Some(tag);

        let mut id = self.cursor.ok_or(Error::UnknownTag { tag })?;
        while self.defs[id].tag() < tag {
            match self.defs[id].next_sibling() {
                Some(next) => id = next,
                None => break,
            }
        }
        self.cursor = Some(id);

        if self.defs[id].tag() != tag {
            return Err(Error::UnknownTag { tag });
        }
        Ok(id)
    }

    /// [scan_to](Self::scan_to) for a caller-supplied tag that must be
    /// declared as `vr`.
    pub(crate) fn locate(&mut self, tag: u8, vr: Vr) -> Result<NodeId> {
        if tag == TAG_SEPARATOR || tag == TAG_GROUP_END {
            return Err(Error::ReservedTag { tag });
        }

        let id = self.scan_to(tag)?;
        let declared = self.defs[id].vr();
        if declared != vr {
            return Err(Error::TypeMismatch {
                tag,
                expected: vr,
                declared,
            });
        }
        Ok(id)
    }

    pub(crate) fn enter(&mut self, group: NodeId, expected: u16) {
        self.frames.push(Frame {
            group,
            expected,
            count: 0,
        });
        self.cursor = self.defs[group].first_child();
        self.last_access = None;
    }

    /// Rewinds the schema cursor for the next instance of the current group.
    pub(crate) fn next_instance(&mut self) {
        self.cursor = self.scope_start();
        self.last_access = None;
        if let Some(frame) = self.frames.last_mut() {
            frame.count += 1;
        }
    }

    pub(crate) fn check_leave(&self, tag: u8) -> Result<()> {
        let frame = self.frames.last().ok_or(Error::NotInGroup { tag })?;
        let current = self.defs[frame.group].tag();
        if current != tag {
            return Err(Error::WrongGroup { tag, current });
        }
        Ok(())
    }

    /// The last separator of a group may be omitted, so one instance more
    /// than the separators seen is still consistent.
    pub(crate) fn instance_mismatch(&self) -> Option<Error> {
        let frame = self.frames.last()?;
        if u32::from(frame.expected) > frame.count + 1 {
            return Some(Error::CountMismatch {
                tag: self.defs[frame.group].tag(),
                expected: frame.expected,
                found: frame.count,
            });
        }
        None
    }

    /// Resumes the enclosing scope right after the group being left.
    pub(crate) fn leave(&mut self, tag: u8) -> Result<()> {
        self.check_leave(tag)?;
        if let Some(frame) = self.frames.pop() {
            self.cursor = Some(frame.group);
        }
        self.last_access = Some(tag);
        Ok(())
    }

    /// Scans the stream forward to `tag` in the current instance, stepping
    /// over anything before it, including whole nested groups.
    ///
    /// The schema cursor must already be on `tag` (see [scan_to](Self::scan_to)),
    /// except for the separator which has no definition.
    pub(crate) fn scan_stream<R: Read + Seek>(&mut self, stream: &mut R, tag: u8) -> Result<Scan> {
        self.groups_to_skip = 0;

        loop {
            let read_tag = match stream.read_u8() {
                Ok(read_tag) => read_tag,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof && self.groups_to_skip == 0 => {
                    return Ok(Scan::Absent);
                }
                Err(e) => return Err(Error::at(stream, e)),
            };

            if read_tag == tag && self.groups_to_skip == 0 {
                return Ok(Scan::Found);
            }

            if read_tag == TAG_GROUP_END || (read_tag == TAG_SEPARATOR && self.groups_to_skip > 0) {
                if read_tag == TAG_GROUP_END {
                    if self.groups_to_skip == 0 {
                        return rewind(stream);
                    }
                    self.groups_to_skip -= 1;
                }
                continue;
            }

            if read_tag == TAG_SEPARATOR
                || (read_tag > tag && self.groups_to_skip == 0 && tag != TAG_SEPARATOR)
            {
                return rewind(stream);
            }

            self.skip_item(stream, read_tag)?;
        }
    }

    fn skip_item<R: Read + Seek>(&mut self, stream: &mut R, tag: u8) -> Result<()> {
        let id = stream.read_u8().map_err(|e| Error::at(stream, e))?;
        let wire = WireType::from_id(id).ok_or(Error::InvalidWireType { tag, wire: id })?;

        let count = if wire.is_array() {
            u64::from(read_count(stream).map_err(|e| Error::at(stream, e))?)
        } else {
            1
        };
        let bytes = count * wire.width();

        if wire == WireType::Group {
            self.groups_to_skip += 1;
        }

        // Seeking past the end succeeds, so a truncated payload has to be
        // caught here rather than by the next tag read.
        let start = stream.stream_position().map_err(|e| Error::at(stream, e))?;
        let end = start + bytes;
        if end > self.stream_len(stream)? {
            return Err(Error::Io {
                position: Some(start),
                source: io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("payload of tag {:#04x} runs past the end of the stream", tag),
                ),
            });
        }
        stream
            .seek(SeekFrom::Start(end))
            .map_err(|e| Error::at(stream, e))?;

        tracing::debug!(
            tag = format_args!("{:#04x}", tag),
            %wire,
            bytes,
            end = format_args!("{:#x}", end),
            groups_to_skip = self.groups_to_skip,
            "skipped item"
        );
        Ok(())
    }

    fn stream_len<R: Seek>(&mut self, stream: &mut R) -> Result<u64> {
        if let Some(len) = self.stream_len {
            return Ok(len);
        }

        let len = measure(stream).map_err(|e| Error::at(stream, e))?;
        self.stream_len = Some(len);
        Ok(len)
    }
}

fn measure<R: Seek>(stream: &mut R) -> io::Result<u64> {
    let position = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(position))?;
    Ok(len)
}

/// Puts the tag byte that ended a scan back.
fn rewind<R: Seek>(stream: &mut R) -> Result<Scan> {
    stream
        .seek(SeekFrom::Current(-1))
        .map_err(|e| Error::at(stream, e))?;
    Ok(Scan::Absent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DEFS: &str = "\
01 US 1
02 GR 1
  01 US 1
  02 GR 1
    01 US 1
    ff EN 0
  ff EN 0
03 US 1
05 US 1 7
";

    fn navigator() -> Navigator {
        Navigator::new(Definitions::parse(DEFS).unwrap())
    }

    /// Tag 1, group 2 holding a value, a nested group with two instances and
    /// an array, then tag 3.
    fn nested_stream() -> Vec<u8> {
        vec![
            0x01, 0, 9, // tag 1: u8 9
            0x02, 10, 0, 1, // tag 2: group, 1 instance
            0x01, 1, 0x01, 0x00, // tag 1: u16 256
            0x02, 10, 0, 2, // tag 2: nested group, 2 instances
            0x01, 0, 1, // tag 1: u8 1
            0x00, // separator
            0x01, 9, 0, 2, 0xaa, 0xbb, // tag 1: u8 array
            0xff, // end of nested group
            0xff, // end of group 2
            0x03, 2, 0, 1, 0, 0, // tag 3: u32 65536
        ]
    }

    #[test]
    fn scan_to_enforces_order() {
        let mut nav = navigator();
        assert!(nav.scan_to(0x03).is_ok());
        assert!(matches!(
            nav.scan_to(0x01),
            Err(Error::OutOfOrder { tag: 1, last: 3 })
        ));
        assert!(matches!(
            nav.scan_to(0x04),
            Err(Error::UnknownTag { tag: 4 })
        ));
        assert!(nav.scan_to(0x05).is_ok());
    }

    #[test]
    fn locate_checks_representation() {
        let mut nav = navigator();
        assert!(matches!(
            nav.locate(0x02, Vr::Unsigned),
            Err(Error::TypeMismatch {
                tag: 2,
                expected: Vr::Unsigned,
                declared: Vr::Group
            })
        ));
        assert!(matches!(
            nav.locate(TAG_GROUP_END, Vr::End),
            Err(Error::ReservedTag { tag: 0xff })
        ));
    }

    #[test]
    fn skips_nested_groups_without_decoding() {
        let mut nav = navigator();
        let mut stream = Cursor::new(nested_stream());

        nav.scan_to(0x03).unwrap();
        assert_eq!(nav.scan_stream(&mut stream, 0x03).unwrap(), Scan::Found);
        assert_eq!(stream.position(), 28);
        assert_eq!(nav.groups_to_skip, 0);
    }

    #[test]
    fn larger_tag_means_absent() {
        let mut nav = navigator();
        let mut stream = Cursor::new(vec![0x03, 0, 1]);

        nav.scan_to(0x01).unwrap();
        assert_eq!(nav.scan_stream(&mut stream, 0x01).unwrap(), Scan::Absent);
        assert_eq!(stream.position(), 0);

        nav.scan_to(0x03).unwrap();
        assert_eq!(nav.scan_stream(&mut stream, 0x03).unwrap(), Scan::Found);
    }

    #[test]
    fn end_of_stream_means_absent() {
        let mut nav = navigator();
        let mut stream = Cursor::new(vec![0x01, 0, 1]);

        nav.scan_to(0x05).unwrap();
        assert_eq!(nav.scan_stream(&mut stream, 0x05).unwrap(), Scan::Absent);
    }

    #[test]
    fn truncated_group_is_a_stream_error() {
        let mut nav = navigator();
        let mut stream = Cursor::new(vec![0x02, 10, 0, 1, 0x01, 0, 1]);

        nav.scan_to(0x03).unwrap();
        assert!(matches!(
            nav.scan_stream(&mut stream, 0x03),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn truncated_payload_is_a_stream_error() {
        // u32 with one payload byte, then a u16 array claiming 4 elements
        for bytes in [vec![0x01, 2, 0x00], vec![0x01, 7, 0, 4, 0, 1]] {
            let mut nav = navigator();
            let mut stream = Cursor::new(bytes);

            nav.scan_to(0x03).unwrap();
            match nav.scan_stream(&mut stream, 0x03) {
                Err(Error::Io { source, .. }) => {
                    assert_eq!(source.kind(), std::io::ErrorKind::UnexpectedEof)
                }
                other => panic!("unexpected scan result: {:?}", other),
            }
        }
    }

    #[test]
    fn end_of_stream_after_whole_item_means_absent() {
        let mut nav = navigator();
        let mut stream = Cursor::new(vec![0x01, 7, 0, 2, 0, 1, 0, 2]);

        nav.scan_to(0x03).unwrap();
        assert_eq!(nav.scan_stream(&mut stream, 0x03).unwrap(), Scan::Absent);
        assert_eq!(stream.position(), 8);
    }

    #[test]
    fn invalid_wire_type_is_rejected() {
        let mut nav = navigator();
        let mut stream = Cursor::new(vec![0x01, 0x42, 0]);

        nav.scan_to(0x03).unwrap();
        assert!(matches!(
            nav.scan_stream(&mut stream, 0x03),
            Err(Error::InvalidWireType { tag: 1, wire: 0x42 })
        ));
    }

    #[test]
    fn instance_counting_allows_missing_last_separator() {
        let mut nav = navigator();
        let group = nav.scan_to(0x02).unwrap();

        nav.enter(group, 2);
        assert!(matches!(
            nav.instance_mismatch(),
            Some(Error::CountMismatch {
                tag: 2,
                expected: 2,
                found: 0
            })
        ));
        nav.next_instance();
        assert!(nav.instance_mismatch().is_none());

        nav.enter(group, 3);
        nav.next_instance();
        assert!(matches!(
            nav.instance_mismatch(),
            Some(Error::CountMismatch {
                expected: 3,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn leave_resumes_after_group() {
        let mut nav = navigator();
        let group = nav.scan_to(0x02).unwrap();
        nav.enter(group, 1);
        assert_eq!(nav.depth(), 1);
        nav.scan_to(0x01).unwrap();

        assert!(matches!(
            nav.check_leave(0x03),
            Err(Error::WrongGroup { tag: 3, current: 2 })
        ));
        nav.leave(0x02).unwrap();
        assert_eq!(nav.depth(), 0);
        assert_eq!(nav.cursor(), Some(group));
        assert!(matches!(
            nav.scan_to(0x02),
            Err(Error::OutOfOrder { .. })
        ));
        assert!(nav.scan_to(0x03).is_ok());
        assert!(matches!(nav.leave(0x03), Err(Error::NotInGroup { tag: 3 })));
    }
}
