use std::io::Cursor;

use tagfile_format::{
    Definitions, Error, Mode, OpenError, ParseError, Severity, TagFileReader, TagFileWriter, Vr,
};
use tempfile::TempDir;

type MemWriter = TagFileWriter<Cursor<Vec<u8>>>;
type MemReader = TagFileReader<Cursor<Vec<u8>>>;

const FLAT: &str = "01 US 1\n02 US 1\n03 SI 1\n04 ST 6\n";

const GROUPED: &str = "\
01 GR 3
  01 US 1
  ff EN 0
02 GR 1
  01 US 1
  ff EN 0
";

fn writer(text: &str) -> MemWriter {
    TagFileWriter::new(text.parse::<Definitions>().unwrap(), Cursor::new(Vec::new()))
}

fn reader(text: &str, bytes: Vec<u8>) -> MemReader {
    TagFileReader::new(text.parse::<Definitions>().unwrap(), Cursor::new(bytes))
}

#[test]
fn tags_must_increase_within_a_scope() {
    let mut w = writer(FLAT);
    w.write_uint(0x02, 1).unwrap();
    assert!(matches!(
        w.write_uint(0x01, 1),
        Err(Error::OutOfOrder { tag: 1, last: 2 })
    ));
    assert!(w.has_error());

    let report = w.last_report().unwrap();
    assert_eq!(report.severity(), Severity::Error);
    assert_eq!(report.mode(), Mode::Writing);
    assert!(report.message().contains("0x01"));

    // Sticky until cleared.
    assert!(matches!(w.write_int(0x03, 1), Err(Error::Poisoned)));
    w.clear_error();
    w.write_int(0x03, 1).unwrap();
    assert!(w.finish().is_ok());
}

#[test]
fn unknown_and_reserved_tags_are_rejected() {
    let mut w = writer(FLAT);
    assert!(matches!(
        w.write_uint(0x05, 1),
        Err(Error::UnknownTag { tag: 5 })
    ));

    let mut w = writer(FLAT);
    assert!(matches!(
        w.write_uint(0x00, 1),
        Err(Error::ReservedTag { tag: 0 })
    ));
}

#[test]
fn type_mismatch_is_an_error() {
    let mut w = writer(FLAT);
    assert!(matches!(
        w.write_int(0x01, -1),
        Err(Error::TypeMismatch {
            tag: 1,
            expected: Vr::Signed,
            declared: Vr::Unsigned
        })
    ));
}

#[test]
fn absent_tag_without_default_is_missing() {
    let mut r = reader(FLAT, vec![0x02, 0, 7]);
    assert!(matches!(
        r.read_uint(0x01),
        Err(Error::MissingTag { tag: 1 })
    ));
    assert!(r.has_error());
    assert!(r.close().is_err());
}

#[test]
fn string_limits_are_enforced() {
    let mut w = writer(FLAT);
    assert!(matches!(
        w.write_string(0x04, "toolong"),
        Err(Error::StringTooLong {
            tag: 4,
            size: 8,
            limit: 6
        })
    ));

    let mut w = writer(FLAT);
    w.write_string(0x04, "hello").unwrap();
    let bytes = w.finish().unwrap().into_inner();
    assert_eq!(bytes, b"\x04\x09\x00\x06hello\x00");

    let mut r = reader(FLAT, bytes.clone());
    assert!(matches!(
        r.read_string(0x04, 5),
        Err(Error::BufferTooSmall {
            tag: 4,
            size: 6,
            capacity: 5
        })
    ));

    let mut r = reader(FLAT, bytes);
    assert_eq!(r.read_string(0x04, 6).unwrap(), "hello");
}

#[test]
fn array_length_must_match() {
    let text = "01 US 3\n";
    let mut w = writer(text);
    w.write_u16_array(0x01, &[1, 2, 3]).unwrap();
    let bytes = w.finish().unwrap().into_inner();

    let mut r = reader(text, bytes.clone());
    let mut two = [0u16; 2];
    assert!(matches!(
        r.read_u16_array(0x01, &mut two),
        Err(Error::SizeMismatch {
            tag: 1,
            expected: 2,
            found: 3
        })
    ));

    let mut r = reader(text, bytes);
    assert_eq!(r.read_array_dup::<u16>(0x01).unwrap(), vec![1, 2, 3]);
}

#[test]
fn missing_separators_raise_a_count_warning() {
    let mut w = writer(GROUPED);
    w.write_enter(0x01, 3).unwrap();
    w.write_uint(0x01, 1).unwrap();
    w.write_next().unwrap();
    w.write_uint(0x01, 2).unwrap();
    w.write_leave(0x01).unwrap();
    assert_eq!(w.depth(), 0);

    let report = w.last_report().unwrap();
    assert_eq!(report.severity(), Severity::Warning);
    assert_eq!(report.message(), "Expected 3 items in group 0x01, found 1");
    assert!(w.has_error());
}

#[test]
fn omitted_final_separator_is_tolerated() {
    let mut w = writer(GROUPED);
    w.write_enter(0x01, 2).unwrap();
    w.write_uint(0x01, 1).unwrap();
    w.write_next().unwrap();
    w.write_uint(0x01, 2).unwrap();
    w.write_leave(0x01).unwrap();
    assert!(!w.has_error());

    let mut w = writer(GROUPED);
    w.write_enter(0x01, 2).unwrap();
    w.write_uint(0x01, 1).unwrap();
    w.write_leave(0x01).unwrap();
    assert!(matches!(
        w.last_report().map(|r| r.severity()),
        Some(Severity::Warning)
    ));
}

#[test]
fn count_warning_on_read() {
    // Declares three instances but holds one.
    let bytes = vec![0x01, 10, 0, 3, 0x01, 0, 5, 0xff];
    let mut r = reader(GROUPED, bytes);
    assert_eq!(r.read_enter(0x01).unwrap(), 3);
    assert_eq!(r.read_uint(0x01).unwrap(), 5);
    assert!(!r.read_next().unwrap());
    r.read_leave(0x01).unwrap();
    assert_eq!(
        r.last_report().unwrap().message(),
        "Expected 3 items in group 0x01, found 0"
    );
}

#[test]
fn leaving_requires_the_current_group() {
    let mut w = writer(GROUPED);
    assert!(matches!(
        w.write_leave(0x01),
        Err(Error::NotInGroup { tag: 1 })
    ));

    let mut w = writer(GROUPED);
    w.write_enter(0x01, 1).unwrap();
    assert!(matches!(
        w.write_leave(0x02),
        Err(Error::WrongGroup { tag: 2, current: 1 })
    ));

    let report = w.last_report().unwrap();
    let frames: Vec<_> = report.trace().iter().map(|f| (f.tag, f.vr)).collect();
    assert_eq!(frames, vec![(0x01, Vr::Unsigned), (0x01, Vr::Group)]);
}

#[test]
fn truncated_group_is_a_stream_error() {
    let mut r = reader(GROUPED, vec![0x01, 10, 0, 1, 0x01, 0, 5]);
    r.read_enter(0x01).unwrap();
    assert_eq!(r.read_uint(0x01).unwrap(), 5);
    assert!(matches!(
        r.read_leave(0x01),
        Err(Error::GroupEndNotFound { tag: 1 })
    ));
}

#[test]
fn truncated_items_are_not_read_as_defaults() {
    let text = "01 US 1\n03 US 1 9\n";
    // a u32 holding one byte, then a u16 array claiming 4 elements but holding 1
    for bytes in [vec![0x01, 2, 0x00], vec![0x01, 7, 0, 4, 0, 1]] {
        let mut r = reader(text, bytes);
        match r.read_uint(0x03) {
            Err(Error::Io { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::UnexpectedEof)
            }
            other => panic!("unexpected read result: {:?}", other),
        }
        assert!(r.has_error());
        assert_eq!(r.last_report().unwrap().severity(), Severity::Error);
    }

    // Ending on an item boundary still means absent.
    let mut r = reader(text, vec![0x01, 2, 0, 1, 0, 0]);
    assert_eq!(r.read_uint(0x03).unwrap(), 9);
    assert!(!r.has_error());
}

#[test]
fn reports_name_the_files_involved() {
    let dir = TempDir::new().unwrap();
    let definition = dir.path().join("flat.def");
    let data = dir.path().join("flat.tag");
    std::fs::write(&definition, FLAT).unwrap();

    let mut w = TagFileWriter::create(&definition, &data).unwrap();
    w.write_uint(0x02, 1).unwrap();
    assert!(w.write_uint(0x02, 2).is_err());

    let report = w.last_report().unwrap();
    assert_eq!(report.definition_path(), Some(definition.as_path()));
    assert!(report.to_string().ends_with(&format!(
        "While writing '{}' using definition file '{}'",
        data.display(),
        definition.display()
    )));
}

#[test]
fn open_errors_carry_paths() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.def");
    let data = dir.path().join("data.tag");

    match TagFileReader::open(&missing, &data) {
        Err(OpenError::ReadDefinition(_, path)) => assert_eq!(path, missing),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }

    let broken = dir.path().join("broken.def");
    std::fs::write(&broken, "01 US 1\n01 SI 1\n").unwrap();
    match TagFileWriter::create(&broken, &data) {
        Err(OpenError::InvalidDefinition(e, _)) => {
            assert_eq!(
                e,
                ParseError::NotAscending {
                    line: 2,
                    tag: 1,
                    previous: 1
                }
            );
            assert_eq!(e.line(), 2);
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }

    let valid = dir.path().join("valid.def");
    std::fs::write(&valid, FLAT).unwrap();
    assert!(matches!(
        TagFileReader::open(&valid, &data),
        Err(OpenError::OpenData(_, _))
    ));
}
