use super::*;

#[test]
fn single_document_yields_single_fragment() {
    let input = br#"{"cmd":"DANMU_MSG","info":["hi"]}"#;
    assert_eq!(split_bodies(input), vec![input.as_slice()]);
}

#[test]
fn separator_runs_split_documents_in_order() {
    let input = b"{\"a\":1}\x00\x00\x00\x1b\x00\x10{\"b\":2}";
    assert_eq!(split_bodies(input), vec![b"{\"a\":1}".as_slice(), b"{\"b\":2}".as_slice()]);
}

#[test]
fn single_separator_byte_splits_documents() {
    let input = b"[1,2]\n\"x\"";
    assert_eq!(split_bodies(input), vec![b"[1,2]".as_slice(), b"\"x\"".as_slice()]);
}

#[test]
fn non_json_fragment_is_dropped() {
    let input = b"{\"a\":1}\x05garbage{";
    assert_eq!(split_bodies(input), vec![b"{\"a\":1}".as_slice()]);
}

#[test]
fn header_residue_between_documents_is_dropped() {
    // Length byte 0x2a ('*') survives splitting but is not JSON.
    let input = b"{\"a\":1}\x00\x00\x01*\x00\x10\x00\x00\x00\x00\x00\x05\x00\x00\x00\x00{\"b\":2}";
    assert_eq!(split_bodies(input), vec![b"{\"a\":1}".as_slice(), b"{\"b\":2}".as_slice()]);
}

#[test]
fn leading_and_trailing_separators_are_ignored() {
    let input = b"\x00\x01{}\x1f";
    assert_eq!(split_bodies(input), vec![b"{}".as_slice()]);
}

#[test]
fn empty_and_separator_only_inputs_yield_nothing() {
    assert!(split_bodies(b"").is_empty());
    assert!(split_bodies(b"\x00\x00\x1f").is_empty());
}

#[test]
fn multibyte_utf8_is_not_split() {
    let input = "{\"msg\":\"弹幕\"}".as_bytes();
    assert_eq!(split_bodies(input), vec![input]);
}
