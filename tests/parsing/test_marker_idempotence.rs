// Marker idempotence: rewriting twice is a no-op the second
// time, and the markers survive a second parse without corrupting offsets.

use std::fs;

#[test]
fn rewriting_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("idempotent.c");
    fs::write(&path, "int f(void) { return 0; }\n").unwrap();

    let (unit, bytes) = glyph_parsers::index_file(&path, None, &[], 10, "|").unwrap();
    let (once, changed_once) = glyph_parsers::rewrite::rewrite(&bytes, &unit.entities);
    assert!(changed_once);
    assert!(once.windows(11).any(|w| w == b"/* GLYPH:S "));

    let (twice, changed_twice) = glyph_parsers::rewrite::rewrite(&once, &unit.entities);
    assert!(!changed_twice);
    assert_eq!(once, twice);
}

#[test]
fn rewritten_file_still_parses_and_reports_no_new_entities_from_markers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reparse.c");
    fs::write(&path, "int f(void) { return 0; }\nint g(void) { return f(); }\n").unwrap();

    let (unit, bytes) = glyph_parsers::index_file(&path, None, &[], 10, "|").unwrap();
    let (rewritten, _) = glyph_parsers::rewrite::rewrite(&bytes, &unit.entities);
    fs::write(&path, &rewritten).unwrap();

    let (reparsed, _) = glyph_parsers::index_file(&path, None, &[], 10, "|").unwrap();
    let names: Vec<&str> = reparsed.entities.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"f"));
    assert!(names.contains(&"g"));
    assert_eq!(reparsed.entities.len(), unit.entities.len());
}
