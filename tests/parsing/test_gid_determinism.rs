// GID determinism: extracting the same bytes under the same filename
// yields the same GID set and values across repeated runs.

use std::fs;

fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn extracting_the_same_file_twice_yields_identical_gids() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "determinism.c",
        "int add(int a, int b) { return a + b; }\n\nstruct point { int x; int y; };\n",
    );

    let (first, _) = glyph_parsers::index_file(&path, None, &[], 10, "|").unwrap();
    let (second, _) = glyph_parsers::index_file(&path, None, &[], 10, "|").unwrap();

    let first_gids: Vec<&str> = first.entities.iter().map(|e| e.gid.as_str()).collect();
    let second_gids: Vec<&str> = second.entities.iter().map(|e| e.gid.as_str()).collect();
    assert_eq!(first_gids, second_gids);
    assert!(!first_gids.is_empty());
}

#[test]
fn gid_is_independent_of_entity_byte_offset_within_the_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shift.c");

    fs::write(&path, "int sq(int n) { return n * n; }\n").unwrap();
    let (before, _) = glyph_parsers::index_file(&path, None, &[], 10, "|").unwrap();

    fs::write(&path, "\n\n\nint sq(int n) { return n * n; }\n").unwrap();
    let (after, _) = glyph_parsers::index_file(&path, None, &[], 10, "|").unwrap();

    // GIDs are minted from signature/storage/filename, not byte offset, so
    // leading blank lines must not change the minted id.
    let ga = before.entities.iter().find(|e| e.name == "sq").unwrap();
    let gb = after.entities.iter().find(|e| e.name == "sq").unwrap();
    assert_ne!(ga.start, gb.start);
    assert_eq!(ga.gid, gb.gid);
}
