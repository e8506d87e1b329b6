// Entity classification and extent correctness.

use std::fs;

fn parse(dir: &tempfile::TempDir, name: &str, contents: &str) -> (glyph_parsers::IndexedUnit, Vec<u8>) {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    glyph_parsers::index_file(&path, None, &[], 10, "|").unwrap()
}

#[test]
fn classifies_definitions_prototypes_records_typedefs_and_macros() {
    let dir = tempfile::tempdir().unwrap();
    let source = r#"
typedef struct point {
    int x;
    int y;
} point_t;

enum color { RED, GREEN, BLUE };

int add(int a, int b);

int add(int a, int b) {
    return a + b;
}

#define SQUARE(x) ((x) * (x))
#define PI 3
"#;
    let (unit, _bytes) = parse(&dir, "entities.c", source);

    let kinds: Vec<&str> = unit.entities.iter().map(|e| e.kind.as_str()).collect();
    assert!(kinds.contains(&"struct"));
    assert!(kinds.contains(&"enum"));
    assert!(kinds.contains(&"typedef"));
    assert!(kinds.contains(&"prototype"));
    assert!(kinds.contains(&"fn"));
    assert!(kinds.contains(&"macro"));

    // PI is object-like and must not be extracted as a macro entity.
    assert!(!unit.entities.iter().any(|e| e.name == "PI"));
    assert!(unit.entities.iter().any(|e| e.name == "SQUARE"));
}

#[test]
fn extent_bytes_contain_the_entity_name() {
    let dir = tempfile::tempdir().unwrap();
    let (unit, bytes) = parse(&dir, "extent.c", "static int helper(void) { return 1; }\n");

    let helper = unit.entities.iter().find(|e| e.name == "helper").unwrap();
    let slice = String::from_utf8_lossy(&bytes[helper.start..helper.end]);
    assert!(slice.contains("helper"));
    assert_eq!(helper.storage.as_str(), "static");
}

#[test]
fn static_inline_function_gets_combined_storage() {
    let dir = tempfile::tempdir().unwrap();
    let (unit, _bytes) = parse(
        &dir,
        "inline.c",
        "static inline int sq(int n) { return n * n; }\n",
    );
    let sq = unit.entities.iter().find(|e| e.name == "sq").unwrap();
    assert_eq!(sq.storage.as_str(), "static_inline");
}
