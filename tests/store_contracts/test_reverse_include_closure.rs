// Reverse-include closure: for
// `a.c includes util.h includes cfg.h`, `affected_files(["cfg.h"])` returns
// `{a.c, cfg.h, util.h}` when transitive and include_self are both set,
// `{a.c, util.h}` when include_self is false, and only the direct includer
// when transitive is false.

use std::path::PathBuf;

use glyph_core::store::Store;
use glyph_core::types::{Entity, EntityKind, IncludeEdge, IncludeKind, Linkage, Storage};

fn fn_entity(name: &str, gid: &str) -> Entity {
    Entity {
        kind: EntityKind::Fn,
        name: name.to_string(),
        start: 0,
        end: 5,
        storage: Storage::Extern,
        decl_sig: name.to_string(),
        eff_sig: "int ()".to_string(),
        gid: gid.to_string(),
        sig_id: "sig1".to_string(),
        linkage: Linkage::External,
    }
}

fn seed(store: &Store) -> (PathBuf, PathBuf, PathBuf) {
    let a = PathBuf::from("/tmp/s5-a.c");
    let util = PathBuf::from("/tmp/s5-util.h");
    let cfg = PathBuf::from("/tmp/s5-cfg.h");

    // a.c -> util.h
    store
        .ingest_file(
            &a,
            &[fn_entity("main", "gid_main")],
            &[],
            &[IncludeEdge {
                dst_path: util.to_string_lossy().into_owned(),
                kind: IncludeKind::Quote,
            }],
            None,
            true,
        )
        .unwrap();

    // util.h -> cfg.h
    store
        .ingest_file(
            &util,
            &[fn_entity("helper", "gid_helper")],
            &[],
            &[IncludeEdge {
                dst_path: cfg.to_string_lossy().into_owned(),
                kind: IncludeKind::Quote,
            }],
            None,
            true,
        )
        .unwrap();

    // cfg.h includes nothing.
    store.ingest_file(&cfg, &[], &[], &[], None, true).unwrap();

    (a, util, cfg)
}

#[test]
fn transitive_with_self_returns_whole_chain_sorted() {
    let store = Store::in_memory().unwrap();
    let (a, util, cfg) = seed(&store);

    let result = store.affected_files(&[cfg.clone()], true, true).unwrap();
    let mut expected: Vec<String> = vec![
        canon(&a),
        canon(&util),
        canon(&cfg),
    ];
    expected.sort();
    assert_eq!(result, expected);
}

#[test]
fn transitive_without_self_excludes_the_seed() {
    let store = Store::in_memory().unwrap();
    let (a, util, cfg) = seed(&store);

    let result = store.affected_files(&[cfg.clone()], true, false).unwrap();
    let mut expected: Vec<String> = vec![canon(&a), canon(&util)];
    expected.sort();
    assert_eq!(result, expected);
}

#[test]
fn non_transitive_returns_only_direct_includers() {
    let store = Store::in_memory().unwrap();
    let (_a, util, cfg) = seed(&store);

    let result = store.affected_files(&[cfg.clone()], false, false).unwrap();
    assert_eq!(result, vec![canon(&util)]);
}

fn canon(p: &std::path::Path) -> String {
    std::fs::canonicalize(p)
        .unwrap_or_else(|_| p.to_path_buf())
        .to_string_lossy()
        .into_owned()
}
