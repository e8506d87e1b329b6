// Replacement semantics: re-ingesting a file
// with different entities removes all prior entities and their outgoing
// calls; the unique constraint on `calls` prevents duplicates when the
// same content is re-ingested.

use std::path::PathBuf;

use glyph_core::store::Store;
use glyph_core::types::{CallEdge, Entity, EntityKind, Linkage, Storage};

fn fn_entity(name: &str, gid: &str) -> Entity {
    Entity {
        kind: EntityKind::Fn,
        name: name.to_string(),
        start: 0,
        end: 10,
        storage: Storage::Extern,
        decl_sig: name.to_string(),
        eff_sig: "int ()".to_string(),
        gid: gid.to_string(),
        sig_id: "sig1".to_string(),
        linkage: Linkage::External,
    }
}

#[test]
fn reingest_with_different_entities_drops_prior_entities_and_calls() {
    let store = Store::in_memory().unwrap();
    let a = PathBuf::from("/tmp/s3-a.c");
    let b = PathBuf::from("/tmp/s3-b.c");

    let call = CallEdge {
        src_gid: "gid_f".into(),
        dst_gid: None,
        dst_name: Some("g".into()),
    };
    store
        .ingest_file(&a, &[fn_entity("f", "gid_f")], &[call], &[], None, true)
        .unwrap();
    store
        .ingest_file(&b, &[fn_entity("g", "gid_g")], &[], &[], None, true)
        .unwrap();

    assert!(store.get_entity("gid_f").unwrap().is_some());
    assert_eq!(store.callees("gid_f").unwrap().len(), 1);

    // Re-ingest a.c with a wholly different entity: gid_f must disappear,
    // and its outgoing call with it.
    store
        .ingest_file(&a, &[fn_entity("h", "gid_h")], &[], &[], None, true)
        .unwrap();

    assert!(store.get_entity("gid_f").unwrap().is_none());
    assert!(store.get_entity("gid_h").unwrap().is_some());
    assert_eq!(store.callees("gid_f").unwrap().len(), 0);
}

#[test]
fn reingest_identical_content_does_not_duplicate_calls() {
    let store = Store::in_memory().unwrap();
    let a = PathBuf::from("/tmp/s3-dup-a.c");
    let b = PathBuf::from("/tmp/s3-dup-b.c");

    let entities = vec![fn_entity("f", "gid_f")];
    let calls = vec![CallEdge {
        src_gid: "gid_f".into(),
        dst_gid: None,
        dst_name: Some("g".into()),
    }];

    store
        .ingest_file(&b, &[fn_entity("g", "gid_g")], &[], &[], None, true)
        .unwrap();
    store
        .ingest_file(&a, &entities, &calls, &[], None, true)
        .unwrap();
    assert_eq!(store.callees("gid_f").unwrap().len(), 1);

    // Re-ingesting the same file with the same entities and calls must
    // replace, not duplicate: the unique index on (src,dst,dst_name) holds
    // regardless, but replace-then-reinsert should land back at exactly one
    // edge.
    store
        .ingest_file(&a, &entities, &calls, &[], None, true)
        .unwrap();
    assert_eq!(store.callees("gid_f").unwrap().len(), 1);
}
