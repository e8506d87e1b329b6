// FTS recall: every entity with a name
// containing an identifier token of length >= 4 or an underscore is
// retrievable via `fts_search` on that token, and never retrievable via a
// banned connective word alone.

use std::path::PathBuf;

use glyph_core::store::Store;
use glyph_core::types::{Entity, EntityKind, Linkage, Storage};

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

#[test]
fn compute_hash_is_findable_by_either_half_of_its_name() {
    let store = Store::in_memory().unwrap();
    store
        .ingest_file(
            &PathBuf::from("/tmp/s6.c"),
            &[fn_entity("compute_hash", "gid_ch")],
            &[],
            &[],
            None,
            true,
        )
        .unwrap();

    let by_compute = store.fts_search("compute", 50, 6).unwrap();
    assert!(by_compute.iter().any(|(gid, ..)| gid == "gid_ch"));

    let by_hash = store.fts_search("hash", 50, 6).unwrap();
    assert!(by_hash.iter().any(|(gid, ..)| gid == "gid_ch"));

    let by_and = store.fts_search("and", 50, 6).unwrap();
    assert!(by_and.is_empty());
}

#[test]
fn short_query_token_without_underscore_yields_no_terms() {
    // "sq" is below the length-4 floor and has no underscore, so the query
    // rewriter (glyph_core::store::query::fts_expr_from_text) drops it
    // entirely and `fts_search` short-circuits to an empty result rather
    // than ever issuing a MATCH with no terms.
    let store = Store::in_memory().unwrap();
    store
        .ingest_file(
            &PathBuf::from("/tmp/s6-short.c"),
            &[fn_entity("sq", "gid_sq")],
            &[],
            &[],
            None,
            true,
        )
        .unwrap();

    let hits = store.fts_search("sq", 50, 6).unwrap();
    assert!(hits.is_empty());
}
