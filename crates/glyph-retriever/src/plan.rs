//! Pure read-only repo health queries: explain a span, snapshot overall
//! status, and trace the blast radius of a symbol change. Plan-proposal
//! orchestration that talks to an LLM endpoint to rate or refine a change
//! plan is an out-of-scope external collaborator and lives elsewhere.

use std::collections::BTreeMap;

use glyph_core::store::Store;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Explain {
    pub files: i64,
    pub entities_by_kind: BTreeMap<String, i64>,
    pub unresolved_calls: i64,
}

/// High-level repo stats: file count, entity count per kind, unresolved
/// call count.
pub fn explain(store: &Store) -> Result<Explain> {
    let files = store.count_files()?;
    let unresolved_calls = store.count_unresolved_calls()?;
    let entities_by_kind = store.entity_counts_by_kind()?;
    Ok(Explain { files, entities_by_kind, unresolved_calls })
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Snapshot {
    pub files: i64,
    pub entities: i64,
    pub calls: i64,
    pub unresolved: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Status {
    pub plan_goals: Vec<String>,
    pub snapshot: Snapshot,
    pub unresolved_ok: bool,
    pub missing_symbols: BTreeMap<String, i64>,
}

/// Reads the plan's `goals` array (an empty list if the plan is missing or
/// unparseable, matching `_load_plan`'s skeleton fallback) and computes
/// current health against it.
pub fn status(store: &Store, plan_goals: Vec<String>) -> Result<Status> {
    let files = store.count_files()?;
    let entities = store.count_entities()?;
    let calls = store.count_calls()?;
    let unresolved = store.count_unresolved_calls()?;
    let missing_symbols = store.unresolved_call_names()?;

    Ok(Status {
        plan_goals,
        snapshot: Snapshot { files, entities, calls, unresolved },
        unresolved_ok: unresolved == 0,
        missing_symbols,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Impact {
    pub target: String,
    pub entities: Vec<String>,
    pub callers: BTreeMap<String, Vec<String>>,
    pub by_name: BTreeMap<String, Vec<String>>,
}

/// Returns every entity named `symbol`, its direct callers, and the union
/// of those callers keyed back under `symbol` (`by_name`).
pub fn impact(store: &Store, symbol: &str) -> Result<Impact> {
    let entities = store.lookup_by_name(symbol)?;
    let mut callers_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut all_callers: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();

    for e in &entities {
        let mut callers = store.callers(&e.gid)?;
        callers.sort();
        all_callers.extend(callers.iter().cloned());
        callers_map.insert(e.gid.clone(), callers);
    }

    let mut by_name = BTreeMap::new();
    by_name.insert(symbol.to_string(), all_callers.into_iter().collect());

    Ok(Impact {
        target: symbol.to_string(),
        entities: entities.iter().map(|e| e.gid.clone()).collect(),
        callers: callers_map,
        by_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::types::{CallEdge, Entity, EntityKind, Linkage, Storage};
    use std::path::PathBuf;

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
    fn impact_collects_callers_by_gid_and_by_name() {
        let store = Store::in_memory().unwrap();
        store
            .ingest_file(
                &PathBuf::from("/tmp/a.c"),
                &[fn_entity("sq", "gid_sq"), fn_entity("f", "gid_f")],
                &[CallEdge {
                    src_gid: "gid_f".into(),
                    dst_gid: Some("gid_sq".into()),
                    dst_name: Some("sq".into()),
                }],
                &[],
                None,
                true,
            )
            .unwrap();

        let result = impact(&store, "sq").unwrap();
        assert_eq!(result.entities, vec!["gid_sq".to_string()]);
        assert_eq!(result.callers["gid_sq"], vec!["gid_f".to_string()]);
        assert_eq!(result.by_name["sq"], vec!["gid_f".to_string()]);
    }

    #[test]
    fn status_reports_unresolved_ok_false_with_missing_symbols() {
        let store = Store::in_memory().unwrap();
        store
            .ingest_file(
                &PathBuf::from("/tmp/a.c"),
                &[fn_entity("f", "gid_f")],
                &[CallEdge {
                    src_gid: "gid_f".into(),
                    dst_gid: None,
                    dst_name: Some("missing".into()),
                }],
                &[],
                None,
                true,
            )
            .unwrap();

        let st = status(&store, vec!["ship it".to_string()]).unwrap();
        assert!(!st.unresolved_ok);
        assert_eq!(st.missing_symbols["missing"], 1);
        assert_eq!(st.plan_goals, vec!["ship it".to_string()]);
    }
}
