//! Repo-wide two-pass summary: a pure, read-only aggregation over freshly
//! parsed source, independent of any persisted store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glyph_parsers::walker::FileWalker;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EntitySummary {
    pub gid: String,
    pub kind: String,
    pub name: String,
    pub storage: String,
    pub decl_sig: String,
    pub eff_sig: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileSummary {
    pub path: String,
    pub args: Vec<String>,
    pub entities: Vec<EntitySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CallSummary {
    pub src_gid: String,
    pub src_name: String,
    pub dst_gid: Option<String>,
    pub dst_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RepoSummary {
    pub root: String,
    pub files: Vec<FileSummary>,
    pub calls: Vec<CallSummary>,
    pub totals: BTreeMap<String, usize>,
}

fn canon(root: &Path) -> PathBuf {
    std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}

/// Walks `root` for files matching `extensions`, ignoring any path
/// component in `ignore`, parses each twice as the original does — once
/// per pass, since the two passes need entity extraction to finish for
/// *every* file before call resolution can consult the global name table —
/// and resolves each call's `dst_name` against a first-definition-wins
/// `name -> gid` table built across the whole repo, not just the
/// declaring file.
pub fn summarize_repo(
    root: &Path,
    extensions: &[String],
    ignore: &[String],
    extra_args: &[String],
    id_length: usize,
    id_sep: &str,
) -> Result<RepoSummary> {
    let root = canon(root);
    let walker = FileWalker::new(&root, extensions, ignore);
    let paths = walker.walk();

    let mut files: Vec<FileSummary> = Vec::with_capacity(paths.len());
    let mut global_fn_name_to_gid: BTreeMap<String, String> = BTreeMap::new();

    for path in &paths {
        let (unit, _bytes) = glyph_parsers::index_file(path, None, extra_args, id_length, id_sep)?;
        let entities: Vec<EntitySummary> = unit
            .entities
            .iter()
            .map(|e| EntitySummary {
                gid: e.gid.clone(),
                kind: e.kind.as_str().to_string(),
                name: e.name.clone(),
                storage: e.storage.as_str().to_string(),
                decl_sig: e.decl_sig.clone(),
                eff_sig: e.eff_sig.clone(),
                start: e.start,
                end: e.end,
            })
            .collect();

        for e in &unit.entities {
            if matches!(e.kind, glyph_core::types::EntityKind::Fn | glyph_core::types::EntityKind::Prototype)
                && !e.name.is_empty()
            {
                global_fn_name_to_gid.entry(e.name.clone()).or_insert_with(|| e.gid.clone());
            }
        }

        files.push(FileSummary {
            path: path.to_string_lossy().into_owned(),
            args: extra_args.to_vec(),
            entities,
        });
    }

    let mut calls: Vec<CallSummary> = Vec::new();
    for (path, file) in paths.iter().zip(files.iter()) {
        let local_fn_name_to_gid: BTreeMap<&str, &str> = file
            .entities
            .iter()
            .filter(|e| e.kind == "fn")
            .map(|e| (e.name.as_str(), e.gid.as_str()))
            .collect();

        let (unit, _bytes) = glyph_parsers::index_file(path, None, extra_args, id_length, id_sep)?;
        for call in &unit.calls {
            let Some(src_name) = file
                .entities
                .iter()
                .find(|e| e.gid == call.src_gid)
                .map(|e| e.name.clone())
            else {
                continue;
            };
            let Some(&src_gid) = local_fn_name_to_gid.get(src_name.as_str()) else {
                continue;
            };
            let Some(dst_name) = call.dst_name.clone() else {
                continue;
            };
            let dst_gid = global_fn_name_to_gid.get(&dst_name).cloned();
            calls.push(CallSummary {
                src_gid: src_gid.to_string(),
                src_name,
                dst_gid,
                dst_name: Some(dst_name),
            });
        }
    }

    let mut totals: BTreeMap<String, usize> = BTreeMap::new();
    totals.insert("files".to_string(), files.len());
    totals.insert("entities".to_string(), files.iter().map(|f| f.entities.len()).sum());
    totals.insert("calls".to_string(), calls.len());
    totals.insert(
        "unresolved_calls".to_string(),
        calls.iter().filter(|c| c.dst_gid.is_none()).count(),
    );
    for kind in ["fn", "prototype", "typedef", "struct", "union", "enum", "macro"] {
        let count = files
            .iter()
            .flat_map(|f| f.entities.iter())
            .filter(|e| e.kind == kind)
            .count();
        totals.insert(format!("entities_{kind}"), count);
    }

    Ok(RepoSummary {
        root: root.to_string_lossy().into_owned(),
        files,
        calls,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn summarize_repo_resolves_calls_against_global_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("util.c"),
            "int sq(int n) { return n * n; }\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("main.c"),
            "int sq(int n);\nint f(int n) { return sq(n) + 1; }\n",
        )
        .unwrap();

        let summary = summarize_repo(
            dir.path(),
            &[".c".to_string()],
            &[],
            &[],
            10,
            "|",
        )
        .unwrap();

        assert_eq!(summary.totals["files"], 2);
        assert!(summary.totals["entities_fn"] >= 2);
        assert!(summary.calls.iter().any(|c| c.dst_name.as_deref() == Some("sq")));
    }
}
