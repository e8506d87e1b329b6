//! Walks the top-level cursors of a parsed translation unit and classifies
//! them into the entity kinds the indexer tracks.

use std::path::Path;

use clang::{Entity as Cursor, EntityKind as CursorKind, StorageClass, TranslationUnit};

use glyph_core::hash::short_id_with;
use glyph_core::types::{Entity, EntityKind, Linkage, Storage};

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cursor_file_path(cur: &Cursor) -> Option<std::path::PathBuf> {
    cur.get_location()
        .and_then(|loc| loc.get_file_location().file)
        .map(|f| f.get_path())
}

fn extent_offsets(cur: &Cursor) -> Option<(usize, usize)> {
    let range = cur.get_range()?;
    let start = range.get_start().get_file_location().offset as usize;
    let end = range.get_end().get_file_location().offset as usize;
    Some((start, end))
}

/// Scans the bytes up to the first `{` or `(` for the literal keyword
/// `inline`, used as a fallback when the parser's inlined-function
/// predicate is unavailable for this cursor kind.
fn has_inline_token(decl_text: &str) -> bool {
    let head = decl_text
        .find(['{', '('])
        .map(|i| &decl_text[..i])
        .unwrap_or(decl_text);
    head.split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|word| word == "inline")
}

fn storage_of(cur: &Cursor, decl_text: &str) -> Storage {
    let is_static = matches!(cur.get_storage_class(), Some(StorageClass::Static));
    let is_inline = cur.is_inline_function() || has_inline_token(decl_text);
    match (is_static, is_inline) {
        (true, true) => Storage::StaticInline,
        (true, false) => Storage::Static,
        (false, true) => Storage::Inline,
        (false, false) => Storage::Extern,
    }
}

fn eff_sig_of(cur: &Cursor) -> String {
    let spelling = cur
        .get_type()
        .map(|t| t.get_display_name())
        .or_else(|| cur.get_display_name())
        .or_else(|| cur.get_name())
        .unwrap_or_default();
    collapse_whitespace(&spelling)
}

fn fn_signature(cur: &Cursor) -> String {
    let name = cur
        .get_display_name()
        .or_else(|| cur.get_name())
        .unwrap_or_default();
    collapse_whitespace(&name)
}

fn typedef_sig(cur: &Cursor) -> String {
    match cur.get_display_name() {
        Some(d) => collapse_whitespace(&d),
        None => format!("typedef {}", cur.get_name().unwrap_or_default()),
    }
}

fn record_sig(kind: EntityKind, name: &Option<String>) -> String {
    let n = name.as_deref().unwrap_or("<anonymous>").trim();
    format!("{} {}", kind.as_str(), if n.is_empty() { "<anonymous>" } else { n })
}

/// Reads the whole declaration text of `cur`'s extent from `source`, used
/// for the inline-token scan and the macro function-like check.
fn decl_text<'a>(cur: &Cursor, source: &'a [u8]) -> &'a str {
    match extent_offsets(cur) {
        Some((s, e)) if e <= source.len() && s <= e => {
            std::str::from_utf8(&source[s..e]).unwrap_or("")
        }
        _ => "",
    }
}

/// A function-like macro has its name immediately followed by `(` with no
/// intervening whitespace.
fn macro_is_function_like(cur: &Cursor, source: &[u8]) -> bool {
    let name = match cur.get_name() {
        Some(n) => n,
        None => return false,
    };
    let text = decl_text(cur, source);
    match text.find(name.as_str()) {
        Some(idx) => text.as_bytes().get(idx + name.len()) == Some(&b'('),
        None => false,
    }
}

/// Computes the GID a function cursor mints in `extract_entities`: `tag` is
/// `"fn"` for a definition or `"proto"` otherwise, and `decl_sig`/`eff_sig`/
/// `storage` come from the same derivations used there. Shared with the
/// call graph builder so a resolved callee's `dst_gid` always lands on the
/// same value as the `entities.gid` row that callee would produce.
pub(crate) fn function_gid(
    cur: &Cursor,
    filename: &str,
    source: &[u8],
    id_length: usize,
    id_sep: &str,
) -> String {
    let text = decl_text(cur, source);
    let storage = storage_of(cur, text);
    let decl_sig = fn_signature(cur);
    let eff_sig = eff_sig_of(cur);
    let tag = if cur.is_definition() { "fn" } else { "proto" };
    short_id_with(&[tag, &decl_sig, &eff_sig, storage.as_str(), filename], id_length, id_sep)
}

struct IdMint<'a> {
    length: usize,
    sep: &'a str,
}

impl IdMint<'_> {
    fn id(&self, parts: &[&str]) -> String {
        short_id_with(parts, self.length, self.sep)
    }
}

/// Extracts top-level entities declared in `filename`, sorted by
/// `(start, end)`. `filename` must be the exact path string the cursors'
/// locations are compared against (the same one passed to the clang
/// bridge), and `source` the raw bytes of that file before rewriting.
pub fn extract_entities(
    tu: &TranslationUnit,
    filename: &Path,
    source: &[u8],
    id_length: usize,
    id_sep: &str,
) -> Vec<Entity> {
    let mint = IdMint { length: id_length, sep: id_sep };
    let filename_str = filename.to_string_lossy();
    let mut out = Vec::new();

    for cur in tu.get_entity().get_children() {
        let Some(path) = cursor_file_path(&cur) else {
            continue;
        };
        if path != filename {
            continue;
        }
        let Some((start, end)) = extent_offsets(&cur) else {
            continue;
        };

        match cur.get_kind() {
            CursorKind::FunctionDecl => {
                let text = decl_text(&cur, source);
                let storage = storage_of(&cur, text);
                let decl_sig = fn_signature(&cur);
                let eff_sig = eff_sig_of(&cur);
                let is_def = cur.is_definition();
                let kind = if is_def { EntityKind::Fn } else { EntityKind::Prototype };
                let gid = function_gid(&cur, &filename_str, source, id_length, id_sep);
                let sig_id = mint.id(&["sig", &collapse_whitespace(&eff_sig)]);
                out.push(Entity {
                    kind,
                    name: cur.get_name().unwrap_or_default(),
                    start,
                    end,
                    storage,
                    decl_sig,
                    eff_sig,
                    gid,
                    sig_id,
                    linkage: storage.linkage(),
                });
            }
            CursorKind::StructDecl | CursorKind::UnionDecl | CursorKind::EnumDecl => {
                if !cur.is_definition() {
                    continue;
                }
                let kind = match cur.get_kind() {
                    CursorKind::StructDecl => EntityKind::Struct,
                    CursorKind::UnionDecl => EntityKind::Union,
                    _ => EntityKind::Enum,
                };
                let name = cur.get_name();
                let eff_sig = record_sig(kind, &name);
                let gid = mint.id(&[kind.as_str(), &eff_sig, "extern", &filename_str]);
                let sig_id = mint.id(&["sig", &collapse_whitespace(&eff_sig)]);
                out.push(Entity {
                    kind,
                    name: name.unwrap_or_else(|| "<anonymous>".to_string()),
                    start,
                    end,
                    storage: Storage::Extern,
                    decl_sig: eff_sig.clone(),
                    eff_sig,
                    gid,
                    sig_id,
                    linkage: Linkage::External,
                });
            }
            CursorKind::TypedefDecl => {
                let decl_sig = typedef_sig(&cur);
                let eff_sig = eff_sig_of(&cur);
                let gid = mint.id(&["typedef", &eff_sig, "extern", &filename_str]);
                let sig_id = mint.id(&["sig", &collapse_whitespace(&eff_sig)]);
                out.push(Entity {
                    kind: EntityKind::Typedef,
                    name: cur.get_name().unwrap_or_default(),
                    start,
                    end,
                    storage: Storage::Extern,
                    decl_sig,
                    eff_sig,
                    gid,
                    sig_id,
                    linkage: Linkage::External,
                });
            }
            CursorKind::MacroDefinition => {
                if !macro_is_function_like(&cur, source) {
                    continue;
                }
                let name = cur.get_name().unwrap_or_default();
                let eff_sig = format!("#define {name}(...)");
                let gid = mint.id(&["macro", &name, &filename_str]);
                let sig_id = mint.id(&["sig", &collapse_whitespace(&eff_sig)]);
                out.push(Entity {
                    kind: EntityKind::Macro,
                    name,
                    start,
                    end,
                    storage: Storage::Extern,
                    decl_sig: eff_sig.clone(),
                    eff_sig,
                    gid,
                    sig_id,
                    linkage: Linkage::External,
                });
            }
            _ => {}
        }
    }

    out.sort_by_key(|e| (e.start, e.end));
    out
}
