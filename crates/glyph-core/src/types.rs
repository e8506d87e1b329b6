use serde::{Deserialize, Serialize};

/// Kind of a top-level entity extracted from a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Fn,
    Prototype,
    Typedef,
    Struct,
    Union,
    Enum,
    Macro,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Fn => "fn",
            EntityKind::Prototype => "prototype",
            EntityKind::Typedef => "typedef",
            EntityKind::Struct => "struct",
            EntityKind::Union => "union",
            EntityKind::Enum => "enum",
            EntityKind::Macro => "macro",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "fn" => EntityKind::Fn,
            "prototype" => EntityKind::Prototype,
            "typedef" => EntityKind::Typedef,
            "struct" => EntityKind::Struct,
            "union" => EntityKind::Union,
            "enum" => EntityKind::Enum,
            "macro" => EntityKind::Macro,
            _ => return None,
        })
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage class of a function entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    Extern,
    Static,
    Inline,
    StaticInline,
}

impl Storage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Storage::Extern => "extern",
            Storage::Static => "static",
            Storage::Inline => "inline",
            Storage::StaticInline => "static_inline",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "extern" => Storage::Extern,
            "static" => Storage::Static,
            "inline" => Storage::Inline,
            "static_inline" => Storage::StaticInline,
            _ => return None,
        })
    }

    /// `internal` iff storage is `static` or `static_inline`.
    pub fn linkage(&self) -> Linkage {
        match self {
            Storage::Static | Storage::StaticInline => Linkage::Internal,
            Storage::Extern | Storage::Inline => Linkage::External,
        }
    }
}

impl std::fmt::Display for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility domain of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    Internal,
    External,
}

impl Linkage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Linkage::Internal => "internal",
            Linkage::External => "external",
        }
    }
}

impl std::fmt::Display for Linkage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level entity extracted from one translation unit, prior to
/// persistence (no `file_id` yet — that's assigned at ingest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub storage: Storage,
    pub decl_sig: String,
    pub eff_sig: String,
    pub gid: String,
    pub sig_id: String,
    pub linkage: Linkage,
}

/// The kind of a callsite: a direct named call, a function-pointer call, or
/// an unclassifiable call expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallsiteKind {
    Direct,
    Fp,
    Unknown,
}

impl CallsiteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallsiteKind::Direct => "direct",
            CallsiteKind::Fp => "fp",
            CallsiteKind::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "direct" => CallsiteKind::Direct,
            "fp" => CallsiteKind::Fp,
            "unknown" => CallsiteKind::Unknown,
            _ => return None,
        })
    }
}

impl std::fmt::Display for CallsiteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved or unresolved call edge, prior to persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEdge {
    pub src_gid: String,
    pub dst_gid: Option<String>,
    pub dst_name: Option<String>,
}

/// Kind of `#include` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeKind {
    Quote,
    Angle,
    Unknown,
}

impl IncludeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncludeKind::Quote => "quote",
            IncludeKind::Angle => "angle",
            IncludeKind::Unknown => "",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "quote" => IncludeKind::Quote,
            "angle" => IncludeKind::Angle,
            _ => IncludeKind::Unknown,
        }
    }
}

/// A resolved `#include` edge discovered while parsing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeEdge {
    pub dst_path: String,
    pub kind: IncludeKind,
}

/// A row from the `entities` table, joined with its owning file's path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntity {
    pub gid: String,
    pub kind: EntityKind,
    pub name: String,
    pub storage: Storage,
    pub linkage: Linkage,
    pub decl_sig: String,
    pub eff_sig: String,
    pub sig_id: String,
    pub file_path: String,
    pub start: i64,
    pub end: i64,
}

/// Errors surfaced by the core crate.
#[derive(Debug, thiserror::Error)]
pub enum GlyphError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema migration failed: {0}")]
    Schema(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GlyphError>;
