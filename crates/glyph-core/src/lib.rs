//! Core types, GID minting, configuration, and SQLite storage for glyph.
//!
//! - [`types`] — entity/call/include schema and the crate-wide error type
//! - [`hash`] — deterministic CRC64-ECMA → base36 short IDs
//! - [`config`] — configuration loading from `.glyph/glyph.json`
//! - [`store`] — the single-file SQLite index: schema, ingest, queries

pub mod config;
pub mod hash;
pub mod store;
pub mod types;

pub use store::Store;
pub use types::{
    CallEdge, CallsiteKind, Entity, EntityKind, GlyphError, IncludeEdge, IncludeKind, Linkage,
    Result, Storage, StoredEntity,
};
