//! Context retrieval, repo summaries, and impact/status queries over a
//! [`glyph_core::store::Store`].
//!
//! - [`retriever`] — seed search, neighbour expansion, context materialisation
//! - [`summary`] — repo-wide two-pass entity/call aggregation
//! - [`plan`] — `explain`/`status`/`impact` pure queries

pub mod error;
pub mod plan;
pub mod retriever;
pub mod summary;

pub use error::{RetrieverError, Result};
pub use retriever::{ContextItem, Retriever};
pub use summary::{CallSummary, EntitySummary, FileSummary, RepoSummary};
