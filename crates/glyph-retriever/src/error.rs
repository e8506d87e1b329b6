//! Errors surfaced by the retriever and summary/plan surfaces.

#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    #[error("database error: {0}")]
    Database(#[from] glyph_core::types::GlyphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] glyph_parsers::ParseError),
}

pub type Result<T> = std::result::Result<T, RetrieverError>;
