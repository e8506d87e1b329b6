// Integration test entry point for store contract tests (no libclang
// needed — these exercise glyph-core::store directly with hand-built
// entities).
#[path = "store_contracts/test_replacement_semantics.rs"]
mod test_replacement_semantics;
#[path = "store_contracts/test_reverse_include_closure.rs"]
mod test_reverse_include_closure;
#[path = "store_contracts/test_fts_recall.rs"]
mod test_fts_recall;
