// Integration test entry point for clang-bridge parsing tests.
#[path = "parsing/test_gid_determinism.rs"]
mod test_gid_determinism;
#[path = "parsing/test_entity_extraction.rs"]
mod test_entity_extraction;
#[path = "parsing/test_marker_idempotence.rs"]
mod test_marker_idempotence;
