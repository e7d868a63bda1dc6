//! Repository tests shared between backends.
//!
//! Each test is an async fn taking `&dyn PromptRepo`; the SQLite wrappers run
//! with every `cargo test`, the PostgreSQL wrappers need Docker and run with
//! `cargo test -- --ignored`.
