//! Bundled public prompt collection.
//!
//! Curated prompts ship as one markdown document per language. They are
//! parsed on request and never stored in the database.

mod error;
mod language;
mod parser;
mod service;

pub use error::CollectionError;
pub use language::{Language, MarkerSet};
pub use parser::{DropReason, ParseReport, ParseWarning, ParsedPromptEntry, parse_document};
pub use service::CollectionService;
