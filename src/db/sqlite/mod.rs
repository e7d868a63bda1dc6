mod common;
mod prompts;

pub use prompts::SqlitePromptRepo;
