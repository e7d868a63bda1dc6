mod prompts;

pub use prompts::PostgresPromptRepo;
