mod prompts;

use std::sync::Arc;

pub use prompts::PromptService;

use crate::db::DbPool;

/// Database-backed services, built once per process.
#[derive(Clone)]
pub struct Services {
    pub prompts: PromptService,
}

impl Services {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            prompts: PromptService::new(db),
        }
    }
}
