mod prompt;
mod validators;

pub use prompt::*;
