// Stories: short text posts owned by exactly one user
pub mod models;
pub mod validation;

pub use models::{Story, StoryDraft, EXCERPT_CHARS};
pub use validation::validate_story;
