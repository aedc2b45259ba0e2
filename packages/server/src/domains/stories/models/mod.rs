pub mod story;

pub use story::{Story, StoryDraft, EXCERPT_CHARS};
