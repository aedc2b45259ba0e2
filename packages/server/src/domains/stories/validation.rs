use crate::common::validation::{char_len, not_blank, Validator};

pub const TITLE_MIN_CHARS: usize = 10;
pub const TITLE_MAX_CHARS: usize = 20;
pub const CONTENT_MAX_CHARS: usize = 500;

/// Field rules shared by create and update
pub fn validate_story(title: &str, content: &str) -> Validator {
    let title_len = char_len(title);
    let mut v = Validator::new();
    v.check(not_blank(title), "title", "Title is required");
    v.check(
        (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title_len),
        "title",
        "Title must be between 10-20 characters",
    );
    v.check(not_blank(content), "content", "Content is required");
    v.check(
        char_len(content) <= CONTENT_MAX_CHARS,
        "content",
        "Content must be 500 characters or less",
    );
    v
}
