// Common types and utilities shared across the application

pub mod auth;
pub mod pagination;
pub mod validation;

pub use auth::{Actor, AuthError, StoryCapability};
pub use pagination::{PageInfo, STORIES_PER_PAGE};
pub use validation::{FieldErrors, Validator};
