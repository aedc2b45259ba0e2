/// Mutations a user can attempt on a story
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryCapability {
    /// Show the edit form or apply an update
    Edit,

    /// Remove the story
    Delete,
}

impl StoryCapability {
    /// Every story mutation is reserved for the story's owner
    pub fn requires_owner(&self) -> bool {
        true
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryCapability::Edit => "edit",
            StoryCapability::Delete => "delete",
        }
    }
}
