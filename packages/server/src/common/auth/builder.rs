use super::{AuthError, StoryCapability};
use crate::domains::stories::Story;

/// Entry point for ownership checks
///
/// Usage:
/// ```ignore
/// Actor::new(user.id)
///     .can(StoryCapability::Edit)
///     .on(&story)
///     .check()?;
/// ```
pub struct Actor {
    actor_id: i64,
}

impl Actor {
    /// Create a new actor for authorization checks
    ///
    /// `actor_id` is the id of the identity resolved for the current request.
    pub fn new(actor_id: i64) -> Self {
        Self { actor_id }
    }

    /// Specify what the actor wants to do
    pub fn can(self, capability: StoryCapability) -> CapabilityBuilder {
        CapabilityBuilder {
            actor_id: self.actor_id,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder {
    actor_id: i64,
    capability: StoryCapability,
}

impl CapabilityBuilder {
    /// Bind the loaded resource the capability applies to
    pub fn on(self, story: &Story) -> OwnershipCheck {
        OwnershipCheck {
            actor_id: self.actor_id,
            capability: self.capability,
            owner_id: story.user_id,
            story_id: story.id,
        }
    }
}

pub struct OwnershipCheck {
    actor_id: i64,
    capability: StoryCapability,
    owner_id: i64,
    story_id: i64,
}

impl OwnershipCheck {
    /// Perform the authorization check
    pub fn check(self) -> Result<(), AuthError> {
        if self.capability.requires_owner() && self.owner_id != self.actor_id {
            return Err(AuthError::Forbidden(format!(
                "user {} may not {} story {}",
                self.actor_id,
                self.capability.as_str(),
                self.story_id
            )));
        }
        Ok(())
    }
}
