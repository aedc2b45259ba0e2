/// Authorization for story mutations
///
/// Ownership is checked against the loaded resource, inside the handler:
///
/// ```ignore
/// use crate::common::auth::{Actor, StoryCapability};
///
/// Actor::new(user.id)
///     .can(StoryCapability::Delete)
///     .on(&story)
///     .check()?;
/// ```
///
/// Storage additionally scopes updates and deletes by owner.

mod builder;
mod capability;
mod errors;

pub use builder::{Actor, CapabilityBuilder, OwnershipCheck};
pub use capability::StoryCapability;
pub use errors::AuthError;
