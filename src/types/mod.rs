//! Entity types owned by a [`Document`](crate::Document).
//!
//! Entities never point at each other directly. Every relation is an
//! [`EntityId`] into one of the document's arenas, so removing an entity only
//! has to clear ids, never break reference cycles.

mod access_level;
mod access_rule;
mod entity_id;
mod group;
mod path;
mod principal;
mod repository;
mod snapshot;
mod user;

pub use access_level::AccessLevel;
pub use access_rule::AccessRule;
pub use entity_id::{
    EntityId, GroupId, GroupMarker, PathId, PathMarker, RepositoryId, RepositoryMarker, RuleId,
    RuleMarker, UserId, UserMarker,
};
pub use group::Group;
pub use path::Path;
pub use principal::Principal;
pub use repository::Repository;
pub use snapshot::{DocumentSnapshot, GroupSnapshot, PathSnapshot, RuleSnapshot, UserSnapshot};
pub use user::User;
