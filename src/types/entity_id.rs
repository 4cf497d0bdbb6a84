//! Typed arena indices for document entities.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::marker::PhantomData;

/// Marker type for Repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RepositoryMarker {}

/// Marker type for Paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathMarker {}

/// Marker type for Groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupMarker {}

/// Marker type for Users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserMarker {}

/// Marker type for AccessRules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleMarker {}

/// A slot index into one entity arena of a [`Document`](crate::Document).
///
/// The marker parameter keeps a `GroupId` from being handed to an API that
/// expects a `UserId`, at zero runtime cost over a plain `usize`. Ids are only
/// meaningful for the document that issued them, and a removed entity's id is
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId<T> {
    index: usize,
    _marker: PhantomData<T>,
}

impl<T> EntityId<T> {
    pub(crate) fn new(index: usize) -> Self {
        EntityId {
            index,
            _marker: PhantomData,
        }
    }

    /// Get the raw slot index.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Display for EntityId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#{}", self.index)
    }
}

/// A Repository's arena id.
pub type RepositoryId = EntityId<RepositoryMarker>;

/// A Path's arena id.
pub type PathId = EntityId<PathMarker>;

/// A Group's arena id.
pub type GroupId = EntityId<GroupMarker>;

/// A User's arena id.
pub type UserId = EntityId<UserMarker>;

/// An AccessRule's arena id.
pub type RuleId = EntityId<RuleMarker>;
