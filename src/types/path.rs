//! Path entities.

use std::collections::BTreeSet;

use super::entity_id::{RepositoryId, RuleId};

/// A repository path that access rules attach to.
///
/// A path without a repository is a server-level path, written `[/path]`;
/// it is a different entity from the same path string under any named
/// repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub(crate) repository: Option<RepositoryId>,
    pub(crate) path: String,
    pub(crate) rules: BTreeSet<RuleId>,
}

impl Path {
    pub(crate) fn new(repository: Option<RepositoryId>, path: impl Into<String>) -> Self {
        Path {
            repository,
            path: path.into(),
            rules: BTreeSet::new(),
        }
    }

    pub fn repository(&self) -> Option<RepositoryId> {
        self.repository
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_server_level(&self) -> bool {
        self.repository.is_none()
    }

    pub fn rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().copied()
    }

    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }
}
