//! Repository entities.

use std::collections::BTreeSet;

use super::entity_id::PathId;

/// A named repository owning the paths that appear as `[name:/path]` sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub(crate) name: String,
    pub(crate) paths: BTreeSet<PathId>,
}

impl Repository {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Repository {
            name: name.into(),
            paths: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Paths declared under this repository, in creation order.
    pub fn paths(&self) -> impl Iterator<Item = PathId> + '_ {
        self.paths.iter().copied()
    }
}
