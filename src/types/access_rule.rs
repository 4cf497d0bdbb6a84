//! Access rules binding a principal to a path.

use super::access_level::AccessLevel;
use super::entity_id::PathId;
use super::principal::Principal;

/// One `subject = level` line inside a path section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessRule {
    pub(crate) path: PathId,
    pub(crate) subject: Principal,
    pub(crate) level: AccessLevel,
}

impl AccessRule {
    pub fn path(&self) -> PathId {
        self.path
    }

    pub fn subject(&self) -> Principal {
        self.subject
    }

    pub fn level(&self) -> AccessLevel {
        self.level
    }
}
