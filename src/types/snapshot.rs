//! Name-based, sorted view of a document for report generators.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::access_level::AccessLevel;

/// A document with every id resolved to a name and every list sorted.
///
/// Two documents holding the same entities and relations produce equal
/// snapshots regardless of the order they were built in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub repositories: Vec<String>,
    pub groups: Vec<GroupSnapshot>,
    pub users: Vec<UserSnapshot>,
    pub paths: Vec<PathSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub name: String,
    /// Nested group members, by name
    pub groups: Vec<String>,
    /// User members, by name
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PathSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub path: String,
    pub rules: Vec<RuleSnapshot>,
}

/// A rule names exactly one of `group` or `user`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RuleSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub level: AccessLevel,
}

impl DocumentSnapshot {
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
            && self.groups.is_empty()
            && self.users.is_empty()
            && self.paths.is_empty()
    }
}
