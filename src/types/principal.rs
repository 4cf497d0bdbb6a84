//! Principal type that can be either a User or a Group.

use std::fmt::{Display, Formatter, Result as FmtResult};

use super::entity_id::{GroupId, UserId};

/// Who a rule applies to, or what a group contains.
///
/// Used both as the subject of an [`AccessRule`](super::AccessRule) and as a
/// member of a [`Group`](super::Group), so a rule always names exactly one of
/// the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Principal {
    Group(GroupId),
    User(UserId),
}

impl Principal {
    pub fn as_group(&self) -> Option<GroupId> {
        match self {
            Principal::Group(group) => Some(*group),
            Principal::User(_) => None,
        }
    }

    pub fn as_user(&self) -> Option<UserId> {
        match self {
            Principal::User(user) => Some(*user),
            Principal::Group(_) => None,
        }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Principal::Group(group) => write!(f, "group {group}"),
            Principal::User(user) => write!(f, "user {user}"),
        }
    }
}

impl From<GroupId> for Principal {
    fn from(group: GroupId) -> Self {
        Principal::Group(group)
    }
}

impl From<UserId> for Principal {
    fn from(user: UserId) -> Self {
        Principal::User(user)
    }
}
