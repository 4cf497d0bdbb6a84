//! Group entities and their membership relations.

use std::collections::BTreeSet;

use super::entity_id::{GroupId, RuleId, UserId};
use super::principal::Principal;

/// A named group of users and nested groups.
///
/// Membership is stored on both ends: `groups`/`users` are the members of
/// this group, `member_of` lists the groups that contain this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub(crate) name: String,
    pub(crate) groups: BTreeSet<GroupId>,
    pub(crate) users: BTreeSet<UserId>,
    pub(crate) member_of: BTreeSet<GroupId>,
    pub(crate) rules: BTreeSet<RuleId>,
}

impl Group {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Group {
            name: name.into(),
            groups: BTreeSet::new(),
            users: BTreeSet::new(),
            member_of: BTreeSet::new(),
            rules: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nested groups contained in this group.
    pub fn group_members(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.iter().copied()
    }

    /// Users contained directly in this group.
    pub fn user_members(&self) -> impl Iterator<Item = UserId> + '_ {
        self.users.iter().copied()
    }

    /// All direct members, nested groups first.
    pub fn members(&self) -> impl Iterator<Item = Principal> + '_ {
        self.group_members()
            .map(Principal::Group)
            .chain(self.user_members().map(Principal::User))
    }

    pub fn has_member(&self, member: Principal) -> bool {
        match member {
            Principal::Group(group) => self.groups.contains(&group),
            Principal::User(user) => self.users.contains(&user),
        }
    }

    /// Groups this group is a direct member of.
    pub fn member_of(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.member_of.iter().copied()
    }

    pub fn rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len() + self.users.len()
    }
}
