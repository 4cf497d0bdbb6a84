//! User entities with an optional alias.

use std::collections::BTreeSet;

use super::entity_id::{GroupId, RuleId};

/// A user, possibly known under an alias (`&alias` in an authz file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
    pub(crate) member_of: BTreeSet<GroupId>,
    pub(crate) rules: BTreeSet<RuleId>,
}

impl User {
    pub(crate) fn new(name: impl Into<String>, alias: Option<String>) -> Self {
        User {
            name: name.into(),
            alias,
            member_of: BTreeSet::new(),
            rules: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Sort key for listings that show aliased users first by alias, then by name.
    pub fn display_key(&self) -> (&str, &str) {
        (self.alias().unwrap_or_default(), &self.name)
    }

    /// How a rule refers to this user: `&alias` if aliased, the plain name otherwise.
    pub fn rule_subject(&self) -> String {
        match &self.alias {
            Some(alias) => format!("&{alias}"),
            None => self.name.clone(),
        }
    }

    /// Groups this user is a direct member of.
    pub fn member_of(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.member_of.iter().copied()
    }

    pub fn rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        plain = { "carol", None, "carol" },
        aliased = { "alice.smith", Some("alice"), "&alice" },
    )]
    fn test_user_rule_subject(name: &str, alias: Option<&str>, expected: &str) {
        let user = User::new(name, alias.map(str::to_string));
        assert_eq!(user.rule_subject(), expected);
    }

    #[test]
    fn test_user_display_key_prefers_alias() {
        let aliased = User::new("zed", Some("abe".to_string()));
        let plain = User::new("mia", None);
        assert_eq!(aliased.display_key(), ("abe", "zed"));
        assert_eq!(plain.display_key(), ("", "mia"));
    }
}
