//! The in-memory entity graph for one authz file.
//!
//! A [`Document`] owns every repository, path, group, user and access rule.
//! All relations are typed ids into its arenas, and every mutation validates
//! its input and checks the graph invariants before touching any state:
//!
//! - names are unique per kind, and aliases never collide with user names or
//!   other aliases;
//! - a path carries at most one rule per group or user;
//! - group containment is acyclic;
//! - every id stored in a relation refers to a live entity of this document.
//!
//! Removals cascade and are idempotent: removing an entity that is already
//! gone does nothing.

use std::collections::{BTreeSet, HashMap, HashSet};

use itertools::Itertools;
use tracing::debug;

use crate::arena::Arena;
use crate::error::{AuthzError, Field};
use crate::types::{
    AccessLevel, AccessRule, DocumentSnapshot, Group, GroupId, GroupMarker, GroupSnapshot, Path,
    PathId, PathMarker, PathSnapshot, Principal, Repository, RepositoryId, RepositoryMarker,
    RuleId, RuleMarker, RuleSnapshot, User, UserId, UserMarker, UserSnapshot,
};
use crate::validate::{
    validate_access_level, validate_alias, validate_group_name, validate_path,
    validate_repository_name, validate_user_name,
};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Default)]
pub struct Document {
    repositories: Arena<RepositoryMarker, Repository>,
    paths: Arena<PathMarker, Path>,
    groups: Arena<GroupMarker, Group>,
    users: Arena<UserMarker, User>,
    rules: Arena<RuleMarker, AccessRule>,
    repository_names: HashMap<String, RepositoryId>,
    path_keys: HashMap<(Option<RepositoryId>, String), PathId>,
    group_names: HashMap<String, GroupId>,
    user_names: HashMap<String, UserId>,
    user_aliases: HashMap<String, UserId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
            && self.paths.is_empty()
            && self.groups.is_empty()
            && self.users.is_empty()
    }

    // Repositories

    pub fn add_repository(&mut self, name: &str) -> Result<RepositoryId, AuthzError> {
        validate_repository_name(name)?;
        if self.repository_names.contains_key(name) {
            return Err(AuthzError::Duplicate(format!(
                "repository '{name}' already exists"
            )));
        }

        let id = self.repositories.insert(Repository::new(name));
        self.repository_names.insert(name.to_string(), id);
        debug!(event = "Mutation", phase = "AddRepository", repository = name);
        Ok(id)
    }

    /// Remove a repository together with its paths and their rules.
    pub fn remove_repository(&mut self, id: RepositoryId) {
        let Some(repository) = self.repositories.remove(id) else {
            return;
        };
        for path in &repository.paths {
            self.remove_path(*path);
        }
        self.repository_names.remove(&repository.name);
        debug!(
            event = "Mutation",
            phase = "RemoveRepository",
            repository = repository.name
        );
    }

    pub fn find_repository(&self, name: &str) -> Option<RepositoryId> {
        self.repository_names.get(name).copied()
    }

    pub fn repository(&self, id: RepositoryId) -> Option<&Repository> {
        self.repositories.get(id)
    }

    pub fn repositories(&self) -> impl Iterator<Item = (RepositoryId, &Repository)> + '_ {
        self.repositories.iter()
    }

    // Paths

    /// Add a path, either server-level (`repository == None`) or under a
    /// repository of this document.
    pub fn add_path(
        &mut self,
        repository: Option<RepositoryId>,
        path: &str,
    ) -> Result<PathId, AuthzError> {
        validate_path(path)?;
        if repository.is_none() && path.contains(':') {
            return Err(AuthzError::invalid(
                Field::Path,
                path,
                "server-level paths must not contain ':'",
            ));
        }
        if let Some(repository) = repository {
            if !self.repositories.contains(repository) {
                return Err(AuthzError::UnknownReference(format!(
                    "repository {repository} does not exist"
                )));
            }
        }

        let key = (repository, path.to_string());
        if self.path_keys.contains_key(&key) {
            return Err(AuthzError::Duplicate(format!(
                "path '{}' already exists",
                self.qualify(repository, path)
            )));
        }

        let id = self.paths.insert(Path::new(repository, path));
        self.path_keys.insert(key, id);
        if let Some(owner) = repository.and_then(|r| self.repositories.get_mut(r)) {
            owner.paths.insert(id);
        }
        debug!(
            event = "Mutation",
            phase = "AddPath",
            path = self.qualify(repository, path)
        );
        Ok(id)
    }

    /// Remove a path and every rule attached to it.
    pub fn remove_path(&mut self, id: PathId) {
        let Some(path) = self.paths.remove(id) else {
            return;
        };
        for rule in &path.rules {
            self.detach_rule(*rule);
        }
        if let Some(owner) = path.repository.and_then(|r| self.repositories.get_mut(r)) {
            owner.paths.remove(&id);
        }
        let label = self.qualify(path.repository, &path.path);
        self.path_keys.remove(&(path.repository, path.path));
        debug!(event = "Mutation", phase = "RemovePath", path = label);
    }

    pub fn find_path(&self, repository: Option<RepositoryId>, path: &str) -> Option<PathId> {
        self.path_keys.get(&(repository, path.to_string())).copied()
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.paths.get(id)
    }

    pub fn paths(&self) -> impl Iterator<Item = (PathId, &Path)> + '_ {
        self.paths.iter()
    }

    /// The section name of a path: `repo:/path`, or `/path` for server-level paths.
    pub fn section_name(&self, id: PathId) -> Option<String> {
        self.paths
            .get(id)
            .map(|path| self.qualify(path.repository, &path.path))
    }

    fn qualify(&self, repository: Option<RepositoryId>, path: &str) -> String {
        match repository.and_then(|r| self.repositories.get(r)) {
            Some(repository) => format!("{}:{path}", repository.name),
            None => path.to_string(),
        }
    }

    // Groups

    pub fn add_group(&mut self, name: &str) -> Result<GroupId, AuthzError> {
        validate_group_name(name)?;
        if self.group_names.contains_key(name) {
            return Err(AuthzError::Duplicate(format!("group '{name}' already exists")));
        }

        let id = self.groups.insert(Group::new(name));
        self.group_names.insert(name.to_string(), id);
        debug!(event = "Mutation", phase = "AddGroup", group = name);
        Ok(id)
    }

    /// Remove a group, dropping it from every membership list on either side
    /// and deleting every rule that names it.
    pub fn remove_group(&mut self, id: GroupId) {
        let Some(group) = self.groups.remove(id) else {
            return;
        };
        for parent in &group.member_of {
            if let Some(parent) = self.groups.get_mut(*parent) {
                parent.groups.remove(&id);
            }
        }
        for child in &group.groups {
            if let Some(child) = self.groups.get_mut(*child) {
                child.member_of.remove(&id);
            }
        }
        for user in &group.users {
            if let Some(user) = self.users.get_mut(*user) {
                user.member_of.remove(&id);
            }
        }
        for rule in &group.rules {
            self.detach_rule(*rule);
        }
        self.group_names.remove(&group.name);
        debug!(event = "Mutation", phase = "RemoveGroup", group = group.name);
    }

    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.group_names.get(name).copied()
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> + '_ {
        self.groups.iter()
    }

    // Users

    pub fn add_user(&mut self, name: &str, alias: Option<&str>) -> Result<UserId, AuthzError> {
        validate_user_name(name)?;
        if let Some(alias) = alias {
            validate_alias(alias)?;
        }
        if self.user_names.contains_key(name) {
            return Err(AuthzError::Duplicate(format!("user '{name}' already exists")));
        }
        if self.user_aliases.contains_key(name) {
            return Err(AuthzError::Duplicate(format!(
                "user name '{name}' is already used as an alias"
            )));
        }
        if let Some(alias) = alias {
            self.ensure_alias_free(alias, name)?;
        }

        let id = self
            .users
            .insert(User::new(name, alias.map(str::to_string)));
        self.user_names.insert(name.to_string(), id);
        if let Some(alias) = alias {
            self.user_aliases.insert(alias.to_string(), id);
        }
        debug!(event = "Mutation", phase = "AddUser", user = name, alias = ?alias);
        Ok(id)
    }

    /// Set or clear a user's alias.
    pub fn set_user_alias(&mut self, id: UserId, alias: Option<&str>) -> Result<(), AuthzError> {
        let name = self
            .users
            .get(id)
            .map(|user| user.name.clone())
            .ok_or_else(|| AuthzError::UnknownReference(format!("user {id} does not exist")))?;
        if let Some(alias) = alias {
            validate_alias(alias)?;
            self.ensure_alias_free(alias, &name)?;
        }

        let previous = self.users.get_mut(id).and_then(|user| {
            let previous = user.alias.take();
            user.alias = alias.map(str::to_string);
            previous
        });
        if let Some(previous) = previous {
            self.user_aliases.remove(&previous);
        }
        if let Some(alias) = alias {
            self.user_aliases.insert(alias.to_string(), id);
        }
        debug!(event = "Mutation", phase = "SetAlias", user = name, alias = ?alias);
        Ok(())
    }

    /// An alias may be reused by its own user, but never collide with another
    /// user's name or alias.
    fn ensure_alias_free(&self, alias: &str, owner: &str) -> Result<(), AuthzError> {
        if let Some(holder) = self
            .user_aliases
            .get(alias)
            .and_then(|id| self.users.get(*id))
        {
            if holder.name != owner {
                return Err(AuthzError::Duplicate(format!(
                    "alias '{alias}' is already used by user '{}'",
                    holder.name
                )));
            }
        }
        if alias != owner && self.user_names.contains_key(alias) {
            return Err(AuthzError::Duplicate(format!(
                "alias '{alias}' collides with an existing user name"
            )));
        }
        Ok(())
    }

    /// Remove a user, dropping its group memberships and every rule that names it.
    pub fn remove_user(&mut self, id: UserId) {
        let Some(user) = self.users.remove(id) else {
            return;
        };
        for group in &user.member_of {
            if let Some(group) = self.groups.get_mut(*group) {
                group.users.remove(&id);
            }
        }
        for rule in &user.rules {
            self.detach_rule(*rule);
        }
        self.user_names.remove(&user.name);
        if let Some(alias) = &user.alias {
            self.user_aliases.remove(alias);
        }
        debug!(event = "Mutation", phase = "RemoveUser", user = user.name);
    }

    pub fn find_user(&self, name: &str) -> Option<UserId> {
        self.user_names.get(name).copied()
    }

    pub fn find_user_by_alias(&self, alias: &str) -> Option<UserId> {
        self.user_aliases.get(alias).copied()
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(id)
    }

    pub fn users(&self) -> impl Iterator<Item = (UserId, &User)> + '_ {
        self.users.iter()
    }

    // Membership

    /// Add a user or nested group to `group`.
    ///
    /// Adding a group fails with `CircularReference` when `group` is already
    /// reachable from the new member, which includes adding a group to itself.
    pub fn add_group_member(&mut self, group: GroupId, member: Principal) -> Result<(), AuthzError> {
        let group_name = self.group_name(group)?;
        let member_label = self.principal_label(member).ok_or_else(|| {
            AuthzError::UnknownReference(format!("member {member} does not exist"))
        })?;

        if let Principal::Group(child) = member {
            if self.reaches(child, group) {
                return Err(AuthzError::CircularReference(format!(
                    "adding {member_label} to group '{group_name}' would make '{group_name}' contain itself"
                )));
            }
        }

        let Some(entry) = self.groups.get_mut(group) else {
            return Err(AuthzError::UnknownReference(format!(
                "group {group} does not exist"
            )));
        };
        let inserted = match member {
            Principal::Group(child) => entry.groups.insert(child),
            Principal::User(user) => entry.users.insert(user),
        };
        if !inserted {
            return Err(AuthzError::Duplicate(format!(
                "{member_label} is already a member of group '{group_name}'"
            )));
        }

        match member {
            Principal::Group(child) => {
                if let Some(child) = self.groups.get_mut(child) {
                    child.member_of.insert(group);
                }
            }
            Principal::User(user) => {
                if let Some(user) = self.users.get_mut(user) {
                    user.member_of.insert(group);
                }
            }
        }
        debug!(
            event = "Mutation",
            phase = "AddMember",
            group = group_name,
            member = member_label
        );
        Ok(())
    }

    pub fn remove_group_member(&mut self, group: GroupId, member: Principal) {
        let Some(entry) = self.groups.get_mut(group) else {
            return;
        };
        match member {
            Principal::Group(child) => {
                if entry.groups.remove(&child) {
                    if let Some(child) = self.groups.get_mut(child) {
                        child.member_of.remove(&group);
                    }
                }
            }
            Principal::User(user) => {
                if entry.users.remove(&user) {
                    if let Some(user) = self.users.get_mut(user) {
                        user.member_of.remove(&group);
                    }
                }
            }
        }
    }

    /// Whether `target` is `from` or is contained in it through nested groups.
    fn reaches(&self, from: GroupId, target: GroupId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(group) = self.groups.get(current) {
                stack.extend(group.groups.iter().copied());
            }
        }
        false
    }

    /// Every user contained in `group`, directly or through nested groups.
    pub fn transitive_users(&self, group: GroupId) -> BTreeSet<UserId> {
        let mut users = BTreeSet::new();
        let mut stack = vec![group];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(group) = self.groups.get(current) {
                users.extend(group.users.iter().copied());
                stack.extend(group.groups.iter().copied());
            }
        }
        users
    }

    // Access rules

    pub fn add_access_rule_for_group(
        &mut self,
        path: PathId,
        group_name: &str,
        level: &str,
    ) -> Result<RuleId, AuthzError> {
        let level = validate_access_level(level)?;
        let group = self.find_group(group_name).ok_or_else(|| {
            AuthzError::UnknownReference(format!("group '{group_name}' is not defined"))
        })?;
        self.add_access_rule(path, Principal::Group(group), level)
    }

    pub fn add_access_rule_for_user(
        &mut self,
        path: PathId,
        user_name: &str,
        level: &str,
    ) -> Result<RuleId, AuthzError> {
        let level = validate_access_level(level)?;
        let user = self.find_user(user_name).ok_or_else(|| {
            AuthzError::UnknownReference(format!("user '{user_name}' is not defined"))
        })?;
        self.add_access_rule(path, Principal::User(user), level)
    }

    /// Attach a rule for `subject` to `path`; a path holds at most one rule per subject.
    pub fn add_access_rule(
        &mut self,
        path: PathId,
        subject: Principal,
        level: AccessLevel,
    ) -> Result<RuleId, AuthzError> {
        let section = self
            .section_name(path)
            .ok_or_else(|| AuthzError::UnknownReference(format!("path {path} does not exist")))?;
        let subject_label = self.principal_label(subject).ok_or_else(|| {
            AuthzError::UnknownReference(format!("rule subject {subject} does not exist"))
        })?;
        if self.rule_for(path, subject).is_some() {
            return Err(AuthzError::Duplicate(format!(
                "{subject_label} already has a rule on [{section}]"
            )));
        }

        let id = self.rules.insert(AccessRule {
            path,
            subject,
            level,
        });
        if let Some(path) = self.paths.get_mut(path) {
            path.rules.insert(id);
        }
        match subject {
            Principal::Group(group) => {
                if let Some(group) = self.groups.get_mut(group) {
                    group.rules.insert(id);
                }
            }
            Principal::User(user) => {
                if let Some(user) = self.users.get_mut(user) {
                    user.rules.insert(id);
                }
            }
        }
        debug!(
            event = "Mutation",
            phase = "AddRule",
            path = section,
            subject = subject_label,
            level = level.code()
        );
        Ok(id)
    }

    pub fn set_access_level(&mut self, id: RuleId, level: AccessLevel) -> Result<(), AuthzError> {
        let rule = self
            .rules
            .get_mut(id)
            .ok_or_else(|| AuthzError::UnknownReference(format!("rule {id} does not exist")))?;
        rule.level = level;
        Ok(())
    }

    pub fn remove_access_rule(&mut self, id: RuleId) {
        self.detach_rule(id);
    }

    fn detach_rule(&mut self, id: RuleId) {
        let Some(rule) = self.rules.remove(id) else {
            return;
        };
        if let Some(path) = self.paths.get_mut(rule.path) {
            path.rules.remove(&id);
        }
        match rule.subject {
            Principal::Group(group) => {
                if let Some(group) = self.groups.get_mut(group) {
                    group.rules.remove(&id);
                }
            }
            Principal::User(user) => {
                if let Some(user) = self.users.get_mut(user) {
                    user.rules.remove(&id);
                }
            }
        }
    }

    /// The rule `subject` has on `path`, if any.
    pub fn rule_for(&self, path: PathId, subject: Principal) -> Option<RuleId> {
        self.paths.get(path)?.rules.iter().copied().find(|id| {
            self.rules
                .get(*id)
                .is_some_and(|rule| rule.subject == subject)
        })
    }

    pub fn access_rule(&self, id: RuleId) -> Option<&AccessRule> {
        self.rules.get(id)
    }

    pub fn access_rules(&self) -> impl Iterator<Item = (RuleId, &AccessRule)> + '_ {
        self.rules.iter()
    }

    // Naming helpers

    fn group_name(&self, id: GroupId) -> Result<String, AuthzError> {
        self.groups
            .get(id)
            .map(|group| group.name.clone())
            .ok_or_else(|| AuthzError::UnknownReference(format!("group {id} does not exist")))
    }

    /// `@group` for groups, the plain name for users.
    pub fn principal_label(&self, principal: Principal) -> Option<String> {
        match principal {
            Principal::Group(group) => self.groups.get(group).map(|g| format!("@{}", g.name)),
            Principal::User(user) => self.users.get(user).map(|u| u.name.clone()),
        }
    }

    // Deterministic orderings shared by the generator and snapshots

    /// Paths sorted by (repository name, path); server-level paths sort first.
    pub fn paths_in_order(&self) -> Vec<PathId> {
        self.paths
            .iter()
            .sorted_by(|(_, a), (_, b)| self.path_key(a).cmp(&self.path_key(b)))
            .map(|(id, _)| id)
            .collect()
    }

    fn path_key<'a>(&'a self, path: &'a Path) -> (&'a str, &'a str) {
        let repository = path
            .repository
            .and_then(|r| self.repositories.get(r))
            .map(|r| r.name.as_str())
            .unwrap_or_default();
        (repository, &path.path)
    }

    /// Rules on `path` sorted by their (repository, path, group, user) key.
    pub fn rules_in_order(&self, path: PathId) -> Vec<RuleId> {
        let Some(entry) = self.paths.get(path) else {
            return Vec::new();
        };
        entry
            .rules
            .iter()
            .filter_map(|id| self.rules.get(*id).map(|rule| (*id, self.rule_key(rule))))
            .sorted_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(id, _)| id)
            .collect()
    }

    fn rule_key(&self, rule: &AccessRule) -> (&str, &str, &str, &str) {
        let (repository, path) = self
            .paths
            .get(rule.path)
            .map(|path| self.path_key(path))
            .unwrap_or_default();
        let (group, user) = match rule.subject {
            Principal::Group(group) => (
                self.groups.get(group).map(|g| g.name.as_str()).unwrap_or_default(),
                "",
            ),
            Principal::User(user) => (
                "",
                self.users.get(user).map(|u| u.name.as_str()).unwrap_or_default(),
            ),
        };
        (repository, path, group, user)
    }

    pub fn groups_in_order(&self) -> Vec<GroupId> {
        self.groups
            .iter()
            .sorted_by(|(_, a), (_, b)| a.name.cmp(&b.name))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn users_in_order(&self) -> Vec<UserId> {
        self.users
            .iter()
            .sorted_by(|(_, a), (_, b)| a.name.cmp(&b.name))
            .map(|(id, _)| id)
            .collect()
    }

    /// Users carrying an alias, sorted by (alias, name).
    pub fn aliased_users_in_order(&self) -> Vec<UserId> {
        self.users
            .iter()
            .filter(|(_, user)| user.alias.is_some())
            .sorted_by(|(_, a), (_, b)| a.display_key().cmp(&b.display_key()))
            .map(|(id, _)| id)
            .collect()
    }

    /// Names of the direct members of `group`: nested groups sorted by name,
    /// then users sorted by name.
    pub(crate) fn member_names(&self, group: &Group) -> (Vec<&str>, Vec<&str>) {
        let groups = group
            .groups
            .iter()
            .filter_map(|id| self.groups.get(*id))
            .map(|g| g.name.as_str())
            .sorted()
            .collect();
        let users = group
            .users
            .iter()
            .filter_map(|id| self.users.get(*id))
            .map(|u| u.name.as_str())
            .sorted()
            .collect();
        (groups, users)
    }

    /// A name-based, fully sorted copy of the graph.
    pub fn snapshot(&self) -> DocumentSnapshot {
        let repositories = self
            .repositories
            .iter()
            .map(|(_, r)| r.name.clone())
            .sorted()
            .collect();

        let groups = self
            .groups_in_order()
            .into_iter()
            .filter_map(|id| self.groups.get(id))
            .map(|group| {
                let (groups, users) = self.member_names(group);
                GroupSnapshot {
                    name: group.name.clone(),
                    groups: groups.into_iter().map(str::to_string).collect(),
                    users: users.into_iter().map(str::to_string).collect(),
                }
            })
            .collect();

        let users = self
            .users_in_order()
            .into_iter()
            .filter_map(|id| self.users.get(id))
            .map(|user| UserSnapshot {
                name: user.name.clone(),
                alias: user.alias.clone(),
            })
            .collect();

        let paths = self
            .paths_in_order()
            .into_iter()
            .filter_map(|id| self.paths.get(id).map(|path| (id, path)))
            .map(|(id, path)| PathSnapshot {
                repository: path
                    .repository
                    .and_then(|r| self.repositories.get(r))
                    .map(|r| r.name.clone()),
                path: path.path.clone(),
                rules: self
                    .rules_in_order(id)
                    .into_iter()
                    .filter_map(|rule| self.rules.get(rule))
                    .map(|rule| self.rule_snapshot(rule))
                    .collect(),
            })
            .collect();

        DocumentSnapshot {
            repositories,
            groups,
            users,
            paths,
        }
    }

    fn rule_snapshot(&self, rule: &AccessRule) -> RuleSnapshot {
        let (_, _, group, user) = self.rule_key(rule);
        RuleSnapshot {
            group: rule.subject.as_group().map(|_| group.to_string()),
            user: rule.subject.as_user().map(|_| user.to_string()),
            level: rule.level,
        }
    }

    pub(crate) fn counts(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.repositories.len(),
            self.paths.len(),
            self.groups.len(),
            self.users.len(),
            self.rules.len(),
        )
    }
}

/// Documents are equal when they hold the same entities and relations,
/// regardless of insertion order or the ids assigned along the way.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl Eq for Document {}
