//! Line-driven reader for the authz text format.
//!
//! The parser walks the input once, keeping its state in a [`ParseContext`]
//! that is created per call, and issues ordinary mutation calls into a fresh
//! [`Document`]. The first failing line aborts the parse; whatever error the
//! document raised is returned as a `ParseSyntax` error carrying that line's
//! 1-based number.

use std::collections::HashSet;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::AuthzError;
use crate::types::{GroupId, PathId, Principal, UserId};
use crate::validate::validate_access_level;

static SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(?P<name>.*)\]$").expect("section header pattern is valid"));

/// Parse authz text into a new document.
///
/// Example:
/// ```rust
/// use authz_core::parse_str;
/// let doc = parse_str("[groups]\nadmins = alice\n[/]\n@admins = rw\n").unwrap();
/// assert!(doc.find_group("admins").is_some());
/// ```
pub fn parse_str(text: &str) -> Result<Document, AuthzError> {
    parse_lines(text.lines())
}

/// Parse a sequence of raw lines, numbered from 1 in the order given.
pub fn parse_lines<I, S>(lines: I) -> Result<Document, AuthzError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut doc = Document::new();
    let mut ctx = ParseContext::default();

    for (line, content) in logical_lines(lines) {
        ctx.line = line;
        if let Err(err) = ctx.parse_line(&mut doc, &content) {
            let err = err.at_line(line);
            warn!(
                event = "Parse",
                phase = "Failed",
                line = line,
                error = err.to_string()
            );
            return Err(err);
        }
    }

    let (repositories, paths, groups, users, rules) = doc.counts();
    info!(
        event = "Parse",
        phase = "Complete",
        repositories = repositories,
        paths = paths,
        groups = groups,
        users = users,
        rules = rules
    );
    Ok(doc)
}

impl FromStr for Document {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_str(s)
    }
}

/// Trim lines, drop blank ones and fold continuation lines into the entry
/// they continue. Each logical line keeps the number of its first raw line.
///
/// A continuation line is indented, holds no `=`, and follows a
/// `key = value` line inside `[groups]`; the generator produces these when
/// wrapping long member lists. Elsewhere such a line stands on its own and
/// fails with its own line number.
fn logical_lines<I, S>(lines: I) -> Vec<(usize, String)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<(usize, String)> = Vec::new();
    let mut in_groups = false;
    for (index, raw) in lines.into_iter().enumerate() {
        let raw = raw.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('[') {
            in_groups = SECTION_HEADER
                .captures(trimmed)
                .is_some_and(|captures| captures["name"].trim() == "groups");
        }

        let continues = in_groups
            && raw.starts_with([' ', '\t'])
            && !trimmed.starts_with(['#', '['])
            && !trimmed.contains('=');
        if continues {
            if let Some((_, previous)) = out.last_mut() {
                if previous.contains('=') && !previous.starts_with(['#', '[']) {
                    previous.push(' ');
                    previous.push_str(trimmed);
                    continue;
                }
            }
        }
        out.push((index + 1, trimmed.to_string()));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Start,
    Aliases,
    Groups,
    Rules(PathId),
}

/// State carried from one line to the next during a single parse.
#[derive(Debug)]
struct ParseContext {
    section: Section,
    line: usize,
    seen_aliases: bool,
    seen_groups: bool,
    seen_paths: bool,
    /// Groups that had their own `name = members` line; groups only
    /// referenced as `@name` so far may still be defined later.
    defined_groups: HashSet<String>,
}

impl Default for ParseContext {
    fn default() -> Self {
        ParseContext {
            section: Section::Start,
            line: 0,
            seen_aliases: false,
            seen_groups: false,
            seen_paths: false,
            defined_groups: HashSet::new(),
        }
    }
}

impl ParseContext {
    fn error(&self, message: impl Into<String>) -> AuthzError {
        AuthzError::syntax(self.line, message)
    }

    fn parse_line(&mut self, doc: &mut Document, line: &str) -> Result<(), AuthzError> {
        if line.starts_with('#') {
            return Ok(());
        }
        if line.starts_with('[') {
            return self.enter_section(doc, line);
        }
        if line.starts_with(['@', '&']) && !matches!(self.section, Section::Rules(_)) {
            return Err(self.error(format!(
                "'{line}' is only allowed inside a path section"
            )));
        }

        match self.section {
            Section::Start => Err(self.error(format!(
                "'{line}' appears before any section header"
            ))),
            Section::Aliases => self.parse_alias(doc, line),
            Section::Groups => self.parse_group(doc, line),
            Section::Rules(path) => self.parse_rule(doc, path, line),
        }
    }

    fn enter_section(&mut self, doc: &mut Document, line: &str) -> Result<(), AuthzError> {
        let Some(captures) = SECTION_HEADER.captures(line) else {
            return Err(self.error(format!("invalid path header '{line}'")));
        };
        let name = captures["name"].trim();

        match name {
            "groups" => {
                if self.seen_groups {
                    return Err(self.error("multiple group sections"));
                }
                if self.seen_paths {
                    return Err(self.error("groups section must precede path sections"));
                }
                self.seen_groups = true;
                self.section = Section::Groups;
            }
            "aliases" => {
                if self.seen_aliases {
                    return Err(self.error("multiple alias sections"));
                }
                if self.seen_groups || self.seen_paths {
                    return Err(self.error(
                        "aliases section must precede the groups and path sections",
                    ));
                }
                self.seen_aliases = true;
                self.section = Section::Aliases;
            }
            _ => {
                let path = self.declare_path(doc, name)?;
                self.seen_paths = true;
                self.section = Section::Rules(path);
            }
        }

        debug!(
            event = "Parse",
            phase = "Section",
            line = self.line,
            section = name
        );
        Ok(())
    }

    /// `[/path]` declares a server-level path, `[repo:/path]` a path under
    /// `repo`, which is created on first use.
    fn declare_path(&self, doc: &mut Document, name: &str) -> Result<PathId, AuthzError> {
        let (repository, path) = match name.split_once(':') {
            Some((repository, path)) => {
                let repository = match doc.find_repository(repository) {
                    Some(id) => id,
                    None => doc.add_repository(repository)?,
                };
                (Some(repository), path)
            }
            None => (None, name),
        };

        if doc.find_path(repository, path).is_some() {
            return Err(self.error(format!("duplicate path section [{name}]")));
        }
        doc.add_path(repository, path)
    }

    fn split_assignment<'a>(&self, line: &'a str) -> Result<(&'a str, &'a str), AuthzError> {
        line.split_once('=')
            .map(|(key, value)| (key.trim(), value.trim()))
            .ok_or_else(|| self.error(format!("expected 'name = value', found '{line}'")))
    }

    /// `alias = user name`
    fn parse_alias(&mut self, doc: &mut Document, line: &str) -> Result<(), AuthzError> {
        let (alias, name) = self.split_assignment(line)?;
        match doc.find_user(name) {
            Some(user) => {
                if let Some(existing) = doc.user(user).and_then(|u| u.alias()) {
                    return Err(AuthzError::Duplicate(format!(
                        "user '{name}' already has alias '{existing}'"
                    )));
                }
                doc.set_user_alias(user, Some(alias))
            }
            None => doc.add_user(name, Some(alias)).map(|_| ()),
        }
    }

    /// `group = member, @nested, &alias ...`
    fn parse_group(&mut self, doc: &mut Document, line: &str) -> Result<(), AuthzError> {
        let (name, members) = self.split_assignment(line)?;
        if !self.defined_groups.insert(name.to_string()) {
            return Err(self.error(format!("group '{name}' defined more than once")));
        }
        let group = find_or_add_group(doc, name)?;

        for token in members
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
        {
            let member = if let Some(nested) = token.strip_prefix('@') {
                Principal::Group(find_or_add_group(doc, nested)?)
            } else if let Some(alias) = token.strip_prefix('&') {
                Principal::User(find_alias(doc, alias)?)
            } else {
                Principal::User(find_or_add_user(doc, token)?)
            };
            doc.add_group_member(group, member)?;
        }
        Ok(())
    }

    /// `@group = level`, `&alias = level` or `user = level`
    fn parse_rule(&mut self, doc: &mut Document, path: PathId, line: &str) -> Result<(), AuthzError> {
        let (subject, level) = self.split_assignment(line)?;

        if let Some(group) = subject.strip_prefix('@') {
            doc.add_access_rule_for_group(path, group, level)?;
        } else if let Some(alias) = subject.strip_prefix('&') {
            let level = validate_access_level(level)?;
            let user = find_alias(doc, alias)?;
            doc.add_access_rule(path, Principal::User(user), level)?;
        } else {
            validate_access_level(level)?;
            find_or_add_user(doc, subject)?;
            doc.add_access_rule_for_user(path, subject, level)?;
        }
        Ok(())
    }
}

fn find_or_add_group(doc: &mut Document, name: &str) -> Result<GroupId, AuthzError> {
    match doc.find_group(name) {
        Some(id) => Ok(id),
        None => doc.add_group(name),
    }
}

fn find_or_add_user(doc: &mut Document, name: &str) -> Result<UserId, AuthzError> {
    match doc.find_user(name) {
        Some(id) => Ok(id),
        None => doc.add_user(name, None),
    }
}

fn find_alias(doc: &Document, alias: &str) -> Result<UserId, AuthzError> {
    doc.find_user_by_alias(alias)
        .ok_or_else(|| AuthzError::UnknownReference(format!("alias '{alias}' is not defined")))
}
