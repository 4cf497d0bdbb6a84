//! Deterministic writer for the authz text format.
//!
//! Output order never depends on insertion order: aliases sort by
//! (alias, name), groups and their members by name, paths by
//! (repository, path) with server-level paths first, and rules by their
//! (group, user) key within a path.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::Document;
use crate::types::{Group, PathId, Principal};

pub const DEFAULT_HEADER: &str = "# Subversion path-based authorization file";

/// Column width used by [`GeneratorOptions::preview`].
pub const PREVIEW_WRAP_WIDTH: usize = 80;

/// Output settings for [`generate_with_options`].
///
/// The default writes member lists on a single line, which is what saving a
/// file uses; [`GeneratorOptions::preview`] wraps them for on-screen display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Maximum line width for group member lists; `None` disables wrapping.
    pub wrap_width: Option<usize>,
    /// Comment block written at the top. Lines not starting with `#` are
    /// prefixed with `# `.
    pub header: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            wrap_width: None,
            header: DEFAULT_HEADER.to_string(),
        }
    }
}

impl GeneratorOptions {
    pub fn preview() -> Self {
        GeneratorOptions {
            wrap_width: Some(PREVIEW_WRAP_WIDTH),
            ..Default::default()
        }
    }

    pub fn with_wrap_width(mut self, wrap_width: Option<usize>) -> Self {
        self.wrap_width = wrap_width;
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }
}

/// Serialize `doc` with the default header, wrapping member lists at
/// `wrap_width` columns when given.
pub fn generate(doc: &Document, wrap_width: Option<usize>) -> String {
    generate_with_options(doc, &GeneratorOptions::default().with_wrap_width(wrap_width))
}

pub fn generate_with_options(doc: &Document, options: &GeneratorOptions) -> String {
    let mut blocks: Vec<Vec<String>> = Vec::new();

    blocks.push(header_lines(&options.header));

    let aliases = alias_lines(doc);
    if !aliases.is_empty() {
        blocks.push(aliases);
    }

    blocks.push(group_lines(doc, options.wrap_width));

    for path in doc.paths_in_order() {
        if let Some(block) = path_block(doc, path) {
            blocks.push(block);
        }
    }

    let text = blocks
        .into_iter()
        .map(|block| block.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
        + "\n";

    info!(
        event = "Generate",
        phase = "Complete",
        bytes = text.len(),
        wrapped = options.wrap_width.is_some()
    );
    text
}

fn header_lines(header: &str) -> Vec<String> {
    let lines: Vec<String> = header
        .lines()
        .map(|line| {
            if line.starts_with('#') {
                line.to_string()
            } else {
                format!("# {line}").trim_end().to_string()
            }
        })
        .collect();
    if lines.is_empty() {
        vec![DEFAULT_HEADER.to_string()]
    } else {
        lines
    }
}

fn alias_lines(doc: &Document) -> Vec<String> {
    let aliased = doc.aliased_users_in_order();
    if aliased.is_empty() {
        return Vec::new();
    }

    let mut lines = vec!["[aliases]".to_string()];
    lines.extend(aliased.into_iter().filter_map(|id| {
        let user = doc.user(id)?;
        Some(format!("{} = {}", user.alias()?, user.name()))
    }));
    lines
}

fn group_lines(doc: &Document, wrap_width: Option<usize>) -> Vec<String> {
    let mut lines = vec!["[groups]".to_string()];
    for id in doc.groups_in_order() {
        if let Some(group) = doc.group(id) {
            lines.extend(wrap_assignment(
                group.name(),
                &member_tokens(doc, group),
                wrap_width,
            ));
        }
    }
    lines
}

/// `@nested` groups sorted by name, then users sorted by name.
fn member_tokens(doc: &Document, group: &Group) -> Vec<String> {
    let (groups, users) = doc.member_names(group);
    groups
        .into_iter()
        .map(|name| format!("@{name}"))
        .chain(users.into_iter().map(str::to_string))
        .collect()
}

/// Render `key = a, b, c`, breaking after a separator when a line would
/// exceed `wrap_width`. Continuation lines are indented so they start under
/// the `=`. A single token longer than the width gets a line of its own.
fn wrap_assignment(key: &str, items: &[String], wrap_width: Option<usize>) -> Vec<String> {
    if items.is_empty() {
        return vec![format!("{key} =")];
    }
    let Some(width) = wrap_width else {
        return vec![format!("{key} = {}", items.join(", "))];
    };

    let indent = " ".repeat(key.chars().count() + 1);
    let mut lines = Vec::new();
    let mut current = format!("{key} = ");
    let mut first = true;

    for (index, item) in items.iter().enumerate() {
        let piece = if index + 1 < items.len() {
            format!("{item},")
        } else {
            item.clone()
        };

        if first {
            current.push_str(&piece);
            first = false;
        } else if current.chars().count() + 1 + piece.chars().count() > width {
            lines.push(std::mem::replace(&mut current, format!("{indent}{piece}")));
        } else {
            current.push(' ');
            current.push_str(&piece);
        }
    }
    lines.push(current);
    lines
}

/// A `[section]` header and its rules, or `None` for a path without rules.
fn path_block(doc: &Document, path: PathId) -> Option<Vec<String>> {
    if !doc.path(path)?.has_rules() {
        return None;
    }

    let mut lines = vec![format!("[{}]", doc.section_name(path)?)];
    for id in doc.rules_in_order(path) {
        let Some(rule) = doc.access_rule(id) else {
            continue;
        };
        let subject = match rule.subject() {
            Principal::Group(group) => doc.group(group).map(|g| format!("@{}", g.name())),
            Principal::User(user) => doc.user(user).map(|u| u.rule_subject()),
        };
        let Some(subject) = subject else {
            unreachable!("access rule {id} refers to a missing subject");
        };
        lines.push(format!("{subject} = {}", rule.level().code()).trim_end().to_string());
    }
    Some(lines)
}
