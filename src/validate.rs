//! Field validators shared by the document and the parser.
//!
//! Every function here is pure. Names are compared and stored exactly as
//! given, so validation never trims or folds case; it only rejects values
//! the authz text format cannot represent unambiguously.

use std::str::FromStr;

use crate::error::{AuthzError, Field};
use crate::types::AccessLevel;

/// Characters that open a comment, a section header, a group reference or an
/// alias reference when they start a name.
const RESERVED_LEADING: [char; 4] = ['#', '[', '@', '&'];

fn validate_not_blank(field: Field, value: &str) -> Result<(), AuthzError> {
    if value.trim().is_empty() {
        return Err(AuthzError::invalid(field, value, "must not be blank"));
    }
    if value.trim() != value {
        return Err(AuthzError::invalid(
            field,
            value,
            "must not have leading or trailing whitespace",
        ));
    }
    if value.contains(['\n', '\r']) {
        return Err(AuthzError::invalid(field, value, "must not contain line breaks"));
    }
    Ok(())
}

/// Names appear both as `name = ...` keys and inside comma/space separated
/// member lists.
fn validate_name(field: Field, value: &str) -> Result<(), AuthzError> {
    validate_not_blank(field, value)?;
    if value.contains('=') {
        return Err(AuthzError::invalid(field, value, "must not contain '='"));
    }
    if value.contains(',') || value.contains(char::is_whitespace) {
        return Err(AuthzError::invalid(
            field,
            value,
            "must not contain commas or whitespace",
        ));
    }
    if value.starts_with(RESERVED_LEADING) {
        return Err(AuthzError::invalid(
            field,
            value,
            "must not start with '#', '[', '@' or '&'",
        ));
    }
    Ok(())
}

pub fn validate_group_name(name: &str) -> Result<(), AuthzError> {
    validate_name(Field::GroupName, name)
}

pub fn validate_user_name(name: &str) -> Result<(), AuthzError> {
    validate_name(Field::UserName, name)
}

pub fn validate_alias(alias: &str) -> Result<(), AuthzError> {
    validate_name(Field::Alias, alias)
}

pub fn validate_repository_name(name: &str) -> Result<(), AuthzError> {
    validate_not_blank(Field::RepositoryName, name)?;
    if name.contains(':') {
        return Err(AuthzError::invalid(
            Field::RepositoryName,
            name,
            "must not contain ':'",
        ));
    }
    Ok(())
}

/// A path starts with `/` and only ends with `/` when it is the root.
pub fn validate_path(path: &str) -> Result<(), AuthzError> {
    validate_not_blank(Field::Path, path)?;
    if !path.starts_with('/') {
        return Err(AuthzError::invalid(Field::Path, path, "must start with '/'"));
    }
    if path.len() > 1 && path.ends_with('/') {
        return Err(AuthzError::invalid(
            Field::Path,
            path,
            "must not end with '/' unless it is the root",
        ));
    }
    Ok(())
}

/// Accepts exactly `""`, `"r"` and `"rw"`.
pub fn validate_access_level(level: &str) -> Result<AccessLevel, AuthzError> {
    AccessLevel::from_str(level).map_err(|_| {
        AuthzError::invalid(
            Field::AccessLevel,
            level,
            "must be one of '', 'r' or 'rw'",
        )
    })
}
