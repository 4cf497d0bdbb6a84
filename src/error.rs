use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

/// The kind of value a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Field {
    #[strum(serialize = "group name")]
    GroupName,
    #[strum(serialize = "user name")]
    UserName,
    #[strum(serialize = "repository name")]
    RepositoryName,
    #[strum(serialize = "alias")]
    Alias,
    #[strum(serialize = "path")]
    Path,
    #[strum(serialize = "access level")]
    AccessLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AuthzError {
    #[error("invalid {field} '{value}': {reason}")]
    Validation {
        field: Field,
        value: String,
        reason: String,
    },

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("unknown reference: {0}")]
    UnknownReference(String),

    #[error("circular reference: {0}")]
    CircularReference(String),

    #[error("line {line}: {message}")]
    ParseSyntax {
        line: usize,
        message: String,
        #[source]
        cause: Option<Box<AuthzError>>,
    },

    #[error("I/O error: {0}")]
    Io(String),
}

impl AuthzError {
    pub(crate) fn invalid(field: Field, value: &str, reason: impl Into<String>) -> Self {
        AuthzError::Validation {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        AuthzError::ParseSyntax {
            line,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a 1-based line number, turning the error into a `ParseSyntax`
    /// error that keeps the original as its cause. Errors that already carry a
    /// line number are returned unchanged.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            AuthzError::ParseSyntax { .. } => self,
            other => AuthzError::ParseSyntax {
                line,
                message: other.to_string(),
                cause: Some(Box::new(other)),
            },
        }
    }

    /// The line number, for errors raised while parsing.
    pub fn line(&self) -> Option<usize> {
        match self {
            AuthzError::ParseSyntax { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The innermost error, e.g. the `UnknownReference` behind a parse failure.
    pub fn root_cause(&self) -> &AuthzError {
        match self {
            AuthzError::ParseSyntax {
                cause: Some(cause), ..
            } => cause.root_cause(),
            other => other,
        }
    }
}

impl From<std::io::Error> for AuthzError {
    fn from(err: std::io::Error) -> Self {
        AuthzError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_line_wraps_lower_layer_errors() {
        let err = AuthzError::UnknownReference("group 'ops' is not defined".to_string()).at_line(7);
        assert_eq!(err.line(), Some(7));
        assert!(matches!(err.root_cause(), AuthzError::UnknownReference(_)));
        assert_eq!(
            err.to_string(),
            "line 7: unknown reference: group 'ops' is not defined"
        );
    }

    #[test]
    fn test_at_line_keeps_existing_line_number() {
        let err = AuthzError::syntax(3, "multiple group sections").at_line(9);
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.root_cause(), &err);
    }

    #[test]
    fn test_validation_error_display() {
        let err = AuthzError::invalid(Field::RepositoryName, "a:b", "must not contain ':'");
        assert_eq!(
            err.to_string(),
            "invalid repository name 'a:b': must not contain ':'"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: AuthzError = io.into();
        assert!(matches!(err, AuthzError::Io(msg) if msg.contains("no such file")));
    }

    #[test]
    fn test_error_serialization() {
        let err = AuthzError::Duplicate("group 'admins' already exists".to_string()).at_line(2);
        let serialized = serde_json::to_value(&err).unwrap();
        let deserialized: AuthzError = serde_json::from_value(serialized).unwrap();
        assert_eq!(err, deserialized);
    }
}
