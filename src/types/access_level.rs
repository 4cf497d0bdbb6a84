//! Access levels granted by a rule.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// The permission an access rule grants on a path.
///
/// The strum serialization is the authz file code (`""`, `"r"`, `"rw"`); the
/// serde form is a readable name for report consumers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum AccessLevel {
    /// No access, written as an empty value (`user =`)
    #[strum(serialize = "")]
    Deny,
    /// Read-only access (`r`)
    #[strum(serialize = "r")]
    ReadOnly,
    /// Read-write access (`rw`)
    #[strum(serialize = "rw")]
    ReadWrite,
}

impl AccessLevel {
    /// The code as written in an authz file.
    pub fn code(&self) -> &str {
        self.as_ref()
    }
}
