//! Anonymous principal that scans are attributed to.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by [`IdentityId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityValidationError {
    /// The identifier was empty.
    #[error("identity id must not be empty")]
    EmptyId,
    /// The identifier contained whitespace or a path separator.
    #[error("identity id must not contain whitespace or '/'")]
    InvalidCharacters,
}

/// Opaque, stable identifier of a principal.
///
/// The identifier doubles as the partition key of the scan store, so it must
/// not contain whitespace or `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityId(String);

impl IdentityId {
    /// Validate and construct an [`IdentityId`].
    ///
    /// # Examples
    /// ```
    /// use nutrisnap::domain::IdentityId;
    ///
    /// let id = IdentityId::new("u1").expect("valid id");
    /// assert_eq!(id.as_ref(), "u1");
    /// assert!(IdentityId::new("").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentityValidationError::EmptyId);
        }
        if id.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(IdentityValidationError::InvalidCharacters);
        }
        Ok(Self(id))
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl AsRef<str> for IdentityId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<IdentityId> for String {
    fn from(value: IdentityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdentityId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// The principal a scan is attributed to.
///
/// Only anonymous identities are issued today; the flag is carried so
/// consumers can tell them apart from linked accounts later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    id: IdentityId,
    is_anonymous: bool,
}

impl Identity {
    /// Build an identity from its parts.
    pub fn new(id: IdentityId, is_anonymous: bool) -> Self {
        Self { id, is_anonymous }
    }

    /// Issue a fresh anonymous identity with a random id.
    pub fn issue_anonymous() -> Self {
        Self::new(IdentityId::random(), true)
    }

    /// Stable identifier, also the scan store partition key.
    pub fn id(&self) -> &IdentityId {
        &self.id
    }

    /// Whether the principal is anonymous.
    pub fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }
}
