//! Identity emitted by the external identity provider.
//!
//! Credential issuance (login, password reset, verification) is outside this
//! crate; the sync engine only reacts to identity transitions via
//! [`crate::SyncService::start`] / [`crate::SyncService::stop`].

use serde::{Deserialize, Serialize};

/// The authenticated identity a ledger document belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable identifier; the remote document is addressed by it
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    /// Create an identity with just an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
        }
    }

    pub fn with_profile(
        id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: Some(display_name.into()),
            email: Some(email.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_uses_camel_case() {
        let identity = Identity::with_profile("uid-1", "Alice", "alice@example.com");
        let json = serde_json::to_string(&identity).unwrap();

        assert!(json.contains("displayName"));
        assert!(json.contains("uid-1"));
    }

    #[test]
    fn bare_identity_omits_profile_fields() {
        let identity = Identity::new("uid-1");
        let json = serde_json::to_string(&identity).unwrap();
        assert_eq!(json, r#"{"id":"uid-1"}"#);
    }
}
