//! Owner identity for highlights
//!
//! A session holds at most one identity: either an anonymous identity derived
//! deterministically from an email-like string, or an authenticated identity
//! with a durable, globally unique id. Switching identity triggers a
//! migration pass in the sync coordinator.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The user a highlight belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OwnerIdentity {
    Anonymous { id: String },
    Authenticated { id: String },
}

impl OwnerIdentity {
    /// Derive a stable anonymous identity from an email-like string.
    ///
    /// The same input always maps to the same id, so a returning guest finds
    /// the highlights cached under their previous session.
    pub fn anonymous(email: &str) -> Self {
        let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
        let hex = hex::encode(digest);
        OwnerIdentity::Anonymous {
            id: format!("anon-{}", &hex[..16]),
        }
    }

    /// Wrap a durable id assigned by the authentication backend.
    pub fn authenticated(id: impl Into<String>) -> Self {
        OwnerIdentity::Authenticated { id: id.into() }
    }

    pub fn owner_id(&self) -> &str {
        match self {
            OwnerIdentity::Anonymous { id } | OwnerIdentity::Authenticated { id } => id,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, OwnerIdentity::Authenticated { .. })
    }
}
