//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

/// A stable identity reference usable as an entity author.
///
/// Identities are provisioned from the configured token list at startup,
/// not through the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
}
