//! Signed-in user profile

use serde::{Deserialize, Serialize};

/// The locally cached representation of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Bearer token attached to service requests, when one was issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
