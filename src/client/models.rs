//! Authentication service models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Role of a signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// Identity snapshot issued by the authentication service.
///
/// Replaced wholesale on login and renewal; never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID
    pub id: i64,

    /// Login name
    pub username: String,

    /// Email address
    pub email: String,

    /// Authorization role
    pub role: Role,

    /// Account creation time (service-local, no zone)
    #[serde(alias = "createdAt")]
    pub created_at: NaiveDateTime,

    /// Previous successful login
    #[serde(default, alias = "lastLogin", skip_serializing_if = "Option::is_none")]
    pub last_login: Option<NaiveDateTime>,

    /// Whether the account is enabled
    #[serde(default, alias = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    /// Last profile update
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Response of `POST /login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginGrant {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    pub user: Identity,

    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshGrant {
    pub access_token: String,

    pub user: Identity,

    /// Present only when the service rotates the renewal credential
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Response of `GET /profile`
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: Identity,
}

/// Error payload returned by the service (`{"error": "..."}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message in the payload
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}
