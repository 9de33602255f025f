//! Authentication service client

use async_trait::async_trait;

use crate::error::Result;

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod models;

pub use http::HttpAuthClient;
#[cfg(test)]
pub use mock::MockAuthClient;
pub use models::{Identity, LoginGrant, ProfileResponse, RefreshGrant, Role};

/// Operations of the authentication service consumed by the session core
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange a login name (username or email) and password for credentials
    async fn login(&self, login: &str, password: &str) -> Result<LoginGrant>;

    /// Tell the service the access credential is no longer in use
    async fn logout(&self, access: &str) -> Result<()>;

    /// Exchange a renewal credential for a fresh access credential
    async fn refresh(&self, renewal: &str) -> Result<RefreshGrant>;
}

/// Format a bearer `Authorization` header value
pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
