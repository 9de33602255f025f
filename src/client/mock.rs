//! Mock authentication service for testing
//!
//! Provides an in-process implementation of [`AuthApi`] for unit tests of the
//! session core without making real HTTP calls.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::AuthApi;
use super::models::{Identity, LoginGrant, RefreshGrant, Role};
use crate::error::{ApiError, Result};

/// Build an identity snapshot for tests
pub fn identity(username: &str, role: Role) -> Identity {
    let created_at = NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid fixture date");
    Identity {
        id: username.len() as i64,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        role,
        created_at,
        last_login: None,
        is_active: Some(true),
        updated_at: None,
    }
}

/// What the next `refresh` call does
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Issue a new access credential (and identity)
    Grant(RefreshGrant),
    /// Reject the renewal credential (401)
    Rejected,
    /// Fail before reaching the service
    TransportFailure,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub login: usize,
    pub logout: usize,
    pub refresh: usize,
}

impl CallCounts {
    /// Get total number of API calls made.
    pub fn total(&self) -> usize {
        self.login + self.logout + self.refresh
    }
}

/// Mock auth client.
///
/// Configure expected responses via builder methods, then hand it to a
/// `SessionState`. Refresh outcomes are consumed in order; once the queue is
/// empty every refresh is rejected.
#[derive(Clone, Default)]
pub struct MockAuthClient {
    login_grant: Arc<Mutex<Option<LoginGrant>>>,
    refresh_outcomes: Arc<Mutex<VecDeque<RefreshOutcome>>>,
    logout_fails: Arc<Mutex<bool>>,
    refresh_delay: Arc<Mutex<Option<Duration>>>,
    call_count: Arc<Mutex<CallCounts>>,
    /// Bearer tokens presented to logout/refresh, in call order
    presented_tokens: Arc<Mutex<Vec<String>>>,
}

impl MockAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant returned by `login`
    pub async fn with_login(self, grant: LoginGrant) -> Self {
        *self.login_grant.lock().await = Some(grant);
        self
    }

    /// Queue a successful renewal issuing `access`
    pub async fn with_refresh_grant(self, access: &str, user: Identity) -> Self {
        self.refresh_outcomes
            .lock()
            .await
            .push_back(RefreshOutcome::Grant(RefreshGrant {
                access_token: access.to_string(),
                user,
                refresh_token: None,
            }));
        self
    }

    /// Queue an arbitrary refresh outcome
    pub async fn with_refresh_outcome(self, outcome: RefreshOutcome) -> Self {
        self.refresh_outcomes.lock().await.push_back(outcome);
        self
    }

    /// Make every logout notification fail with a transport error
    pub async fn with_failing_logout(self) -> Self {
        *self.logout_fails.lock().await = true;
        self
    }

    /// Delay each refresh, to widen concurrency windows in tests
    pub async fn with_refresh_delay(self, delay: Duration) -> Self {
        *self.refresh_delay.lock().await = Some(delay);
        self
    }

    /// Get the call counts for verification in tests.
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Bearer tokens presented to logout and refresh
    pub async fn presented_tokens(&self) -> Vec<String> {
        self.presented_tokens.lock().await.clone()
    }
}

#[async_trait]
impl AuthApi for MockAuthClient {
    async fn login(&self, _login: &str, _password: &str) -> Result<LoginGrant> {
        self.call_count.lock().await.login += 1;
        self.login_grant
            .lock()
            .await
            .clone()
            .ok_or_else(|| ApiError::Unauthorized("Credenciais inválidas".to_string()).into())
    }

    async fn logout(&self, access: &str) -> Result<()> {
        self.call_count.lock().await.logout += 1;
        self.presented_tokens.lock().await.push(access.to_string());
        if *self.logout_fails.lock().await {
            return Err(ApiError::Network("Failed to connect to API".to_string()).into());
        }
        Ok(())
    }

    async fn refresh(&self, renewal: &str) -> Result<RefreshGrant> {
        self.call_count.lock().await.refresh += 1;
        self.presented_tokens.lock().await.push(renewal.to_string());

        let delay = *self.refresh_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.refresh_outcomes.lock().await.pop_front();
        match outcome {
            Some(RefreshOutcome::Grant(grant)) => Ok(grant),
            Some(RefreshOutcome::TransportFailure) => {
                Err(ApiError::Network("Request timed out".to_string()).into())
            }
            Some(RefreshOutcome::Rejected) | None => {
                Err(ApiError::Unauthorized("Usuário inválido".to_string()).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let mock = MockAuthClient::new().with_failing_logout().await;

        assert!(mock.login("ana", "pw").await.is_err());
        assert!(mock.logout("acc").await.is_err());
        assert!(mock.refresh("ref").await.is_err());

        let counts = mock.call_counts().await;
        assert_eq!(counts.login, 1);
        assert_eq!(counts.logout, 1);
        assert_eq!(counts.refresh, 1);
        assert_eq!(counts.total(), 3);
        assert_eq!(mock.presented_tokens().await, vec!["acc", "ref"]);
    }

    #[tokio::test]
    async fn test_mock_refresh_queue_in_order() {
        let mock = MockAuthClient::new()
            .with_refresh_outcome(RefreshOutcome::TransportFailure)
            .await
            .with_refresh_grant("acc-2", identity("ana", Role::User))
            .await;

        assert!(mock.refresh("ref").await.is_err());
        assert_eq!(mock.refresh("ref").await.unwrap().access_token, "acc-2");
        // Queue exhausted
        assert!(mock.refresh("ref").await.is_err());
    }
}
