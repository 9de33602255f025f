//! Credential renewal protocol

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{SessionState, fingerprint};

/// How concurrent renewals are coordinated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RenewalPolicy {
    /// Every caller renews on its own; concurrent rejections each hit the
    /// renewal endpoint.
    #[default]
    Independent,
    /// Renewals are serialized and a caller that waited behind a successful
    /// renewal reuses its credential.
    SingleFlight,
}

/// Obtains a new access credential with the held renewal credential.
///
/// Each renewal is a single attempt. Any failure signs the session out.
pub struct CredentialRenewer {
    session: Arc<SessionState>,
    policy: RenewalPolicy,
    gate: Mutex<()>,
}

impl CredentialRenewer {
    pub fn new(session: Arc<SessionState>, policy: RenewalPolicy) -> Self {
        Self {
            session,
            policy,
            gate: Mutex::new(()),
        }
    }

    /// Renew the access credential.
    ///
    /// Returns the new access credential, or `None` after signing out when
    /// there is no renewal credential or the service refuses it.
    pub async fn renew(&self) -> Option<String> {
        match self.policy {
            RenewalPolicy::Independent => self.perform().await,
            RenewalPolicy::SingleFlight => {
                let _flight = self.gate.lock().await;
                self.perform().await
            }
        }
    }

    /// Renew because `stale` was rejected, or because no access credential
    /// was held when `stale` is `None`.
    ///
    /// Under [`RenewalPolicy::SingleFlight`] a credential that replaced
    /// `stale` while this caller waited is returned without another request.
    pub async fn renew_stale(&self, stale: Option<&str>) -> Option<String> {
        match self.policy {
            RenewalPolicy::Independent => self.perform().await,
            RenewalPolicy::SingleFlight => {
                let _flight = self.gate.lock().await;
                if let Some(current) = self.session.access() {
                    if stale != Some(current.as_str()) {
                        log::debug!(
                            "Reusing credential renewed by a concurrent caller ({})",
                            fingerprint(&current)
                        );
                        return Some(current);
                    }
                }
                self.perform().await
            }
        }
    }

    async fn perform(&self) -> Option<String> {
        let Some(renewal) = self.session.renewal() else {
            log::info!("No renewal credential held, signing out");
            self.session.logout().await;
            return None;
        };

        log::debug!("Renewing access credential with {}", fingerprint(&renewal));
        match self.session.auth().refresh(&renewal).await {
            Ok(grant) => {
                let access = grant.access_token.clone();
                self.session
                    .apply_renewal(grant.user, grant.access_token, grant.refresh_token);
                Some(access)
            }
            Err(e) => {
                log::warn!("Credential renewal failed, signing out: {}", e);
                self.session.logout().await;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Role;
    use crate::client::mock::{MockAuthClient, RefreshOutcome, identity};
    use crate::client::models::RefreshGrant;
    use crate::store::{CredentialStore, MemoryStore, Slot};
    use std::time::Duration;

    fn signed_in(
        mock: &MockAuthClient,
        renewal: Option<&str>,
    ) -> (Arc<SessionState>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(SessionState::new(store.clone(), Arc::new(mock.clone())));
        state.login(
            identity("ana", Role::User),
            "acc-1".to_string(),
            renewal.map(str::to_string),
        );
        (state, store)
    }

    #[tokio::test]
    async fn test_renew_success_updates_session_and_store() {
        let mock = MockAuthClient::new()
            .with_refresh_grant("acc-2", identity("ana", Role::Admin))
            .await;
        let (state, store) = signed_in(&mock, Some("ref"));
        let renewer = CredentialRenewer::new(state.clone(), RenewalPolicy::Independent);

        let fresh = renewer.renew().await;

        assert_eq!(fresh.as_deref(), Some("acc-2"));
        assert_eq!(state.access().as_deref(), Some("acc-2"));
        assert!(state.is_admin());
        assert_eq!(state.renewal().as_deref(), Some("ref"));
        assert_eq!(store.read(Slot::Access).unwrap().as_deref(), Some("acc-2"));
        assert_eq!(mock.presented_tokens().await, vec!["ref"]);
    }

    #[tokio::test]
    async fn test_renew_stores_rotated_renewal() {
        let mock = MockAuthClient::new()
            .with_refresh_outcome(RefreshOutcome::Grant(RefreshGrant {
                access_token: "acc-2".to_string(),
                user: identity("ana", Role::User),
                refresh_token: Some("ref-2".to_string()),
            }))
            .await;
        let (state, store) = signed_in(&mock, Some("ref"));
        let renewer = CredentialRenewer::new(state.clone(), RenewalPolicy::Independent);

        renewer.renew().await;

        assert_eq!(state.renewal().as_deref(), Some("ref-2"));
        assert_eq!(store.read(Slot::Renewal).unwrap().as_deref(), Some("ref-2"));
    }

    #[tokio::test]
    async fn test_renew_without_renewal_credential_signs_out() {
        let mock = MockAuthClient::new();
        let (state, store) = signed_in(&mock, None);
        let renewer = CredentialRenewer::new(state.clone(), RenewalPolicy::Independent);

        assert!(renewer.renew().await.is_none());

        assert!(!state.is_authenticated());
        assert_eq!(store.read(Slot::Access).unwrap(), None);
        assert_eq!(mock.call_counts().await.refresh, 0);
    }

    #[tokio::test]
    async fn test_renew_rejected_signs_out() {
        let mock = MockAuthClient::new()
            .with_refresh_outcome(RefreshOutcome::Rejected)
            .await;
        let (state, _) = signed_in(&mock, Some("expired-ref"));
        let renewer = CredentialRenewer::new(state.clone(), RenewalPolicy::Independent);

        assert!(renewer.renew().await.is_none());

        assert!(!state.is_authenticated());
        assert!(state.renewal().is_none());
        let counts = mock.call_counts().await;
        assert_eq!(counts.refresh, 1);
        // Sign-out still notified the service with the old access credential
        assert_eq!(counts.logout, 1);
    }

    #[tokio::test]
    async fn test_renew_transport_failure_signs_out_without_retry() {
        let mock = MockAuthClient::new()
            .with_refresh_outcome(RefreshOutcome::TransportFailure)
            .await
            .with_refresh_grant("never-used", identity("ana", Role::User))
            .await;
        let (state, _) = signed_in(&mock, Some("ref"));
        let renewer = CredentialRenewer::new(state.clone(), RenewalPolicy::Independent);

        assert!(renewer.renew().await.is_none());
        assert!(!state.is_authenticated());
        assert_eq!(mock.call_counts().await.refresh, 1);
    }

    #[tokio::test]
    async fn test_independent_policy_renews_per_caller() {
        let mock = MockAuthClient::new()
            .with_refresh_delay(Duration::from_millis(50))
            .await
            .with_refresh_grant("acc-2", identity("ana", Role::User))
            .await
            .with_refresh_grant("acc-3", identity("ana", Role::User))
            .await;
        let (state, _) = signed_in(&mock, Some("ref"));
        let renewer = CredentialRenewer::new(state, RenewalPolicy::Independent);

        let (a, b) = tokio::join!(
            renewer.renew_stale(Some("acc-1")),
            renewer.renew_stale(Some("acc-1"))
        );

        assert!(a.is_some() && b.is_some());
        assert_eq!(mock.call_counts().await.refresh, 2);
    }

    #[tokio::test]
    async fn test_single_flight_shares_one_renewal() {
        let mock = MockAuthClient::new()
            .with_refresh_delay(Duration::from_millis(50))
            .await
            .with_refresh_grant("acc-2", identity("ana", Role::User))
            .await;
        let (state, _) = signed_in(&mock, Some("ref"));
        let renewer = CredentialRenewer::new(state, RenewalPolicy::SingleFlight);

        let (a, b) = tokio::join!(
            renewer.renew_stale(Some("acc-1")),
            renewer.renew_stale(Some("acc-1"))
        );

        assert_eq!(a.as_deref(), Some("acc-2"));
        assert_eq!(b.as_deref(), Some("acc-2"));
        assert_eq!(mock.call_counts().await.refresh, 1);
    }

    #[tokio::test]
    async fn test_single_flight_explicit_renew_always_calls_service() {
        let mock = MockAuthClient::new()
            .with_refresh_grant("acc-2", identity("ana", Role::User))
            .await
            .with_refresh_grant("acc-3", identity("ana", Role::User))
            .await;
        let (state, _) = signed_in(&mock, Some("ref"));
        let renewer = CredentialRenewer::new(state, RenewalPolicy::SingleFlight);

        assert_eq!(renewer.renew().await.as_deref(), Some("acc-2"));
        assert_eq!(renewer.renew().await.as_deref(), Some("acc-3"));
        assert_eq!(mock.call_counts().await.refresh, 2);
    }

    #[test]
    fn test_policy_serde_names() {
        let policy: RenewalPolicy = serde_yaml::from_str("single-flight").unwrap();
        assert_eq!(policy, RenewalPolicy::SingleFlight);
        assert_eq!(RenewalPolicy::default(), RenewalPolicy::Independent);
    }
}
