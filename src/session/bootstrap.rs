//! Restoring the session from the durable store at process start

use std::sync::atomic::Ordering;

use super::SessionState;
use crate::client::Identity;
use crate::error::StoreError;
use crate::store::Slot;

impl SessionState {
    /// Load persisted state and mark the session ready.
    ///
    /// An unreadable store or a stored identity that does not parse clears
    /// everything, so a corrupt partial session is never restored. Readiness
    /// is set whatever the outcome. Runs at most once; later calls wait for the first to finish.
    pub async fn bootstrap(&self) {
        if self.bootstrap_started.swap(true, Ordering::SeqCst) {
            self.wait_ready().await;
            return;
        }

        let mut corrupt = false;
        let mut load = |slot: Slot| match self.store.read(slot) {
            Ok(value) => value,
            Err(StoreError::Corrupt(e)) => {
                log::warn!("Stored {} is unreadable: {}", slot, e);
                corrupt = true;
                None
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", slot, e);
                None
            }
        };
        let stored_identity = load(Slot::Identity);
        let access = load(Slot::Access);
        let renewal = load(Slot::Renewal);

        if corrupt {
            log::warn!("Session store is corrupt, clearing session");
            self.logout().await;
        } else if let Some(raw) = stored_identity {
            match serde_json::from_str::<Identity>(&raw) {
                Ok(identity) => match access {
                    Some(access) => {
                        log::info!("Restored session for {}", identity.username);
                        self.state.send_modify(|session| {
                            session.identity = Some(identity);
                            session.access = Some(access);
                            session.renewal = renewal;
                        });
                    }
                    None => log::debug!("Stored identity has no access credential, not restoring"),
                },
                Err(e) => {
                    log::warn!("Stored identity is malformed, clearing session: {}", e);
                    self.logout().await;
                }
            }
        } else {
            log::debug!("No stored session");
        }

        self.state.send_modify(|session| session.ready = true);
    }
}
