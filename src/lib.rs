//! credkeeper - client-side session and credential lifecycle
//!
//! Keeps a signed-in session alive across process restarts and attaches its
//! access credential to outbound calls. A rejected call triggers at most one
//! renewal and one retry.
//!
//! The pieces, bottom up:
//! - [`store`]: durable key/value slots for the identity and both credentials
//! - [`client`]: the authentication service (sign-in, sign-out, renewal)
//! - [`session`]: in-memory session, bootstrap and the credential renewer
//! - [`executor`]: authorized request execution with renew-and-retry

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod session;
pub mod store;

pub use client::{AuthApi, HttpAuthClient, Identity, Role};
pub use config::Config;
pub use error::{ApiError, Error, Result};
pub use executor::{AuthorizedClient, RequestOptions};
pub use session::{CredentialRenewer, RenewalPolicy, Session, SessionState};
pub use store::{CredentialStore, Slot, StoreBackend};
