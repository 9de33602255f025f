//! Command execution context
//!
//! Loads configuration, opens the session store and restores the session so
//! every command starts from the same state.

use std::path::PathBuf;
use std::sync::Arc;

use credkeeper::client::HttpAuthClient;
use credkeeper::config::Config;
use credkeeper::error::Result;
use credkeeper::executor::AuthorizedClient;
use credkeeper::session::{CredentialRenewer, SessionState};
use credkeeper::store;

use crate::cli::{GlobalOptions, OutputFormat};

/// Context for command execution containing config, session and runtime options
pub struct CommandContext {
    /// Loaded configuration with runtime overrides applied
    pub config: Config,
    /// Resolved config file location (may not exist)
    pub config_path: PathBuf,
    /// Bootstrapped session
    pub session: Arc<SessionState>,
    /// Renewer bound to `session`
    pub renewer: Arc<CredentialRenewer>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// Bootstrap only reads the local store, so building a context never
    /// touches the network.
    pub async fn new(opts: &GlobalOptions) -> Result<Self> {
        let config_path = Config::resolve_path(opts.config_ref())?;
        let config = Config::load_at(opts.config_ref())?.with_api_url(opts.api_url_ref());
        config.validate()?;

        let store = store::open(&config)?;
        let auth = Arc::new(HttpAuthClient::from_config(&config)?);
        let session = Arc::new(SessionState::new(store, auth));
        session.bootstrap().await;

        let renewer = Arc::new(CredentialRenewer::new(session.clone(), config.renewal));

        Ok(Self {
            config,
            config_path,
            session,
            renewer,
            format: opts.format,
        })
    }

    /// Authorized client sharing this context's session and renewer
    pub fn executor(&self) -> Result<AuthorizedClient> {
        AuthorizedClient::from_config(&self.config, self.session.clone(), self.renewer.clone())
    }
}
