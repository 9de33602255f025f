//! Refresh command implementation

use colored::Colorize;

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use credkeeper::error::{ApiError, Result};
use credkeeper::session::fingerprint;

/// Renew the access credential immediately
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;

    if ctx.session.renewal().is_none() {
        return Err(ApiError::NoCredential.into());
    }

    match ctx.renewer.renew().await {
        Some(access) => {
            println!(
                "{} Access credential renewed ({})",
                "✓".green(),
                fingerprint(&access).dimmed()
            );
            Ok(())
        }
        None => Err(ApiError::Unauthorized(
            "renewal was refused and the session has been signed out".to_string(),
        )
        .into()),
    }
}
