//! Logout command implementation

use colored::Colorize;

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use credkeeper::error::Result;

/// Sign out. Always clears the local session, even when the service is unreachable.
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;

    let username = ctx.session.identity().map(|identity| identity.username);
    ctx.session.logout().await;

    match username {
        Some(name) => println!("{} Signed out {}", "✓".green(), name.bold()),
        None => println!("{} Not signed in; local session cleared", "○".dimmed()),
    }
    Ok(())
}
