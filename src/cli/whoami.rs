//! Whoami command implementation

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use crate::output;
use credkeeper::client::ProfileResponse;
use credkeeper::error::Result;

/// Fetch the profile of the signed-in user through the authorized client
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;
    let client = ctx.executor()?;

    let profile: ProfileResponse = client
        .get_json(&ctx.config.auth_endpoint("profile"))
        .await?;

    output::print(&profile.user, ctx.format)
}
