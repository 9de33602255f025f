//! Status command implementation

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use crate::output::{self, SessionSummary};
use credkeeper::error::Result;

/// Show the restored session without contacting the service
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;
    let summary = SessionSummary::new(&ctx.session.snapshot(), &ctx.config, &ctx.config_path)?;
    output::print(&summary, ctx.format)
}
