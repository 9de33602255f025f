//! Login command implementation

use std::time::Duration;

use colored::Colorize;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::output::json::format_json;
use credkeeper::error::Result;

/// Sign in with a username or email and password.
///
/// Missing values are prompted for interactively.
pub async fn run(
    opts: &GlobalOptions,
    user: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;

    let login = match user {
        Some(user) => user,
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Username or email")
            .interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .interact()?,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Signing in...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = ctx.session.sign_in(&login, &password).await;
    spinner.finish_and_clear();
    let identity = result?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&identity)?),
        OutputFormat::Pretty | OutputFormat::Table => {
            println!(
                "{} Signed in as {} ({})",
                "✓".green(),
                identity.username.bold(),
                identity.role
            );
            if ctx.session.renewal().is_none() {
                println!(
                    "{} No renewal credential issued; the session ends when access expires",
                    "⚠".yellow()
                );
            }
        }
    }

    Ok(())
}
