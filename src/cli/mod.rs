//! CLI command definitions and handlers

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod call;
pub mod context;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod status;
pub mod whoami;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// credkeeper - keep a web application session signed in from the terminal
#[derive(Parser, Debug)]
#[command(name = "credkeeper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "CREDKEEPER_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "CREDKEEPER_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true, env = "CREDKEEPER_API_URL", hide_env = true)]
    pub api_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "CREDKEEPER_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and persist the session
    Login {
        /// Username or email (prompted when omitted)
        #[arg(long, short)]
        user: Option<String>,

        /// Password (prompted when omitted)
        #[arg(long, env = "CREDKEEPER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show the current session and configuration
    Status,

    /// Renew the access credential now
    Refresh,

    /// Fetch the signed-in user's profile from the service
    Whoami,

    /// Send an authorized request to the API
    #[command(after_help = "\
Examples:
  credkeeper call GET /api/words
  credkeeper call POST /api/videos --data '{\"title\": \"clip\"}'
  credkeeper call GET /api/admin/users --header 'X-Trace: 1'")]
    Call {
        /// HTTP method
        method: String,

        /// Path below the API URL, or an absolute URL
        target: String,

        /// JSON request body
        #[arg(long, short)]
        data: Option<String>,

        /// Extra header as `Name: value` (repeatable)
        #[arg(long = "header", short = 'H')]
        headers: Vec<String>,
    },

    /// Display version information
    Version,

    /// Generate shell completions
    #[command(after_help = "\
Installation:
  bash:   credkeeper completion bash > /etc/bash_completion.d/credkeeper
  zsh:    credkeeper completion zsh > \"${fpath[1]}/_credkeeper\"
  fish:   credkeeper completion fish > ~/.config/fish/completions/credkeeper.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
