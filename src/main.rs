//! credkeeper CLI - sign in once, call the API with a live session

use clap::{CommandFactory, Parser};
use log::LevelFilter;

mod cli;
mod output;

use cli::{Cli, Commands, GlobalOptions};
use credkeeper::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Warnings by default, `RUST_LOG` when set, everything from credkeeper with --debug
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_module("credkeeper", LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Login { user, password } => cli::login::run(&opts, user, password).await,
        Commands::Logout => cli::logout::run(&opts).await,
        Commands::Status => cli::status::run(&opts).await,
        Commands::Refresh => cli::refresh::run(&opts).await,
        Commands::Whoami => cli::whoami::run(&opts).await,
        Commands::Call {
            method,
            target,
            data,
            headers,
        } => cli::call::run(&opts, &method, &target, data.as_deref(), &headers).await,
        Commands::Version => {
            println!("credkeeper version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Completion { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "credkeeper",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}
