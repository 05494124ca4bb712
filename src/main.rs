//! xianyu-admin CLI binary entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xianyu_admin::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.console_config() {
        Ok(config) => match cli.command {
            Commands::Login(args) => xianyu_admin::cli::auth::handle_login(&config, args).await,
            Commands::Logout => xianyu_admin::cli::auth::handle_logout(&config).await,
            Commands::Status => xianyu_admin::cli::auth::handle_status(&config).await,
            Commands::Accounts(args) => {
                xianyu_admin::cli::accounts::handle(&config, args.command).await
            }
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
