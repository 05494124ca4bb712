//! CLI entry point for the admin console.

pub mod accounts;
pub mod auth;

use clap::{Args, Parser, Subcommand};

use crate::config::ConsoleConfig;
use crate::error::Result;

/// Xianyu auto-dispatch admin console
#[derive(Parser, Debug)]
#[command(name = "xianyu-admin", version, about = "Admin console for Xianyu auto-dispatch")]
pub struct Cli {
    /// Backend base URL (overrides XIANYU_ADMIN_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Credential profile name
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to the admin console
    Login(LoginArgs),
    /// Forget the stored console credential
    Logout,
    /// Show connection and login status
    Status,
    /// Manage linked marketplace accounts
    Accounts(AccountsArgs),
}

/// Arguments for `xianyu-admin login`.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Admin username
    #[arg(short, long)]
    pub username: String,

    /// Admin password (prompted for when omitted)
    #[arg(short, long, env = "XIANYU_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for the `accounts` subcommand group.
#[derive(Args, Debug)]
pub struct AccountsArgs {
    #[command(subcommand)]
    pub command: AccountCommands,
}

/// Account subcommands.
#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// List linked accounts
    List,
    /// Link a new account by scanning a QR code
    Add,
    /// Resume automation for an account
    Enable(AccountIdArgs),
    /// Pause automation for an account
    Disable(AccountIdArgs),
    /// Remove an account
    Delete(AccountIdArgs),
    /// Edit account settings
    Update(UpdateArgs),
}

#[derive(Args, Debug)]
pub struct AccountIdArgs {
    /// Account id
    pub id: String,
}

/// Arguments for `accounts update`; omitted fields keep their current value.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Account id
    pub id: String,

    #[arg(long)]
    pub remark: Option<String>,

    #[arg(long)]
    pub auto_confirm: Option<bool>,

    /// Minutes to pause auto-reply after a manual reply
    #[arg(long)]
    pub pause_duration: Option<u32>,
}

impl UpdateArgs {
    pub fn has_changes(&self) -> bool {
        self.remark.is_some() || self.auto_confirm.is_some() || self.pause_duration.is_some()
    }
}

impl Cli {
    /// Resolve the console config from the environment plus global flags.
    pub fn console_config(&self) -> Result<ConsoleConfig> {
        let mut config = ConsoleConfig::from_env()?;
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(profile) = &self.profile {
            config.profile = profile.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_login_with_username() {
        let cli = Cli::try_parse_from(["xianyu-admin", "login", "-u", "admin", "-p", "pw"]).unwrap();
        match cli.command {
            Commands::Login(args) => {
                assert_eq!(args.username, "admin");
                assert_eq!(args.password.as_deref(), Some("pw"));
            }
            other => panic!("expected Login, got {other:?}"),
        }
    }

    #[test]
    fn parse_accounts_add() {
        let cli = Cli::try_parse_from(["xianyu-admin", "accounts", "add"]).unwrap();
        match cli.command {
            Commands::Accounts(args) => assert!(matches!(args.command, AccountCommands::Add)),
            other => panic!("expected Accounts, got {other:?}"),
        }
    }

    #[test]
    fn parse_accounts_update_with_partial_fields() {
        let cli = Cli::try_parse_from([
            "xianyu-admin",
            "accounts",
            "update",
            "acc-1",
            "--auto-confirm",
            "true",
        ])
        .unwrap();
        match cli.command {
            Commands::Accounts(AccountsArgs {
                command: AccountCommands::Update(args),
            }) => {
                assert_eq!(args.id, "acc-1");
                assert_eq!(args.auto_confirm, Some(true));
                assert!(args.remark.is_none());
                assert!(args.has_changes());
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn global_url_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["xianyu-admin", "status", "--url", "http://10.0.0.2:8080"])
            .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://10.0.0.2:8080"));
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["xianyu-admin"]).is_err());
    }

    #[test]
    fn parse_enable_missing_id_is_error() {
        assert!(Cli::try_parse_from(["xianyu-admin", "accounts", "enable"]).is_err());
    }
}
