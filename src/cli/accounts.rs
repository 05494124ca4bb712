//! CLI handlers for linked accounts, including QR-code linking.

use std::sync::Arc;

use crate::accounts::{AccountDetail, AccountSettings, Accounts};
use crate::config::ConsoleConfig;
use crate::http::ApiClient;
use crate::qr_login::{
    HttpQrLoginBackend, LoginError, LoginEvent, LoginEventSink, LoginState, QrLoginController,
};

use super::auth::connect;
use super::{AccountCommands, UpdateArgs};

/// Dispatch an `accounts` subcommand.
pub async fn handle(
    config: &ConsoleConfig,
    command: AccountCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = connect(config)?;
    if !client.auth().is_logged_in() {
        return Err("not logged in; run `xianyu-admin login` first".into());
    }
    let accounts = Accounts::new(client.clone());

    match command {
        AccountCommands::List => print_accounts(&accounts.list().await?),
        AccountCommands::Add => link_account(config, client, &accounts).await?,
        AccountCommands::Enable(args) => {
            accounts.set_enabled(&args.id, true).await?;
            println!("✅ Account {} enabled", args.id);
        }
        AccountCommands::Disable(args) => {
            accounts.set_enabled(&args.id, false).await?;
            println!("⏸️  Account {} paused", args.id);
        }
        AccountCommands::Delete(args) => {
            accounts.delete(&args.id).await?;
            println!("🗑️  Account {} deleted", args.id);
        }
        AccountCommands::Update(args) => update_account(&accounts, args).await?,
    }
    Ok(())
}

async fn update_account(
    accounts: &Accounts,
    args: UpdateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if !args.has_changes() {
        return Err("nothing to update; pass --remark, --auto-confirm or --pause-duration".into());
    }
    let current = accounts
        .list()
        .await?
        .into_iter()
        .find(|a| a.id == args.id)
        .ok_or_else(|| format!("no account with id {}", args.id))?;
    let settings = merge_settings(&current, &args);
    accounts.update(&args.id, &settings).await?;
    println!("✅ Account {} updated", args.id);
    Ok(())
}

fn merge_settings(current: &AccountDetail, args: &UpdateArgs) -> AccountSettings {
    let mut settings = AccountSettings::from(current);
    if let Some(remark) = &args.remark {
        settings.remark = remark.clone();
    }
    if let Some(auto_confirm) = args.auto_confirm {
        settings.auto_confirm = auto_confirm;
    }
    if let Some(pause) = args.pause_duration {
        settings.pause_duration = pause;
    }
    settings
}

async fn link_account(
    config: &ConsoleConfig,
    client: ApiClient,
    accounts: &Accounts,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(HttpQrLoginBackend::new(client, &config.qr_login));
    let controller = QrLoginController::new(backend, config.qr_login.clone());

    let sink: LoginEventSink = Arc::new(|event: LoginEvent| match event.state {
        LoginState::Pending => println!("⏳ Requesting QR code..."),
        LoginState::Waiting => {
            if let Some(url) = &event.code_reference {
                println!("📱 Scan with the Xianyu app: {url}");
            }
            println!("⏳ Waiting for confirmation (Ctrl-C to cancel)...");
        }
        LoginState::Success => println!("✅ Account linked"),
        LoginState::Expired | LoginState::Error => {}
    });

    let handle = controller.start(Some(sink));
    let canceller = handle.canceller();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });
    let outcome = handle.wait().await;
    interrupt.abort();

    match outcome.into_result() {
        Ok(_) => {
            println!();
            print_accounts(&accounts.list().await?);
            Ok(())
        }
        Err(LoginError::Cancelled) => {
            println!("Cancelled.");
            Ok(())
        }
        Err(err) => Err(failure_message(&err).into()),
    }
}

/// The one line `main` prints when linking fails.
fn failure_message(err: &LoginError) -> String {
    if err.is_retryable() {
        format!("{err}. Run `xianyu-admin accounts add` to try again.")
    } else {
        err.to_string()
    }
}

fn print_accounts(accounts: &[AccountDetail]) {
    if accounts.is_empty() {
        println!("No accounts linked yet. Run `xianyu-admin accounts add`.");
        return;
    }
    println!("{:<24} {:<20} {:<8} {:<6} {:>6}  REMARK", "ID", "NICKNAME", "STATUS", "AUTO", "PAUSE");
    for account in accounts {
        println!(
            "{:<24} {:<20} {:<8} {:<6} {:>6}  {}",
            account.id,
            account.display_name(),
            if account.enabled { "active" } else { "paused" },
            if account.auto_confirm { "yes" } else { "no" },
            format!("{}m", account.pause_duration),
            account.remark.as_deref().unwrap_or(""),
        );
    }
}
