//! CLI handlers for console login, logout, and status.

use std::io::Write;

use crate::auth::{AdminSession, AuthState};
use crate::config::ConsoleConfig;
use crate::http::ApiClient;

use super::LoginArgs;

pub(crate) fn connect(config: &ConsoleConfig) -> Result<ApiClient, Box<dyn std::error::Error>> {
    Ok(ApiClient::new(config, config.auth_context()?)?)
}

/// Handle `xianyu-admin login`.
pub async fn handle_login(
    config: &ConsoleConfig,
    args: LoginArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match args.password {
        Some(password) => password,
        None => prompt_password()?,
    };
    let session = AdminSession::new(connect(config)?);
    session.login(&args.username, &password).await?;
    println!("✅ Logged in to {} as {}", config.base_url, args.username);
    Ok(())
}

fn prompt_password() -> Result<String, Box<dyn std::error::Error>> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err("no password provided".into());
    }
    Ok(password)
}

/// Handle `xianyu-admin logout`.
pub async fn handle_logout(config: &ConsoleConfig) -> Result<(), Box<dyn std::error::Error>> {
    AdminSession::new(connect(config)?).logout();
    println!("✅ Logged out");
    Ok(())
}

/// Handle `xianyu-admin status`.
pub async fn handle_status(config: &ConsoleConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = connect(config)?;
    println!("🔐 Console Status\n");
    println!("  Backend: {}", config.base_url);
    println!("  Profile: {}", config.profile);

    let who = client
        .auth()
        .credentials()
        .and_then(|c| c.username)
        .unwrap_or_else(|| "token".to_string());
    if client.auth().state() == AuthState::LoggedOut {
        println!("  Session: ❌ Not logged in");
        return Ok(());
    }

    match AdminSession::new(client).verify().await {
        Ok(true) => println!("  Session: ✅ Logged in ({who})"),
        Ok(false) => println!("  Session: ⚠️  Credential rejected; log in again"),
        Err(e) => println!("  Session: ⚠️  Could not verify: {e}"),
    }
    Ok(())
}
