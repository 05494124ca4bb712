//! Linked marketplace accounts.

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, Result};
use crate::http::{is_path_segment, ApiClient};

const DETAILS_PATH: &str = "/api/accounts/details";
const COOKIES_PATH: &str = "/api/cookies";

/// A marketplace account linked to the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetail {
    pub id: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub auto_confirm: bool,
    /// Minutes the auto-reply pauses after a manual reply.
    #[serde(default)]
    pub pause_duration: u32,
}

impl AccountDetail {
    /// Nickname if set, else the id.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Editable per-account settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub remark: String,
    pub auto_confirm: bool,
    pub pause_duration: u32,
}

impl From<&AccountDetail> for AccountSettings {
    fn from(account: &AccountDetail) -> Self {
        Self {
            remark: account.remark.clone().unwrap_or_default(),
            auto_confirm: account.auto_confirm,
            pause_duration: account.pause_duration,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Ack {
    success: Option<bool>,
    message: Option<String>,
}

impl Ack {
    fn into_result(self, action: &str) -> Result<()> {
        match self.success {
            Some(false) => Err(ConsoleError::api(
                200,
                self.message
                    .unwrap_or_else(|| format!("backend refused to {action}")),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusUpdate {
    enabled: bool,
}

/// Account operations over the console API.
#[derive(Debug, Clone)]
pub struct Accounts {
    client: ApiClient,
}

impl Accounts {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<AccountDetail>> {
        let accounts: Vec<AccountDetail> = self.client.get(DETAILS_PATH).await?;
        tracing::debug!(count = accounts.len(), "loaded account details");
        Ok(accounts)
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        let path = format!("{}/status", account_path(id)?);
        let ack: Option<Ack> = self.client.put(&path, &StatusUpdate { enabled }).await?;
        ack.unwrap_or_default().into_result("update account status")
    }

    pub async fn update(&self, id: &str, settings: &AccountSettings) -> Result<()> {
        let path = account_path(id)?;
        let ack: Option<Ack> = self.client.put(&path, settings).await?;
        ack.unwrap_or_default().into_result("update account")
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = account_path(id)?;
        let ack: Option<Ack> = self.client.delete(&path).await?;
        ack.unwrap_or_default().into_result("delete account")
    }
}

fn account_path(id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ConsoleError::InvalidArgument(
            "account id must not be empty".to_string(),
        ));
    }
    if !is_path_segment(id) {
        return Err(ConsoleError::InvalidArgument(format!(
            "account id contains reserved characters: {id}"
        )));
    }
    Ok(format!("{COOKIES_PATH}/{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn account_detail_tolerates_missing_optional_fields() {
        let account: AccountDetail = serde_json::from_value(json!({ "id": "acc-1" })).unwrap();
        assert_eq!(account.id, "acc-1");
        assert!(!account.enabled);
        assert_eq!(account.pause_duration, 0);
        assert_eq!(account.display_name(), "acc-1");
    }

    #[test]
    fn display_name_prefers_nickname() {
        let account: AccountDetail =
            serde_json::from_value(json!({ "id": "acc-1", "nickname": "shop" })).unwrap();
        assert_eq!(account.display_name(), "shop");
    }

    #[test]
    fn settings_copy_from_account() {
        let account: AccountDetail = serde_json::from_value(json!({
            "id": "acc-1",
            "remark": "main",
            "auto_confirm": true,
            "pause_duration": 15
        }))
        .unwrap();
        let settings = AccountSettings::from(&account);
        assert_eq!(settings.remark, "main");
        assert!(settings.auto_confirm);
        assert_eq!(settings.pause_duration, 15);
    }

    #[test]
    fn account_path_rejects_empty_and_reserved_ids() {
        assert_eq!(account_path(" abc ").unwrap(), "/api/cookies/abc");
        assert!(matches!(account_path(""), Err(ConsoleError::InvalidArgument(_))));
        assert!(matches!(account_path("a/b"), Err(ConsoleError::InvalidArgument(_))));
        assert!(matches!(account_path(".."), Err(ConsoleError::InvalidArgument(_))));
    }

    #[test]
    fn negative_ack_becomes_error() {
        let ack = Ack {
            success: Some(false),
            message: Some("locked".to_string()),
        };
        assert!(matches!(ack.into_result("delete account"), Err(ConsoleError::Api { message, .. }) if message == "locked"));
        assert!(Ack::default().into_result("x").is_ok());
    }
}
