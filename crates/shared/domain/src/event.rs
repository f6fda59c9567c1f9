//! Domain events published when an account changes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::Account;

/// Kind of mutation an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Create,
    Update,
    Delete,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Create => "CREATE",
            ActionType::Update => "UPDATE",
            ActionType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of an account's public fields at mutation time.
///
/// Fields are private: an event can only be built from an [`Account`]
/// snapshot and never changes afterwards. Field names on the wire follow the
/// contract existing consumers already read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEvent {
    #[serde(rename = "userId")]
    account_id: Uuid,
    username: String,
    email: String,
    full_name: String,
    phone_number: Option<String>,
    #[serde(rename = "cpf")]
    national_id: Option<String>,
    image_url: Option<String>,
    #[serde(rename = "userStatus")]
    status: String,
    #[serde(rename = "userType")]
    account_type: String,
    action_type: ActionType,
    #[serde(rename = "lastUpdateDate")]
    last_update: DateTime<Utc>,
}

impl AccountEvent {
    /// Capture `account` as it is right now.
    pub fn snapshot(account: &Account, action_type: ActionType) -> Self {
        Self {
            account_id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            full_name: account.full_name.clone(),
            phone_number: account.phone_number.clone(),
            national_id: account.national_id.clone(),
            image_url: account.image_url.clone(),
            status: account.status.to_string(),
            account_type: account.account_type.to_string(),
            action_type,
            last_update: account.updated_at,
        }
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn national_id(&self) -> Option<&str> {
        self.national_id.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn account_type(&self) -> &str {
        &self.account_type
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    /// `updated_at` of the snapshot; with the id and action type it forms the
    /// key consumers deduplicate on.
    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    /// Check whether the event describes exactly this account state
    pub fn describes(&self, account: &Account) -> bool {
        *self == Self::snapshot(account, self.action_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{NewAccount, Role};

    fn account() -> Account {
        Account::register(
            NewAccount {
                username: "john".to_string(),
                email: "john@x.com".to_string(),
                full_name: "John Doe".to_string(),
                phone_number: Some("+55 11 99999-0000".to_string()),
                national_id: Some("123.456.789-00".to_string()),
                image_url: None,
            },
            Role::new(Uuid::new_v4(), "STUDENT"),
        )
    }

    #[test]
    fn test_snapshot_copies_public_fields() {
        let account = account();
        let event = AccountEvent::snapshot(&account, ActionType::Create);

        assert_eq!(event.account_id(), account.id);
        assert_eq!(event.username(), "john");
        assert_eq!(event.status(), "ACTIVE");
        assert_eq!(event.account_type(), "STUDENT");
        assert_eq!(event.action_type(), ActionType::Create);
        assert_eq!(event.last_update(), account.updated_at);
        assert!(event.describes(&account));
    }

    #[test]
    fn test_snapshot_does_not_follow_later_changes() {
        let mut account = account();
        let event = AccountEvent::snapshot(&account, ActionType::Update);
        account.full_name = "Johnny".to_string();

        assert_eq!(event.full_name(), "John Doe");
        assert!(!event.describes(&account));
    }

    #[test]
    fn test_wire_field_names() {
        let event = AccountEvent::snapshot(&account(), ActionType::Delete);
        let json = serde_json::to_value(&event).unwrap();

        assert!(json.get("userId").is_some());
        assert_eq!(json["userStatus"], "ACTIVE");
        assert_eq!(json["userType"], "STUDENT");
        assert_eq!(json["cpf"], "123.456.789-00");
        assert_eq!(json["fullName"], "John Doe");
        assert_eq!(json["actionType"], "DELETE");
        assert!(json.get("lastUpdateDate").is_some());
    }
}
