//! Account domain entity and related types.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_USERNAME_LENGTH, MIN_USERNAME_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Account status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Blocked,
}

impl AccountStatus {
    /// Wire and storage form of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Blocked => "BLOCKED",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(AccountStatus::Active),
            "BLOCKED" => Ok(AccountStatus::Blocked),
            other => Err(DomainError::validation(format!(
                "Unknown account status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Student,
    Instructor,
    Admin,
}

impl AccountType {
    /// Wire and storage form of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Student => "STUDENT",
            AccountType::Instructor => "INSTRUCTOR",
            AccountType::Admin => "ADMIN",
        }
    }
}

impl FromStr for AccountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(AccountType::Student),
            "INSTRUCTOR" => Ok(AccountType::Instructor),
            "ADMIN" => Ok(AccountType::Admin),
            other => Err(DomainError::validation(format!(
                "Unknown account type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named role an account may hold.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

impl Role {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Current time truncated to microseconds, the precision of a stored timestamp.
///
/// Timestamps handed out in responses and events must compare equal to
/// what a later read returns.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Account domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub national_id: Option<String>,
    pub image_url: Option<String>,
    pub status: AccountStatus,
    pub account_type: AccountType,
    pub roles: BTreeSet<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Build a freshly registered account: active, student type, holding `role`.
    pub fn register(new: NewAccount, role: Role) -> Self {
        let now = timestamp_now();
        let mut roles = BTreeSet::new();
        roles.insert(role);

        Self {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            full_name: new.full_name,
            phone_number: new.phone_number,
            national_id: new.national_id,
            image_url: new.image_url,
            status: AccountStatus::Active,
            account_type: AccountType::Student,
            roles,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the account holds a role with the given name
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    /// Check if account is blocked
    pub fn is_blocked(&self) -> bool {
        self.status == AccountStatus::Blocked
    }
}

/// Account registration data
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub national_id: Option<String>,
    pub image_url: Option<String>,
}

/// Sparse set of changes applied to an existing account.
///
/// Username and email are absent: they are immutable after registration.
/// For the optional contact fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub full_name: Option<String>,
    pub phone_number: Option<Option<String>>,
    pub national_id: Option<Option<String>>,
    pub image_url: Option<String>,
    pub status: Option<AccountStatus>,
    pub account_type: Option<AccountType>,
    /// Reject the update unless the stored `updated_at` still equals this value
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl AccountChanges {
    /// Check whether applying these changes would touch any field
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone_number.is_none()
            && self.national_id.is_none()
            && self.image_url.is_none()
            && self.status.is_none()
            && self.account_type.is_none()
    }

    /// Verify the optimistic precondition against the stored account
    pub fn check_precondition(&self, current: &Account) -> DomainResult<()> {
        match self.expected_updated_at {
            Some(expected) if expected != current.updated_at => {
                Err(DomainError::ConcurrentModification)
            }
            _ => Ok(()),
        }
    }

    /// Apply the populated fields and bump `updated_at`
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(full_name) = &self.full_name {
            account.full_name = full_name.clone();
        }
        if let Some(phone_number) = &self.phone_number {
            account.phone_number = phone_number.clone();
        }
        if let Some(national_id) = &self.national_id {
            account.national_id = national_id.clone();
        }
        if let Some(image_url) = &self.image_url {
            account.image_url = Some(image_url.clone());
        }
        if let Some(status) = self.status {
            account.status = status;
        }
        if let Some(account_type) = self.account_type {
            account.account_type = account_type;
        }
        account.updated_at = timestamp_now();
    }
}

/// Usernames must be non-blank and contain no whitespace.
pub fn validate_username(username: &str) -> DomainResult<()> {
    if username.trim().is_empty() {
        return Err(DomainError::validation("Username must not be blank"));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("Username must not contain spaces"));
    }
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(DomainError::validation(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    Ok(())
}
