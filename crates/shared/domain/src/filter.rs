//! Filter fields accepted by the account listing.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::account::{AccountStatus, AccountType};

/// Sparse bag of optional filter fields.
///
/// Every `None` means "no constraint on this field".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterSpec {
    /// Account must hold a role with this name
    pub role: Option<String>,
    pub account_type: Option<AccountType>,
    pub status: Option<AccountStatus>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub created_to: Option<DateTime<Utc>>,
    /// Case-insensitive fragment of username or email
    pub text: Option<String>,
}

impl FilterSpec {
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn created_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}
