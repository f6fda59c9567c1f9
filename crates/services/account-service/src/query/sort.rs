//! Sortable account fields.

use std::cmp::Ordering;

use common::{AppError, AppResult};
use domain::{Account, Sort, SortDirection};

/// Account field a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Username,
    Email,
    FullName,
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    /// Resolve a client-facing field name. `userId` is accepted as an alias of `id`.
    pub fn parse(field: &str) -> AppResult<Self> {
        match field {
            "id" | "userId" => Ok(SortKey::Id),
            "username" => Ok(SortKey::Username),
            "email" => Ok(SortKey::Email),
            "fullName" => Ok(SortKey::FullName),
            "createdAt" => Ok(SortKey::CreatedAt),
            "updatedAt" => Ok(SortKey::UpdatedAt),
            other => Err(AppError::validation(format!(
                "Cannot sort by unknown field '{}'",
                other
            ))),
        }
    }

    /// Compare two accounts on this key only.
    pub fn compare(&self, a: &Account, b: &Account) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Username => a.username.cmp(&b.username),
            SortKey::Email => a.email.cmp(&b.email),
            SortKey::FullName => a.full_name.cmp(&b.full_name),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

/// Resolved sort: key plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl AccountOrder {
    pub fn resolve(sort: Option<&Sort>) -> AppResult<Self> {
        match sort {
            Some(sort) => Ok(Self {
                key: SortKey::parse(&sort.field)?,
                direction: sort.direction,
            }),
            None => Ok(Self::default()),
        }
    }

    /// Total order: the chosen key, then id as a tie-breaker.
    pub fn compare(&self, a: &Account, b: &Account) -> Ordering {
        let primary = match self.direction {
            SortDirection::Asc => self.key.compare(a, b),
            SortDirection::Desc => self.key.compare(b, a),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl Default for AccountOrder {
    fn default() -> Self {
        Self {
            key: SortKey::Id,
            direction: SortDirection::Asc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_fields() {
        assert_eq!(SortKey::parse("userId").unwrap(), SortKey::Id);
        assert_eq!(SortKey::parse("createdAt").unwrap(), SortKey::CreatedAt);
        assert!(SortKey::parse("password").is_err());
    }

    #[test]
    fn test_resolve_defaults_to_id_ascending() {
        assert_eq!(AccountOrder::resolve(None).unwrap(), AccountOrder::default());

        let sort = Sort::parse("username,desc").unwrap();
        let order = AccountOrder::resolve(Some(&sort)).unwrap();
        assert_eq!(order.key, SortKey::Username);
        assert_eq!(order.direction, SortDirection::Desc);
    }
}
