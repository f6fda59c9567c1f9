//! Predicate composition over a typed filter bag.
//!
//! [`build`] turns a [`FilterSpec`] into a single [`Predicate`]: every
//! populated field contributes exactly one constraint and the constraints
//! are AND-ed. An empty filter yields [`Predicate::Always`].
//!
//! The predicate is a plain value. [`Predicate::matches`] evaluates it
//! against an in-memory [`Account`]; the SQL store translates the same tree
//! into a SeaORM condition.

use chrono::{DateTime, Utc};

use domain::{Account, AccountStatus, AccountType, FilterSpec};

/// Composed boolean condition over an account's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every account
    Always,
    TypeIs(AccountType),
    StatusIs(AccountStatus),
    /// Role set contains a role with this exact name
    HasRole(String),
    /// `created_at` within the inclusive bounds; a missing bound is open
    CreatedWithin {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    /// Lowercased fragment found in username or email
    TextContains(String),
    /// Conjunction of all parts
    All(Vec<Predicate>),
}

/// Compose the predicate for `filter`.
pub fn build(filter: &FilterSpec) -> Predicate {
    let mut constraints = Vec::new();

    if let Some(role) = non_blank(filter.role.as_deref()) {
        constraints.push(Predicate::HasRole(role.to_string()));
    }
    if let Some(account_type) = filter.account_type {
        constraints.push(Predicate::TypeIs(account_type));
    }
    if let Some(status) = filter.status {
        constraints.push(Predicate::StatusIs(status));
    }
    if filter.created_from.is_some() || filter.created_to.is_some() {
        constraints.push(Predicate::CreatedWithin {
            from: filter.created_from,
            to: filter.created_to,
        });
    }
    if let Some(text) = non_blank(filter.text.as_deref()) {
        constraints.push(Predicate::TextContains(text.to_lowercase()));
    }

    constraints
        .into_iter()
        .fold(Predicate::Always, Predicate::and)
}

impl From<&FilterSpec> for Predicate {
    fn from(filter: &FilterSpec) -> Self {
        build(filter)
    }
}

impl Predicate {
    /// Logical AND, flattening nested conjunctions and dropping `Always`.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Always, p) | (p, Predicate::Always) => p,
            (Predicate::All(mut left), Predicate::All(right)) => {
                left.extend(right);
                Predicate::All(left)
            }
            (Predicate::All(mut parts), p) => {
                parts.push(p);
                Predicate::All(parts)
            }
            (p, Predicate::All(mut parts)) => {
                parts.insert(0, p);
                Predicate::All(parts)
            }
            (left, right) => Predicate::All(vec![left, right]),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    /// Evaluate against an account.
    pub fn matches(&self, account: &Account) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::TypeIs(account_type) => account.account_type == *account_type,
            Predicate::StatusIs(status) => account.status == *status,
            Predicate::HasRole(name) => account.has_role(name),
            Predicate::CreatedWithin { from, to } => {
                from.map_or(true, |from| account.created_at >= from)
                    && to.map_or(true, |to| account.created_at <= to)
            }
            Predicate::TextContains(fragment) => {
                account.username.to_lowercase().contains(fragment.as_str())
                    || account.email.to_lowercase().contains(fragment.as_str())
            }
            Predicate::All(parts) => parts.iter().all(|p| p.matches(account)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use domain::{NewAccount, Role, ROLE_ADMIN, ROLE_STUDENT};
    use uuid::Uuid;

    fn account(username: &str, email: &str, account_type: AccountType, roles: &[&str]) -> Account {
        let mut account = Account::register(
            NewAccount {
                username: username.to_string(),
                email: email.to_string(),
                full_name: username.to_string(),
                phone_number: None,
                national_id: None,
                image_url: None,
            },
            Role::new(Uuid::new_v4(), ROLE_STUDENT),
        );
        account.account_type = account_type;
        account.roles = roles
            .iter()
            .map(|name| Role::new(Uuid::new_v4(), *name))
            .collect();
        account
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let predicate = build(&FilterSpec::default());

        assert!(predicate.is_always());
        assert!(predicate.matches(&account("ann", "ann@x.com", AccountType::Admin, &[])));
        assert!(predicate.matches(&account("bob", "bob@x.com", AccountType::Student, &[ROLE_STUDENT])));
    }

    #[test]
    fn test_type_and_role_are_conjoined() {
        let predicate = build(&FilterSpec::default().with_type(AccountType::Student).with_role(ROLE_ADMIN));

        let student_admin = account("sam", "sam@x.com", AccountType::Student, &[ROLE_STUDENT, ROLE_ADMIN]);
        let student_only = account("sue", "sue@x.com", AccountType::Student, &[ROLE_STUDENT]);
        let admin_type = account("amy", "amy@x.com", AccountType::Admin, &[ROLE_ADMIN]);

        assert!(predicate.matches(&student_admin));
        assert!(!predicate.matches(&student_only));
        assert!(!predicate.matches(&admin_type));
    }

    #[test]
    fn test_role_is_set_membership() {
        let predicate = build(&FilterSpec::default().with_role(ROLE_ADMIN));
        let many_roles = account("max", "max@x.com", AccountType::Instructor, &["INSTRUCTOR", ROLE_ADMIN]);

        assert!(predicate.matches(&many_roles));
    }

    #[test]
    fn test_text_matches_username_or_email_case_insensitively() {
        let predicate = build(&FilterSpec::default().with_text("jo"));

        let by_email = account("jdoe", "john@x.com", AccountType::Student, &[]);
        let by_username = account("Joanna", "anna@y.com", AccountType::Student, &[]);
        let neither = account("mike", "mike@x.com", AccountType::Student, &[]);

        assert!(predicate.matches(&by_email));
        assert!(predicate.matches(&by_username));
        assert!(!predicate.matches(&neither));
    }

    #[test]
    fn test_blank_text_is_no_constraint() {
        assert!(build(&FilterSpec::default().with_text("   ")).is_always());
        assert!(build(&FilterSpec::default().with_role("")).is_always());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut acc = account("dana", "dana@x.com", AccountType::Student, &[]);
        acc.created_at = created;

        let exact = build(&FilterSpec::default().created_between(Some(created), Some(created)));
        let open_lower = build(&FilterSpec::default().created_between(None, Some(created)));
        let open_upper = build(&FilterSpec::default().created_between(Some(created), None));
        let after = build(&FilterSpec::default().created_between(Some(created + Duration::seconds(1)), None));

        assert!(exact.matches(&acc));
        assert!(open_lower.matches(&acc));
        assert!(open_upper.matches(&acc));
        assert!(!after.matches(&acc));
    }

    #[test]
    fn test_each_field_contributes_one_constraint() {
        let filter = FilterSpec::default()
            .with_role(ROLE_STUDENT)
            .with_type(AccountType::Student)
            .with_status(AccountStatus::Active)
            .created_between(Some(Utc::now()), None)
            .with_text("Jo");

        match build(&filter) {
            Predicate::All(parts) => {
                assert_eq!(parts.len(), 5);
                assert!(parts.contains(&Predicate::TextContains("jo".to_string())));
            }
            other => panic!("expected conjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_single_field_is_not_wrapped() {
        assert_eq!(
            build(&FilterSpec::default().with_status(AccountStatus::Blocked)),
            Predicate::StatusIs(AccountStatus::Blocked)
        );
    }

    #[test]
    fn test_and_flattens() {
        let combined = Predicate::All(vec![Predicate::StatusIs(AccountStatus::Active)])
            .and(Predicate::All(vec![Predicate::TypeIs(AccountType::Admin)]))
            .and(Predicate::Always);

        assert_eq!(
            combined,
            Predicate::All(vec![
                Predicate::StatusIs(AccountStatus::Active),
                Predicate::TypeIs(AccountType::Admin),
            ])
        );
    }
}
