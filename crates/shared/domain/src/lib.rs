//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Accounts, their roles, the events emitted when they change and the
//! value types used for filtered, paginated listing live here.

pub mod account;
pub mod constants;
pub mod course;
pub mod error;
pub mod event;
pub mod filter;
pub mod page;

pub use account::{
    timestamp_now, validate_username, Account, AccountChanges, AccountStatus, AccountType,
    NewAccount, Role,
};
pub use constants::*;
pub use course::{CourseRecord, Subscription};
pub use error::{DomainError, DomainResult};
pub use event::{AccountEvent, ActionType};
pub use filter::FilterSpec;
pub use page::{Page, PageRequest, Sort, SortDirection};
