//! SeaORM entities backing the account store.

pub mod account;
pub mod account_course;
pub mod account_role;
pub mod role;
