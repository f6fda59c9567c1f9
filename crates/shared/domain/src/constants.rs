//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Roles
// =============================================================================

/// Role granted to every self-registered account
pub const ROLE_STUDENT: &str = "STUDENT";

/// Role for accounts that teach courses
pub const ROLE_INSTRUCTOR: &str = "INSTRUCTOR";

/// Administrator role
pub const ROLE_ADMIN: &str = "ADMIN";

/// All seeded role names
pub const VALID_ROLES: &[&str] = &[ROLE_STUDENT, ROLE_INSTRUCTOR, ROLE_ADMIN];

// =============================================================================
// Validation
// =============================================================================

/// Minimum username length
pub const MIN_USERNAME_LENGTH: usize = 4;

/// Maximum username length
pub const MAX_USERNAME_LENGTH: usize = 50;

// =============================================================================
// Pagination
// =============================================================================

/// First page index (pages are zero-based)
pub const DEFAULT_PAGE_NUMBER: u64 = 0;

/// Page size used when the caller gives none
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Upper bound on page size
pub const MAX_PAGE_SIZE: u64 = 100;

/// Default sort key for account listings
pub const DEFAULT_ACCOUNT_SORT_FIELD: &str = "id";

/// Default sort key for course listings fetched from the course service
pub const DEFAULT_COURSE_SORT_FIELD: &str = "courseId";
