//! Course records read from the course service, and course subscriptions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A course an account is enrolled in, as returned by the course service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub course_id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub course_status: Option<String>,
    #[serde(default)]
    pub course_level: Option<String>,
    #[serde(default)]
    pub user_instructor: Option<Uuid>,
}

/// An account's subscription to a course.
///
/// An account holds at most one subscription per course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub account_id: Uuid,
    pub course_id: Uuid,
}

impl Subscription {
    pub fn new(account_id: Uuid, course_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            course_id,
        }
    }
}
