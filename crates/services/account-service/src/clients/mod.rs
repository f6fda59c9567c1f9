//! Clients for downstream services.

mod course_client;

pub use course_client::{CourseClient, DownstreamError, ResilientCourseClient};
