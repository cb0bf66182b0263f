//! # Domain Services
//!
//! Pure business rules that don't belong to a single entity.
//!
//! - **progress**: Enrollment percentage from completed lesson counts
//! - **publishing**: Requirements a course must meet before it is published

mod progress;
mod publishing;

pub use progress::progress_percent;
pub use publishing::{check_publishable, PublishBlocker};
