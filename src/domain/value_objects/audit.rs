//! Audit trail carried by every soft-deletable entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Who created/last touched a row and when.
///
/// Soft-deleted rows never reach the domain, so `is_deleted` stays in SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditInfo {
    pub created_by: Option<Uuid>,
    pub created_on: DateTime<Utc>,
    pub last_modified_by: Option<Uuid>,
    pub last_modified_on: DateTime<Utc>,
}

impl AuditInfo {
    pub fn new(actor: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            created_by: actor,
            created_on: now,
            last_modified_by: actor,
            last_modified_on: now,
        }
    }
}

impl Default for AuditInfo {
    fn default() -> Self {
        Self::new(None)
    }
}
