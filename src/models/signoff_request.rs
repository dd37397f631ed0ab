use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignoffRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl SignoffRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignoffRequestStatus::Pending => "pending",
            SignoffRequestStatus::Approved => "approved",
            SignoffRequestStatus::Rejected => "rejected",
        }
    }
}

/// Archived sign-off request. The project row carries the live status; these
/// rows keep the history of every request and its review.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SignoffRequest {
    pub id: Uuid,
    pub project_id: Uuid,
    pub requested_by: Option<Uuid>,
    pub requested_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
}
