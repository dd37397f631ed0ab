use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signoff::SignoffFlags;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub sign_off_requested: bool,
    pub sign_off_requested_by: Option<Uuid>,
    pub sign_off_requested_at: Option<DateTime<Utc>>,
    pub sign_off_notes: Option<String>,
    pub sign_off_reason: Option<String>,
    pub sign_off_approved: bool,
    pub sign_off_approved_by: Option<Uuid>,
    pub sign_off_approved_at: Option<DateTime<Utc>>,
    pub sign_off_approval_notes: Option<String>,
    pub data_protected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn signoff_flags(&self) -> SignoffFlags {
        SignoffFlags {
            requested: self.sign_off_requested,
            approved: self.sign_off_approved,
            protected: self.data_protected,
        }
    }
}
