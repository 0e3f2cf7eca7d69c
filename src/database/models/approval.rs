use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum ApprovalAction {
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Decision {
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl From<Decision> for ApprovalAction {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => ApprovalAction::Approved,
            Decision::Rejected => ApprovalAction::Rejected,
        }
    }
}

/// Audit row written atomically with every approve/reject transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    pub id: Uuid,
    pub timesheet_id: Uuid,
    pub action: ApprovalAction,
    pub acting_identity: Uuid,
    pub acting_name: String,
    pub acting_on_behalf_of: Option<Uuid>,
    pub comments: Option<String>,
    pub version: i32,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
}

/// One privileged commit made through the admin overlay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminEditRecord {
    pub id: Uuid,
    pub timesheet_id: Uuid,
    pub edited_by: Uuid,
    pub edit_reason: String,
    pub edited_at: DateTime<Utc>,
    pub changed_dates: Vec<NaiveDate>,
}
