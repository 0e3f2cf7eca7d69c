use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum DelegationStatus {
        Active => "ACTIVE",
        Cancelled => "CANCELLED",
        Expired => "EXPIRED",
    }
}

/// A time-bounded grant letting `standin_id` approve on behalf of
/// `supervisor_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StandinDelegation {
    pub id: Uuid,
    pub supervisor_id: Uuid,
    pub standin_id: Uuid,
    pub standin_name: String,
    pub standin_email: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: DelegationStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StandinDelegation {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.status == DelegationStatus::Active && self.start_date <= day && day <= self.end_date
    }
}

/// A person who may act on timesheets: a supervisor or a stand-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApproverIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}
