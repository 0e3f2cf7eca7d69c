use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::Entry;
use super::macros::string_enum;
use crate::error::ValidationError;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "lowercase")]
    pub enum TimesheetStatus {
        Draft => "draft",
        Submitted => "submitted",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl TimesheetStatus {
    /// Entries may be written by the employee only in these states.
    pub fn is_editable(&self) -> bool {
        matches!(self, TimesheetStatus::Draft | TimesheetStatus::Rejected)
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, TimesheetStatus::Submitted | TimesheetStatus::Approved)
    }
}

/// A calendar month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ValidationError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day().iter_days().take_while(move |day| *day <= last)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Identifies one employee-month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetKey {
    pub employee_id: Uuid,
    pub period: Period,
}

/// Stamp left by a privileged out-of-band edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditStamp {
    pub edited_by: Uuid,
    pub edited_at: DateTime<Utc>,
    pub edit_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTimesheet {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub version: i32,
    pub status: TimesheetStatus,
    pub entries: BTreeMap<NaiveDate, Entry>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_by_name: Option<String>,
    pub approved_on_behalf_of: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_comments: Option<String>,
    pub edited_by: Option<Uuid>,
    pub edited_at: Option<DateTime<Utc>>,
    pub edit_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyTimesheet {
    /// A fresh, not yet persisted draft. Rows are only written on the first
    /// committed entry change.
    pub fn new(key: TimesheetKey) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            employee_id: key.employee_id,
            year: key.period.year,
            month: key.period.month,
            version: 1,
            status: TimesheetStatus::Draft,
            entries: BTreeMap::new(),
            submitted_at: None,
            approved_by: None,
            approved_by_name: None,
            approved_on_behalf_of: None,
            approved_at: None,
            approval_comments: None,
            edited_by: None,
            edited_at: None,
            edit_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            month: self.month,
        }
    }

    pub fn key(&self) -> TimesheetKey {
        TimesheetKey {
            employee_id: self.employee_id,
            period: self.period(),
        }
    }

    pub fn audit_stamp(&self) -> Option<AuditStamp> {
        match (self.edited_by, self.edited_at, self.edit_reason.as_ref()) {
            (Some(edited_by), Some(edited_at), Some(reason)) => Some(AuditStamp {
                edited_by,
                edited_at,
                edit_reason: reason.clone(),
            }),
            _ => None,
        }
    }
}
