use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;
use crate::error::ValidationError;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryType {
        WorkingHours => "working_hours",
        AnnualLeave => "annual_leave",
        AnnualLeaveHalfday => "annual_leave_halfday",
        MedicalLeave => "medical_leave",
        OffInLieu => "off_in_lieu",
        DayOff => "day_off",
        ChildcareLeave => "childcare_leave",
        ChildcareLeaveHalfday => "childcare_leave_halfday",
        NopayLeave => "nopay_leave",
        NopayLeaveHalfday => "nopay_leave_halfday",
        HospitalizationLeave => "hospitalization_leave",
        Reservist => "reservist",
        PaternityLeave => "paternity_leave",
        CompassionateLeave => "compassionate_leave",
        MaternityLeave => "maternity_leave",
        SharedParentalLeave => "shared_parental_leave",
    }
}

impl EntryType {
    pub fn is_half_day(&self) -> bool {
        matches!(
            self,
            EntryType::AnnualLeaveHalfday
                | EntryType::ChildcareLeaveHalfday
                | EntryType::NopayLeaveHalfday
        )
    }

    /// Leave types that must be backed by supporting documents, either held
    /// directly or through a reference to the primary document day.
    pub fn requires_documents(&self) -> bool {
        matches!(
            self,
            EntryType::MedicalLeave
                | EntryType::HospitalizationLeave
                | EntryType::Reservist
                | EntryType::PaternityLeave
                | EntryType::CompassionateLeave
                | EntryType::MaternityLeave
                | EntryType::SharedParentalLeave
        )
    }

    pub fn requires_date_earned(&self) -> bool {
        *self == EntryType::OffInLieu
    }

    pub fn requires_hours(&self) -> bool {
        *self == EntryType::WorkingHours
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum HalfDayPeriod {
        Am => "AM",
        Pm => "PM",
    }
}

/// Metadata of a file held by the document store. Entries never carry the
/// binary content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SupportingDocument {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// One calendar date's work or leave record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub date: NaiveDate,
    pub entry_type: EntryType,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub half_day_period: Option<HalfDayPeriod>,
    #[serde(default)]
    pub date_earned: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub supporting_documents: Vec<SupportingDocument>,
    #[serde(default)]
    pub document_reference: Option<NaiveDate>,
    #[serde(default)]
    pub is_primary_document: bool,
}

impl Entry {
    pub fn new(date: NaiveDate, entry_type: EntryType) -> Self {
        Self {
            date,
            entry_type,
            start_time: None,
            end_time: None,
            half_day_period: None,
            date_earned: None,
            notes: None,
            supporting_documents: Vec::new(),
            document_reference: None,
            is_primary_document: false,
        }
    }

    pub fn working_hours(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: Some(end_time),
            ..Self::new(date, EntryType::WorkingHours)
        }
    }

    pub fn has_documents(&self) -> bool {
        !self.supporting_documents.is_empty()
    }

    /// Field-level checks for a single entry. Cross-entry checks (references
    /// resolving to a primary day) live with the effective view.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        let date = self.date;

        if self.entry_type.requires_hours() {
            match (self.start_time, self.end_time) {
                (Some(start), Some(end)) if start < end => {}
                (Some(_), Some(_)) => return Err(ValidationError::InvalidWorkingHours(date)),
                _ => return Err(ValidationError::MissingWorkingHours(date)),
            }
        } else if self.start_time.is_some() || self.end_time.is_some() {
            return Err(ValidationError::UnexpectedField {
                date,
                field: "startTime/endTime",
            });
        }

        match (self.entry_type.is_half_day(), self.half_day_period) {
            (true, None) => return Err(ValidationError::MissingHalfDayPeriod(date)),
            (false, Some(_)) => {
                return Err(ValidationError::UnexpectedField {
                    date,
                    field: "halfDayPeriod",
                });
            }
            _ => {}
        }

        match (self.entry_type.requires_date_earned(), self.date_earned) {
            (true, None) => return Err(ValidationError::MissingDateEarned(date)),
            (true, Some(earned)) if earned > today => {
                return Err(ValidationError::DateEarnedInFuture { date, earned });
            }
            (false, Some(_)) => {
                return Err(ValidationError::UnexpectedField {
                    date,
                    field: "dateEarned",
                });
            }
            _ => {}
        }

        if self.has_documents() && self.document_reference.is_some() {
            return Err(ValidationError::ConflictingDocuments(date));
        }
        if self.document_reference == Some(date) {
            return Err(ValidationError::DanglingDocumentReference {
                date,
                reference: date,
            });
        }
        if self.entry_type.requires_documents()
            && !self.has_documents()
            && self.document_reference.is_none()
        {
            return Err(ValidationError::MissingDocuments(date));
        }

        Ok(())
    }
}
