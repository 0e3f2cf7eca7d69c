use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Period, TimesheetStatus};
use crate::handlers::shared::ApiResponse;

/// Missing or malformed input. Nothing is persisted when one of these is
/// returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}: working hours need a start and end time")]
    MissingWorkingHours(NaiveDate),

    #[error("{0}: start time must be before end time")]
    InvalidWorkingHours(NaiveDate),

    #[error("{0}: half-day leave needs an AM or PM period")]
    MissingHalfDayPeriod(NaiveDate),

    #[error("{0}: off in lieu needs the date it was earned")]
    MissingDateEarned(NaiveDate),

    #[error("{date}: date earned {earned} is in the future")]
    DateEarnedInFuture { date: NaiveDate, earned: NaiveDate },

    #[error("{0}: supporting documents are required for this leave type")]
    MissingDocuments(NaiveDate),

    #[error("{0}: an entry cannot hold documents and a document reference at once")]
    ConflictingDocuments(NaiveDate),

    #[error("{date}: document reference {reference} does not point to a primary document day")]
    DanglingDocumentReference { date: NaiveDate, reference: NaiveDate },

    #[error("{date}: field {field} does not apply to this entry type")]
    UnexpectedField { date: NaiveDate, field: &'static str },

    #[error("{date} is outside {period}")]
    DateOutsidePeriod { date: NaiveDate, period: Period },

    #[error("invalid period {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("no supporting documents were uploaded for a leave type that requires them")]
    NoDocumentsUploaded,

    #[error("document {0} does not exist or was uploaded by someone else")]
    UnknownDocument(Uuid),

    #[error("primary document day {0} is not part of the selected dates")]
    PrimaryDateNotSelected(NaiveDate),

    #[error("date earned is missing for {missing} of the selected dates")]
    IncompleteDateEarned { missing: usize },

    #[error("rejecting a timesheet requires comments")]
    MissingComments,

    #[error("an edit reason is required for administrative changes")]
    MissingEditReason,

    #[error("{0}")]
    Other(String),
}

/// Submission attempted outside the window or below the completeness
/// threshold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EligibilityError {
    #[error("period {0} is closed for editing and submission")]
    PeriodClosed(Period),

    #[error("period {0} has already been submitted")]
    AlreadySubmitted(Period),

    #[error(
        "only {filled} of {working_days} working days have entries; at least {required} are needed"
    )]
    BelowCompleteness {
        filled: usize,
        working_days: usize,
        required: usize,
    },
}

/// Inconsistent stored data that needs administrative resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("supervisor {supervisor_id} has {count} overlapping active stand-in delegations")]
    OverlappingDelegations { supervisor_id: Uuid, count: usize },

    #[error("{date}: entry is marked as primary document day but references {reference}")]
    DuplicatePrimaryDocument { date: NaiveDate, reference: NaiveDate },

    #[error("employee {0} has no supervisor on record")]
    MissingSupervisor(Uuid),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not eligible: {0}")]
    Eligibility(#[from] EligibilityError),

    #[error("Data integrity problem: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Cannot {action} a timesheet that is {status}")]
    StateConflict {
        action: &'static str,
        status: TimesheetStatus,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Eligibility(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StateConflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        if status_code.is_server_error() {
            log::error!(
                "Request failed with status {}: {}",
                status_code,
                error_message
            );
        } else {
            log::warn!(
                "Request rejected with status {}: {}",
                status_code,
                error_message
            );
        }

        let response_body = ApiResponse::<()>::error(&error_message);

        HttpResponse::build(status_code).json(response_body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

impl AppError {
    pub fn state_conflict(action: &'static str, status: TimesheetStatus) -> Self {
        AppError::StateConflict { action, status }
    }

    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }
}
