pub mod delegation;
pub mod document;
pub mod timesheet;

// Re-export all repositories for easy importing
pub use delegation::PgDelegationRepository;
pub use document::PgDocumentRepository;
pub use timesheet::PgTimesheetRepository;
