use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{
    AdminEditRecord, ApprovalRecord, AuditStamp, MonthlyTimesheet, PendingChanges, Period,
    TimesheetKey, TimesheetStatus,
};
use crate::error::AppError;

/// Condition a commit is written under, checked against the stored row in the
/// same transaction as the write.
#[derive(Debug, Clone, Copy)]
pub enum CommitGuard<'a> {
    /// Employee write: the stored timesheet must still be draft or rejected.
    Editable,
    /// Administrative write in any status, stamped onto the timesheet and
    /// appended to its admin edit records.
    Audited(&'a AuditStamp),
}

impl<'a> CommitGuard<'a> {
    pub fn audit(&self) -> Option<&'a AuditStamp> {
        match self {
            CommitGuard::Editable => None,
            CommitGuard::Audited(stamp) => Some(stamp),
        }
    }
}

/// Persistence boundary for monthly timesheets.
///
/// Every write is a single transaction: a commit applies all saves and
/// tombstones of a batch, and a decision writes the status change together
/// with its approval record.
#[async_trait]
pub trait TimesheetStore: Send + Sync + 'static {
    async fn load_month(&self, key: TimesheetKey) -> Result<Option<MonthlyTimesheet>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MonthlyTimesheet>, AppError>;

    /// Statuses of the employee's timesheets for the given periods. Periods
    /// without a row are absent from the map.
    async fn statuses(
        &self,
        employee_id: Uuid,
        periods: &[Period],
    ) -> Result<HashMap<Period, TimesheetStatus>, AppError>;

    /// Applies one overlay batch, creating the timesheet row when it does not
    /// exist yet. A `guard` that no longer holds is a state conflict and
    /// nothing is written.
    async fn commit_changes(
        &self,
        key: TimesheetKey,
        changes: &PendingChanges,
        guard: CommitGuard<'_>,
    ) -> Result<MonthlyTimesheet, AppError>;

    /// Persists a submission. `expected` is the status and version the caller
    /// based its decision on; a mismatch is a state conflict.
    async fn submit(
        &self,
        timesheet: &MonthlyTimesheet,
        expected: (TimesheetStatus, i32),
    ) -> Result<MonthlyTimesheet, AppError>;

    /// Persists an approve/reject decision together with its audit record.
    async fn decide(
        &self,
        timesheet: &MonthlyTimesheet,
        record: &ApprovalRecord,
    ) -> Result<MonthlyTimesheet, AppError>;

    async fn approval_history(&self, timesheet_id: Uuid) -> Result<Vec<ApprovalRecord>, AppError>;

    async fn admin_edits(&self, timesheet_id: Uuid) -> Result<Vec<AdminEditRecord>, AppError>;
}
