//! In-memory adapters for the store ports. Used by the test-suite and by the
//! binary when no `DATABASE_URL` is configured.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    AdminEditRecord, ApprovalRecord, ApproverIdentity, MonthlyTimesheet,
    PendingChanges, Period, StandinDelegation, SupportingDocument, TimesheetKey, TimesheetStatus,
};
use crate::error::AppError;
use crate::ports::{
    CommitGuard, DelegationDirectory, DocumentRecord, DocumentStore, TimesheetStore, UploadedFile,
};

#[derive(Default)]
struct TimesheetState {
    timesheets: HashMap<Uuid, MonthlyTimesheet>,
    by_key: HashMap<TimesheetKey, Uuid>,
    approvals: Vec<ApprovalRecord>,
    admin_edits: Vec<AdminEditRecord>,
}

#[derive(Clone, Default)]
pub struct InMemoryTimesheetStore {
    state: Arc<RwLock<TimesheetState>>,
}

impl InMemoryTimesheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.timesheets.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.timesheets.is_empty()
    }
}

fn copy_workflow_fields(target: &mut MonthlyTimesheet, source: &MonthlyTimesheet) {
    target.status = source.status;
    target.version = source.version;
    target.submitted_at = source.submitted_at;
    target.approved_by = source.approved_by;
    target.approved_by_name = source.approved_by_name.clone();
    target.approved_on_behalf_of = source.approved_on_behalf_of;
    target.approved_at = source.approved_at;
    target.approval_comments = source.approval_comments.clone();
    target.updated_at = Utc::now();
}

#[async_trait]
impl TimesheetStore for InMemoryTimesheetStore {
    async fn load_month(&self, key: TimesheetKey) -> Result<Option<MonthlyTimesheet>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .by_key
            .get(&key)
            .and_then(|id| state.timesheets.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MonthlyTimesheet>, AppError> {
        Ok(self.state.read().await.timesheets.get(&id).cloned())
    }

    async fn statuses(
        &self,
        employee_id: Uuid,
        periods: &[Period],
    ) -> Result<HashMap<Period, TimesheetStatus>, AppError> {
        let state = self.state.read().await;
        Ok(periods
            .iter()
            .filter_map(|period| {
                let key = TimesheetKey {
                    employee_id,
                    period: *period,
                };
                state
                    .by_key
                    .get(&key)
                    .and_then(|id| state.timesheets.get(id))
                    .map(|timesheet| (*period, timesheet.status))
            })
            .collect())
    }

    async fn commit_changes(
        &self,
        key: TimesheetKey,
        changes: &PendingChanges,
        guard: CommitGuard<'_>,
    ) -> Result<MonthlyTimesheet, AppError> {
        let mut state = self.state.write().await;
        let state = &mut *state;

        if let CommitGuard::Editable = guard {
            let stored = state
                .by_key
                .get(&key)
                .and_then(|id| state.timesheets.get(id));
            if let Some(stored) = stored.filter(|t| !t.status.is_editable()) {
                return Err(AppError::state_conflict("edit", stored.status));
            }
        }

        let id = *state.by_key.entry(key).or_insert_with(Uuid::new_v4);
        let timesheet = state.timesheets.entry(id).or_insert_with(|| {
            let mut created = MonthlyTimesheet::new(key);
            created.id = id;
            created
        });

        timesheet.entries = changes.apply_to(&timesheet.entries);
        timesheet.updated_at = Utc::now();

        if let Some(stamp) = guard.audit() {
            timesheet.edited_by = Some(stamp.edited_by);
            timesheet.edited_at = Some(stamp.edited_at);
            timesheet.edit_reason = Some(stamp.edit_reason.clone());
            state.admin_edits.push(AdminEditRecord {
                id: Uuid::new_v4(),
                timesheet_id: id,
                edited_by: stamp.edited_by,
                edit_reason: stamp.edit_reason.clone(),
                edited_at: stamp.edited_at,
                changed_dates: changes.changed_dates(),
            });
        }

        Ok(timesheet.clone())
    }

    async fn submit(
        &self,
        timesheet: &MonthlyTimesheet,
        expected: (TimesheetStatus, i32),
    ) -> Result<MonthlyTimesheet, AppError> {
        let mut state = self.state.write().await;
        let stored = state
            .timesheets
            .get_mut(&timesheet.id)
            .ok_or_else(|| AppError::NotFound(format!("Timesheet {}", timesheet.id)))?;

        if (stored.status, stored.version) != expected {
            return Err(AppError::state_conflict("submit", stored.status));
        }

        copy_workflow_fields(stored, timesheet);
        Ok(stored.clone())
    }

    async fn decide(
        &self,
        timesheet: &MonthlyTimesheet,
        record: &ApprovalRecord,
    ) -> Result<MonthlyTimesheet, AppError> {
        let mut state = self.state.write().await;
        let stored = state
            .timesheets
            .get_mut(&timesheet.id)
            .ok_or_else(|| AppError::NotFound(format!("Timesheet {}", timesheet.id)))?;

        if stored.status != TimesheetStatus::Submitted || stored.version != record.version {
            return Err(AppError::state_conflict("decide on", stored.status));
        }

        copy_workflow_fields(stored, timesheet);
        let updated = stored.clone();
        state.approvals.push(record.clone());
        Ok(updated)
    }

    async fn approval_history(&self, timesheet_id: Uuid) -> Result<Vec<ApprovalRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .approvals
            .iter()
            .filter(|record| record.timesheet_id == timesheet_id)
            .cloned()
            .collect())
    }

    async fn admin_edits(&self, timesheet_id: Uuid) -> Result<Vec<AdminEditRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .admin_edits
            .iter()
            .filter(|record| record.timesheet_id == timesheet_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct DirectoryState {
    supervisors: HashMap<Uuid, ApproverIdentity>,
    delegations: Vec<StandinDelegation>,
}

#[derive(Clone, Default)]
pub struct InMemoryDelegationDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryDelegationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_supervisor(&self, employee_id: Uuid, supervisor: ApproverIdentity) {
        self.state
            .write()
            .await
            .supervisors
            .insert(employee_id, supervisor);
    }

    pub async fn add_delegation(&self, delegation: StandinDelegation) {
        self.state.write().await.delegations.push(delegation);
    }
}

#[async_trait]
impl DelegationDirectory for InMemoryDelegationDirectory {
    async fn supervisor_of(&self, employee_id: Uuid) -> Result<Option<ApproverIdentity>, AppError> {
        Ok(self.state.read().await.supervisors.get(&employee_id).cloned())
    }

    async fn delegations_for(
        &self,
        supervisor_id: Uuid,
    ) -> Result<Vec<StandinDelegation>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .delegations
            .iter()
            .filter(|delegation| delegation.supervisor_id == supervisor_id)
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    files: Arc<RwLock<HashMap<Uuid, (DocumentRecord, Vec<u8>)>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn upload(
        &self,
        owner_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<SupportingDocument>, AppError> {
        let mut stored = self.files.write().await;
        let documents = files
            .into_iter()
            .map(|file| {
                let document = SupportingDocument {
                    id: Uuid::new_v4(),
                    name: file.name,
                    size: file.content.len() as u64,
                    mime_type: file.mime_type,
                };
                let record = DocumentRecord {
                    document: document.clone(),
                    owner_id,
                };
                stored.insert(document.id, (record, file.content));
                document
            })
            .collect();
        Ok(documents)
    }

    async fn describe(&self, ids: &[Uuid]) -> Result<Vec<DocumentRecord>, AppError> {
        let stored = self.files.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| stored.get(id).map(|(record, _)| record.clone()))
            .collect())
    }

    async fn download(&self, id: Uuid) -> Result<Option<(DocumentRecord, Vec<u8>)>, AppError> {
        Ok(self.files.read().await.get(&id).cloned())
    }
}
