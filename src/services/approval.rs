use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::database::models::{
    ApprovalAction, ApprovalRecord, Decision, MonthlyTimesheet, PendingChanges, TimesheetKey,
    TimesheetStatus,
};
use crate::error::{AppError, ValidationError};
use crate::ports::{CommitGuard, DelegationDirectory, TimesheetStore};
use crate::services::auth::Actor;
use crate::services::eligibility::SubmissionEligibility;
use crate::services::entry_store::check_document_links;
use crate::services::standin::{ResolvedApprover, StandinSubstitution};

/// Drives the draft → submitted → approved/rejected state machine.
#[derive(Clone)]
pub struct ApprovalWorkflow {
    store: Arc<dyn TimesheetStore>,
    substitution: StandinSubstitution,
    eligibility: SubmissionEligibility,
}

impl ApprovalWorkflow {
    pub fn new(
        store: Arc<dyn TimesheetStore>,
        directory: Arc<dyn DelegationDirectory>,
        eligibility: SubmissionEligibility,
    ) -> Self {
        Self {
            store,
            substitution: StandinSubstitution::new(directory),
            eligibility,
        }
    }

    pub fn substitution(&self) -> &StandinSubstitution {
        &self.substitution
    }

    async fn find(&self, timesheet_id: Uuid) -> Result<MonthlyTimesheet, AppError> {
        self.store
            .find_by_id(timesheet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Timesheet {}", timesheet_id)))
    }

    /// Submits the committed state of the actor's own month. From `rejected`
    /// this starts a new version.
    pub async fn submit(
        &self,
        actor: &Actor,
        key: TimesheetKey,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<MonthlyTimesheet, AppError> {
        if actor.id != key.employee_id {
            return Err(AppError::PermissionDenied(
                "Only the owner can submit a timesheet".to_string(),
            ));
        }

        let (mut timesheet, persisted) = match self.store.load_month(key).await? {
            Some(timesheet) => (timesheet, true),
            None => (MonthlyTimesheet::new(key), false),
        };

        for entry in timesheet.entries.values() {
            entry.validate(today)?;
        }
        check_document_links(&timesheet.entries)?;
        self.eligibility.check_submit(&timesheet, today)?;

        if !persisted {
            // Only reachable for a month without working days.
            timesheet = self
                .store
                .commit_changes(key, &PendingChanges::new(), CommitGuard::Editable)
                .await?;
        }

        let expected = (timesheet.status, timesheet.version);
        if timesheet.status == TimesheetStatus::Rejected {
            timesheet.version += 1;
            timesheet.approved_by = None;
            timesheet.approved_by_name = None;
            timesheet.approved_on_behalf_of = None;
            timesheet.approved_at = None;
            timesheet.approval_comments = None;
        }
        timesheet.status = TimesheetStatus::Submitted;
        timesheet.submitted_at = Some(now);

        let submitted = self.store.submit(&timesheet, expected).await?;
        log::info!(
            "Timesheet {} ({}) submitted by {} as version {}",
            submitted.id,
            key.period,
            actor.id,
            submitted.version
        );
        Ok(submitted)
    }

    /// Works out who `actor` acts as when deciding on an employee's
    /// timesheet, or refuses.
    async fn acting_identity(
        &self,
        actor: &Actor,
        timesheet: &MonthlyTimesheet,
        today: NaiveDate,
    ) -> Result<ResolvedApprover, AppError> {
        if actor.id == timesheet.employee_id {
            return Err(AppError::PermissionDenied(
                "Employees cannot decide on their own timesheet".to_string(),
            ));
        }

        let (supervisor, resolved) = self
            .substitution
            .approver_for(timesheet.employee_id, today)
            .await?;

        if actor.id == resolved.acting_id {
            return Ok(resolved);
        }
        if actor.id == supervisor.id {
            return Ok(ResolvedApprover {
                acting_id: supervisor.id,
                acting_name: supervisor.name,
                acting_email: supervisor.email,
                on_behalf_of: None,
            });
        }
        if actor.is_admin() {
            return Ok(ResolvedApprover {
                acting_id: actor.id,
                acting_name: actor.name.clone(),
                acting_email: actor.email.clone(),
                on_behalf_of: Some(supervisor.id),
            });
        }

        Err(AppError::PermissionDenied(
            "Only the supervisor or an active stand-in can decide on this timesheet".to_string(),
        ))
    }

    pub async fn decide(
        &self,
        actor: &Actor,
        timesheet_id: Uuid,
        decision: Decision,
        comments: Option<&str>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<MonthlyTimesheet, AppError> {
        let mut timesheet = self.find(timesheet_id).await?;

        let action = match decision {
            Decision::Approved => "approve",
            Decision::Rejected => "reject",
        };
        if timesheet.status != TimesheetStatus::Submitted {
            return Err(AppError::state_conflict(action, timesheet.status));
        }

        let comments = comments
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        if decision == Decision::Rejected && comments.is_none() {
            return Err(ValidationError::MissingComments.into());
        }

        let acting = self.acting_identity(actor, &timesheet, today).await?;

        timesheet.status = match decision {
            Decision::Approved => TimesheetStatus::Approved,
            Decision::Rejected => TimesheetStatus::Rejected,
        };
        timesheet.approved_by = Some(acting.acting_id);
        timesheet.approved_by_name = Some(acting.acting_name.clone());
        timesheet.approved_on_behalf_of = acting.on_behalf_of;
        timesheet.approved_at = Some(now);
        timesheet.approval_comments = comments.clone();

        let record = ApprovalRecord {
            id: Uuid::new_v4(),
            timesheet_id,
            action: ApprovalAction::from(decision),
            acting_identity: acting.acting_id,
            acting_name: acting.acting_name,
            acting_on_behalf_of: acting.on_behalf_of,
            comments,
            version: timesheet.version,
            timestamp: now,
        };

        let decided = self.store.decide(&timesheet, &record).await?;
        log::info!(
            "Timesheet {} {} by {}{}",
            timesheet_id,
            decided.status,
            record.acting_identity,
            record
                .acting_on_behalf_of
                .map(|id| format!(" on behalf of {}", id))
                .unwrap_or_default()
        );
        Ok(decided)
    }

    /// Approval records for a timesheet, oldest first.
    pub async fn history(&self, timesheet_id: Uuid) -> Result<Vec<ApprovalRecord>, AppError> {
        let mut records = self.store.approval_history(timesheet_id).await?;
        records.sort_by_key(|record| record.timestamp);
        Ok(records)
    }

    /// Owners, their supervisor, the supervisor's active stand-in and admins
    /// may read a timesheet.
    pub async fn ensure_can_view(
        &self,
        actor: &Actor,
        employee_id: Uuid,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        if actor.id == employee_id || actor.is_admin() {
            return Ok(());
        }
        let (supervisor, resolved) = self.substitution.approver_for(employee_id, today).await?;
        if actor.id == supervisor.id || actor.id == resolved.acting_id {
            return Ok(());
        }
        Err(AppError::PermissionDenied(
            "Not allowed to view this timesheet".to_string(),
        ))
    }

    pub async fn find_visible(
        &self,
        actor: &Actor,
        timesheet_id: Uuid,
        today: NaiveDate,
    ) -> Result<MonthlyTimesheet, AppError> {
        let timesheet = self.find(timesheet_id).await?;
        self.ensure_can_view(actor, timesheet.employee_id, today).await?;
        Ok(timesheet)
    }
}
