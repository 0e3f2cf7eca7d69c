use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::database::models::{
    AdminEditRecord, AuditStamp, Entry, MonthlyTimesheet, PendingChanges,
};
use crate::error::{AppError, ValidationError};
use crate::ports::{CommitGuard, TimesheetStore};
use crate::services::auth::Actor;
use crate::services::entry_store::EntryStore;

/// Privileged edit path for administrators. Writes bypass the status freeze
/// and the eligibility window, and every commit carries an audit stamp.
#[derive(Clone)]
pub struct AdminAuditOverlay {
    store: Arc<dyn TimesheetStore>,
}

impl AdminAuditOverlay {
    pub fn new(store: Arc<dyn TimesheetStore>) -> Self {
        Self { store }
    }

    pub async fn open(
        &self,
        actor: &Actor,
        employee_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<AdminEditSession, AppError> {
        actor.require_admin()?;
        let entries = EntryStore::load(self.store.clone(), employee_id, year, month)
            .await?
            .privileged();
        Ok(AdminEditSession {
            admin_id: actor.id,
            entries,
        })
    }

    /// Admin commits against a timesheet, oldest first.
    pub async fn audit_trail(
        &self,
        actor: &Actor,
        timesheet_id: Uuid,
    ) -> Result<Vec<AdminEditRecord>, AppError> {
        actor.require_admin()?;
        let mut records = self.store.admin_edits(timesheet_id).await?;
        records.sort_by_key(|record| record.edited_at);
        Ok(records)
    }
}

pub struct AdminEditSession {
    admin_id: Uuid,
    entries: EntryStore,
}

impl AdminEditSession {
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.entries = self.entries.as_of(today);
        self
    }

    pub fn timesheet(&self) -> &MonthlyTimesheet {
        self.entries.timesheet()
    }

    pub fn effective(&self) -> BTreeMap<NaiveDate, Entry> {
        self.entries.effective()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.entries.has_unsaved_changes()
    }

    pub fn save_entry(&mut self, entry: Entry) -> Result<(), AppError> {
        self.entries.save_entry(entry)
    }

    pub fn save_bulk(&mut self, entries: Vec<Entry>) -> Result<(), AppError> {
        self.entries.save_bulk(entries)
    }

    pub fn delete_entry(&mut self, date: NaiveDate) -> Result<(), AppError> {
        self.entries.delete_entry(date)
    }

    pub fn stage(&mut self, changes: PendingChanges) -> Result<(), AppError> {
        self.entries.stage(changes)
    }

    pub fn entries_mut(&mut self) -> &mut EntryStore {
        &mut self.entries
    }

    /// Commits the overlay with an audit stamp. The reason is mandatory.
    pub async fn commit_draft(
        &mut self,
        edit_reason: &str,
        now: DateTime<Utc>,
    ) -> Result<&MonthlyTimesheet, AppError> {
        let edit_reason = edit_reason.trim();
        if edit_reason.is_empty() {
            return Err(ValidationError::MissingEditReason.into());
        }
        if !self.entries.has_unsaved_changes() {
            log::warn!(
                "Admin {} committed no changes to {}",
                self.admin_id,
                self.entries.period()
            );
            return Ok(self.entries.timesheet());
        }

        let stamp = AuditStamp {
            edited_by: self.admin_id,
            edited_at: now,
            edit_reason: edit_reason.to_string(),
        };
        let status = self.entries.timesheet().status;
        let committed = self.entries.commit_with(CommitGuard::Audited(&stamp)).await?;
        log::info!(
            "Admin {} edited {} timesheet {}: {}",
            stamp.edited_by,
            status,
            committed.id,
            stamp.edit_reason
        );
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::InMemoryTimesheetStore;
    use crate::database::models::{EntryType, TimesheetStatus};
    use crate::services::auth::Role;
    use chrono::NaiveTime;
    use pretty_assertions::assert_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, day).unwrap()
    }

    fn actor(roles: Vec<Role>) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            roles,
        }
    }

    async fn approved_timesheet(
        store: &InMemoryTimesheetStore,
        employee_id: Uuid,
    ) -> MonthlyTimesheet {
        let mut session = EntryStore::load(Arc::new(store.clone()), employee_id, 2026, 7)
            .await
            .unwrap()
            .as_of(d(20));
        session
            .save_entry(Entry::working_hours(
                d(1),
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            ))
            .unwrap();
        let mut timesheet = session.commit_draft(None).await.unwrap().clone();

        timesheet.status = TimesheetStatus::Submitted;
        let mut timesheet = store
            .submit(&timesheet, (TimesheetStatus::Draft, 1))
            .await
            .unwrap();
        timesheet.status = TimesheetStatus::Approved;
        let record = crate::database::models::ApprovalRecord {
            id: Uuid::new_v4(),
            timesheet_id: timesheet.id,
            action: crate::database::models::ApprovalAction::Approved,
            acting_identity: Uuid::new_v4(),
            acting_name: "Sam".to_string(),
            acting_on_behalf_of: None,
            comments: None,
            version: 1,
            timestamp: Utc::now(),
        };
        store.decide(&timesheet, &record).await.unwrap()
    }

    #[tokio::test]
    async fn test_requires_admin_role() {
        let overlay = AdminAuditOverlay::new(Arc::new(InMemoryTimesheetStore::new()));
        let result = overlay
            .open(&actor(vec![Role::Supervisor]), Uuid::new_v4(), 2026, 7)
            .await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_edits_approved_timesheet_with_stamp() {
        let store = InMemoryTimesheetStore::new();
        let employee_id = Uuid::new_v4();
        let approved = approved_timesheet(&store, employee_id).await;

        let admin = actor(vec![Role::Admin]);
        let overlay = AdminAuditOverlay::new(Arc::new(store.clone()));
        let mut session = overlay
            .open(&admin, employee_id, 2026, 7)
            .await
            .unwrap()
            .as_of(d(20));
        session.save_entry(Entry::new(d(2), EntryType::DayOff)).unwrap();
        session.delete_entry(d(1)).unwrap();

        let now = Utc::now();
        let committed = session
            .commit_draft("Payroll correction", now)
            .await
            .unwrap()
            .clone();

        assert_eq!(committed.status, TimesheetStatus::Approved);
        assert_eq!(committed.version, approved.version);
        assert_eq!(committed.approved_by, approved.approved_by);
        assert_eq!(committed.edited_by, Some(admin.id));
        assert_eq!(committed.edit_reason.as_deref(), Some("Payroll correction"));
        assert_eq!(committed.entries.keys().copied().collect::<Vec<_>>(), vec![d(2)]);

        let trail = overlay.audit_trail(&admin, committed.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].changed_dates, vec![d(1), d(2)]);
    }

    #[tokio::test]
    async fn test_blank_reason_is_rejected() {
        let store = InMemoryTimesheetStore::new();
        let employee_id = Uuid::new_v4();
        approved_timesheet(&store, employee_id).await;

        let admin = actor(vec![Role::Admin]);
        let overlay = AdminAuditOverlay::new(Arc::new(store.clone()));
        let mut session = overlay.open(&admin, employee_id, 2026, 7).await.unwrap();
        session.delete_entry(d(1)).unwrap();

        let result = session.commit_draft("  ", Utc::now()).await;
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::MissingEditReason))
        ));
        assert!(session.has_unsaved_changes());
        assert_eq!(session.timesheet().edited_by, None);
    }
}
