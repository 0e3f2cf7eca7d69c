use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::database::models::{Entry, MonthlyTimesheet, PendingChanges, Period, TimesheetKey};
use crate::error::{AppError, IntegrityError, ValidationError};
use crate::ports::{CommitGuard, TimesheetStore};
use crate::services::eligibility::SubmissionEligibility;

/// One editing session over an employee-month.
///
/// Writes land in a `PendingChanges` overlay and only reach the store on
/// `commit_draft`. Reads through `effective` see the overlay merged over the
/// persisted entries.
pub struct EntryStore {
    store: Arc<dyn TimesheetStore>,
    timesheet: MonthlyTimesheet,
    pending: PendingChanges,
    today: NaiveDate,
    window: Option<SubmissionEligibility>,
    privileged: bool,
}

impl EntryStore {
    /// Loads the persisted month, or an unsaved draft when the employee has no
    /// timesheet for it yet.
    pub async fn load(
        store: Arc<dyn TimesheetStore>,
        employee_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Self, AppError> {
        let key = TimesheetKey {
            employee_id,
            period: Period::new(year, month)?,
        };
        let timesheet = store
            .load_month(key)
            .await?
            .unwrap_or_else(|| MonthlyTimesheet::new(key));

        Ok(Self {
            store,
            timesheet,
            pending: PendingChanges::new(),
            today: Utc::now().date_naive(),
            window: None,
            privileged: false,
        })
    }

    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Refuses writes to periods outside the eligibility window.
    pub fn within(mut self, window: SubmissionEligibility) -> Self {
        self.window = Some(window);
        self
    }

    /// Lifts the status freeze and the eligibility window. Only the admin
    /// overlay opens stores this way.
    pub(crate) fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn timesheet(&self) -> &MonthlyTimesheet {
        &self.timesheet
    }

    pub fn key(&self) -> TimesheetKey {
        self.timesheet.key()
    }

    pub fn period(&self) -> Period {
        self.timesheet.period()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn effective(&self) -> BTreeMap<NaiveDate, Entry> {
        self.pending.apply_to(&self.timesheet.entries)
    }

    fn ensure_writable(&self) -> Result<(), AppError> {
        if self.privileged {
            return Ok(());
        }
        if !self.timesheet.status.is_editable() {
            return Err(AppError::state_conflict("edit", self.timesheet.status));
        }
        if let Some(window) = &self.window {
            window.check_period(self.period(), self.today, Some(self.timesheet.status))?;
        }
        Ok(())
    }

    fn ensure_in_period(&self, date: NaiveDate) -> Result<(), ValidationError> {
        let period = self.period();
        if period.contains(date) {
            Ok(())
        } else {
            Err(ValidationError::DateOutsidePeriod { date, period })
        }
    }

    fn check_entry(&self, entry: &Entry) -> Result<(), AppError> {
        self.ensure_in_period(entry.date)?;
        entry.validate(self.today)?;
        Ok(())
    }

    pub fn save_entry(&mut self, entry: Entry) -> Result<(), AppError> {
        self.ensure_writable()?;
        self.check_entry(&entry)?;
        self.pending.put(entry);
        Ok(())
    }

    /// All-or-nothing: one invalid entry leaves the overlay untouched.
    pub fn save_bulk(&mut self, entries: Vec<Entry>) -> Result<(), AppError> {
        self.ensure_writable()?;
        for entry in &entries {
            self.check_entry(entry)?;
        }
        for entry in entries {
            self.pending.put(entry);
        }
        Ok(())
    }

    pub fn delete_entry(&mut self, date: NaiveDate) -> Result<(), AppError> {
        self.ensure_writable()?;
        self.ensure_in_period(date)?;
        self.pending.tombstone(date);
        Ok(())
    }

    /// Replays a serialized overlay (e.g. one kept by a client between
    /// requests) through the same checks as individual writes.
    pub fn stage(&mut self, changes: PendingChanges) -> Result<(), AppError> {
        self.ensure_writable()?;
        for (date, change) in changes.iter() {
            self.ensure_in_period(date)?;
            if let Some(entry) = change {
                if entry.date != date {
                    return Err(ValidationError::Other(format!(
                        "change keyed {} carries an entry for {}",
                        date, entry.date
                    ))
                    .into());
                }
                entry.validate(self.today)?;
            }
        }
        for (date, change) in changes.iter() {
            match change {
                Some(entry) => self.pending.put(entry.clone()),
                None => self.pending.tombstone(date),
            }
        }
        Ok(())
    }

    pub fn with_pending(mut self, changes: PendingChanges) -> Result<Self, AppError> {
        self.stage(changes)?;
        Ok(self)
    }

    pub fn discard(&mut self) {
        self.pending = PendingChanges::new();
    }

    /// Drops the overlay and refetches persisted state.
    pub async fn reload(&mut self) -> Result<(), AppError> {
        let key = self.key();
        self.timesheet = self
            .store
            .load_month(key)
            .await?
            .unwrap_or_else(|| MonthlyTimesheet::new(key));
        self.discard();
        Ok(())
    }

    /// Pushes every overlay save and tombstone to the store as one batch,
    /// then clears the overlay. The store refuses the batch if the timesheet
    /// was submitted after this session loaded it; the overlay is kept.
    pub async fn commit_draft(
        &mut self,
        reason: Option<&str>,
    ) -> Result<&MonthlyTimesheet, AppError> {
        self.ensure_writable()?;
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            log::debug!("Committing draft for {}: {}", self.period(), reason);
        }
        self.commit_with(CommitGuard::Editable).await
    }

    pub(crate) async fn commit_with(
        &mut self,
        guard: CommitGuard<'_>,
    ) -> Result<&MonthlyTimesheet, AppError> {
        if self.pending.is_empty() {
            log::debug!("Nothing to commit for {}", self.period());
            return Ok(&self.timesheet);
        }

        check_document_links(&self.effective())?;

        let key = self.key();
        let committed = self
            .store
            .commit_changes(key, &self.pending, guard)
            .await?;

        log::info!(
            "Committed {} change(s) to timesheet {} ({} for employee {})",
            self.pending.len(),
            committed.id,
            key.period,
            key.employee_id
        );

        self.timesheet = committed;
        self.discard();
        Ok(&self.timesheet)
    }
}

/// Checks that every document reference resolves to an entry of the same
/// month that holds the files itself.
pub fn check_document_links(entries: &BTreeMap<NaiveDate, Entry>) -> Result<(), AppError> {
    for entry in entries.values() {
        if entry.is_primary_document {
            if let Some(reference) = entry.document_reference {
                return Err(IntegrityError::DuplicatePrimaryDocument {
                    date: entry.date,
                    reference,
                }
                .into());
            }
            if !entry.has_documents() {
                return Err(ValidationError::MissingDocuments(entry.date).into());
            }
        }

        if let Some(reference) = entry.document_reference {
            let holds_documents = entries
                .get(&reference)
                .is_some_and(|target| {
                    target.has_documents() && target.document_reference.is_none()
                });
            if !holds_documents {
                return Err(ValidationError::DanglingDocumentReference {
                    date: entry.date,
                    reference,
                }
                .into());
            }
        }
    }
    Ok(())
}
