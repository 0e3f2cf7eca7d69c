use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{PgPool, Postgres, Transaction, types::Json};
use uuid::Uuid;

use crate::database::{
    models::{
        AdminEditRecord, ApprovalRecord, Entry, EntryType, HalfDayPeriod,
        MonthlyTimesheet, PendingChanges, Period, SupportingDocument, TimesheetKey,
        TimesheetStatus,
    },
    utils::sql,
};
use crate::error::AppError;
use crate::ports::{CommitGuard, TimesheetStore};

#[derive(sqlx::FromRow)]
struct TimesheetRow {
    id: Uuid,
    employee_id: Uuid,
    year: i32,
    month: i32,
    version: i32,
    status: TimesheetStatus,
    submitted_at: Option<DateTime<Utc>>,
    approved_by: Option<Uuid>,
    approved_by_name: Option<String>,
    approved_on_behalf_of: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    approval_comments: Option<String>,
    edited_by: Option<Uuid>,
    edited_at: Option<DateTime<Utc>>,
    edit_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    entry_date: NaiveDate,
    entry_type: EntryType,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    half_day_period: Option<HalfDayPeriod>,
    date_earned: Option<NaiveDate>,
    notes: Option<String>,
    supporting_documents: Json<Vec<SupportingDocument>>,
    document_reference: Option<NaiveDate>,
    is_primary_document: bool,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Self {
            date: row.entry_date,
            entry_type: row.entry_type,
            start_time: row.start_time,
            end_time: row.end_time,
            half_day_period: row.half_day_period,
            date_earned: row.date_earned,
            notes: row.notes,
            supporting_documents: row.supporting_documents.0,
            document_reference: row.document_reference,
            is_primary_document: row.is_primary_document,
        }
    }
}

impl TimesheetRow {
    fn into_timesheet(self, entries: BTreeMap<NaiveDate, Entry>) -> MonthlyTimesheet {
        MonthlyTimesheet {
            id: self.id,
            employee_id: self.employee_id,
            year: self.year,
            month: self.month as u32,
            version: self.version,
            status: self.status,
            entries,
            submitted_at: self.submitted_at,
            approved_by: self.approved_by,
            approved_by_name: self.approved_by_name,
            approved_on_behalf_of: self.approved_on_behalf_of,
            approved_at: self.approved_at,
            approval_comments: self.approval_comments,
            edited_by: self.edited_by,
            edited_at: self.edited_at,
            edit_reason: self.edit_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const TIMESHEET_COLUMNS: &str = r#"
    id,
    employee_id,
    year,
    month,
    version,
    status,
    submitted_at,
    approved_by,
    approved_by_name,
    approved_on_behalf_of,
    approved_at,
    approval_comments,
    edited_by,
    edited_at,
    edit_reason,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct PgTimesheetRepository {
    pool: PgPool,
}

impl PgTimesheetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_entries(
        &self,
        timesheet_id: Uuid,
    ) -> Result<BTreeMap<NaiveDate, Entry>, AppError> {
        let rows = sqlx::query_as::<_, EntryRow>(&sql(r#"
            SELECT
                entry_date,
                entry_type,
                start_time,
                end_time,
                half_day_period,
                date_earned,
                notes,
                supporting_documents,
                document_reference,
                is_primary_document
            FROM
                timesheet_entries
            WHERE
                timesheet_id = ?
            ORDER BY
                entry_date
        "#))
        .bind(timesheet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.entry_date, Entry::from(row)))
            .collect())
    }

    async fn hydrate(
        &self,
        row: Option<TimesheetRow>,
    ) -> Result<Option<MonthlyTimesheet>, AppError> {
        match row {
            Some(row) => {
                let entries = self.load_entries(row.id).await?;
                Ok(Some(row.into_timesheet(entries)))
            }
            None => Ok(None),
        }
    }

    async fn require(&self, id: Uuid) -> Result<MonthlyTimesheet, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Timesheet {}", id)))
    }

    /// Writes the workflow columns of `timesheet` if the stored row still has
    /// `expected` status and version. Returns the number of rows touched.
    async fn update_workflow(
        tx: &mut Transaction<'_, Postgres>,
        timesheet: &MonthlyTimesheet,
        expected: (TimesheetStatus, i32),
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&sql(r#"
            UPDATE
                timesheets
            SET
                status = ?,
                version = ?,
                submitted_at = ?,
                approved_by = ?,
                approved_by_name = ?,
                approved_on_behalf_of = ?,
                approved_at = ?,
                approval_comments = ?,
                updated_at = ?
            WHERE
                id = ?
                AND status = ?
                AND version = ?
        "#))
        .bind(timesheet.status)
        .bind(timesheet.version)
        .bind(timesheet.submitted_at)
        .bind(timesheet.approved_by)
        .bind(timesheet.approved_by_name.as_deref())
        .bind(timesheet.approved_on_behalf_of)
        .bind(timesheet.approved_at)
        .bind(timesheet.approval_comments.as_deref())
        .bind(Utc::now())
        .bind(timesheet.id)
        .bind(expected.0)
        .bind(expected.1)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn conflict(&self, action: &'static str, id: Uuid) -> AppError {
        match self.find_by_id(id).await {
            Ok(Some(current)) => AppError::state_conflict(action, current.status),
            Ok(None) => AppError::NotFound(format!("Timesheet {}", id)),
            Err(err) => err,
        }
    }
}

#[async_trait]
impl TimesheetStore for PgTimesheetRepository {
    async fn load_month(&self, key: TimesheetKey) -> Result<Option<MonthlyTimesheet>, AppError> {
        let row = sqlx::query_as::<_, TimesheetRow>(&sql(&format!(
            r#"
            SELECT {TIMESHEET_COLUMNS}
            FROM
                timesheets
            WHERE
                employee_id = ?
                AND year = ?
                AND month = ?
            "#
        )))
        .bind(key.employee_id)
        .bind(key.period.year)
        .bind(key.period.month as i32)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MonthlyTimesheet>, AppError> {
        let row = sqlx::query_as::<_, TimesheetRow>(&sql(&format!(
            r#"
            SELECT {TIMESHEET_COLUMNS}
            FROM
                timesheets
            WHERE
                id = ?
            "#
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn statuses(
        &self,
        employee_id: Uuid,
        periods: &[Period],
    ) -> Result<HashMap<Period, TimesheetStatus>, AppError> {
        let rows = sqlx::query_as::<_, (i32, i32, TimesheetStatus)>(&sql(r#"
            SELECT
                year,
                month,
                status
            FROM
                timesheets
            WHERE
                employee_id = ?
        "#))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(year, month, status)| {
                (
                    Period {
                        year,
                        month: month as u32,
                    },
                    status,
                )
            })
            .filter(|(period, _)| periods.contains(period))
            .collect())
    }

    async fn commit_changes(
        &self,
        key: TimesheetKey,
        changes: &PendingChanges,
        guard: CommitGuard<'_>,
    ) -> Result<MonthlyTimesheet, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // The upsert locks the row until commit, so the status read here
        // cannot change under the entry writes below.
        let (timesheet_id, status): (Uuid, TimesheetStatus) = sqlx::query_as(&sql(r#"
            INSERT INTO
                timesheets (
                    id,
                    employee_id,
                    year,
                    month,
                    version,
                    status,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, 1, ?, ?, ?)
            ON CONFLICT (employee_id, year, month) DO UPDATE
            SET
                updated_at = EXCLUDED.updated_at
            RETURNING
                id,
                status
        "#))
        .bind(Uuid::new_v4())
        .bind(key.employee_id)
        .bind(key.period.year)
        .bind(key.period.month as i32)
        .bind(TimesheetStatus::Draft)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if matches!(guard, CommitGuard::Editable) && !status.is_editable() {
            tx.rollback().await?;
            log::warn!(
                "Rejected entry commit to {} timesheet {}",
                status,
                timesheet_id
            );
            return Err(AppError::state_conflict("edit", status));
        }

        for entry in changes.saves() {
            sqlx::query(&sql(r#"
                INSERT INTO
                    timesheet_entries (
                        timesheet_id,
                        entry_date,
                        entry_type,
                        start_time,
                        end_time,
                        half_day_period,
                        date_earned,
                        notes,
                        supporting_documents,
                        document_reference,
                        is_primary_document,
                        updated_at
                    )
                VALUES
                    (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (timesheet_id, entry_date) DO UPDATE
                SET
                    entry_type = EXCLUDED.entry_type,
                    start_time = EXCLUDED.start_time,
                    end_time = EXCLUDED.end_time,
                    half_day_period = EXCLUDED.half_day_period,
                    date_earned = EXCLUDED.date_earned,
                    notes = EXCLUDED.notes,
                    supporting_documents = EXCLUDED.supporting_documents,
                    document_reference = EXCLUDED.document_reference,
                    is_primary_document = EXCLUDED.is_primary_document,
                    updated_at = EXCLUDED.updated_at
            "#))
            .bind(timesheet_id)
            .bind(entry.date)
            .bind(entry.entry_type)
            .bind(entry.start_time)
            .bind(entry.end_time)
            .bind(entry.half_day_period)
            .bind(entry.date_earned)
            .bind(entry.notes.as_deref())
            .bind(Json(&entry.supporting_documents))
            .bind(entry.document_reference)
            .bind(entry.is_primary_document)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let deletions: Vec<NaiveDate> = changes.deletions().collect();
        if !deletions.is_empty() {
            sqlx::query(&sql(r#"
                DELETE FROM
                    timesheet_entries
                WHERE
                    timesheet_id = ?
                    AND entry_date = ANY(?)
            "#))
            .bind(timesheet_id)
            .bind(&deletions)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(stamp) = guard.audit() {
            sqlx::query(&sql(r#"
                UPDATE
                    timesheets
                SET
                    edited_by = ?,
                    edited_at = ?,
                    edit_reason = ?
                WHERE
                    id = ?
            "#))
            .bind(stamp.edited_by)
            .bind(stamp.edited_at)
            .bind(&stamp.edit_reason)
            .bind(timesheet_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(&sql(r#"
                INSERT INTO
                    admin_edits (
                        id,
                        timesheet_id,
                        edited_by,
                        edit_reason,
                        edited_at,
                        changed_dates
                    )
                VALUES
                    (?, ?, ?, ?, ?, ?)
            "#))
            .bind(Uuid::new_v4())
            .bind(timesheet_id)
            .bind(stamp.edited_by)
            .bind(&stamp.edit_reason)
            .bind(stamp.edited_at)
            .bind(changes.changed_dates())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        log::debug!(
            "Committed {} entry change(s) to timesheet {}",
            changes.len(),
            timesheet_id
        );

        self.require(timesheet_id).await
    }

    async fn submit(
        &self,
        timesheet: &MonthlyTimesheet,
        expected: (TimesheetStatus, i32),
    ) -> Result<MonthlyTimesheet, AppError> {
        let mut tx = self.pool.begin().await?;
        let touched = Self::update_workflow(&mut tx, timesheet, expected).await?;
        if touched == 0 {
            tx.rollback().await?;
            return Err(self.conflict("submit", timesheet.id).await);
        }
        tx.commit().await?;

        self.require(timesheet.id).await
    }

    async fn decide(
        &self,
        timesheet: &MonthlyTimesheet,
        record: &ApprovalRecord,
    ) -> Result<MonthlyTimesheet, AppError> {
        let mut tx = self.pool.begin().await?;

        let touched = Self::update_workflow(
            &mut tx,
            timesheet,
            (TimesheetStatus::Submitted, record.version),
        )
        .await?;
        if touched == 0 {
            tx.rollback().await?;
            return Err(self.conflict("decide on", timesheet.id).await);
        }

        sqlx::query(&sql(r#"
            INSERT INTO
                approval_records (
                    id,
                    timesheet_id,
                    action,
                    acting_identity,
                    acting_name,
                    acting_on_behalf_of,
                    comments,
                    version,
                    recorded_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#))
        .bind(record.id)
        .bind(record.timesheet_id)
        .bind(record.action)
        .bind(record.acting_identity)
        .bind(&record.acting_name)
        .bind(record.acting_on_behalf_of)
        .bind(record.comments.as_deref())
        .bind(record.version)
        .bind(record.timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.require(timesheet.id).await
    }

    async fn approval_history(&self, timesheet_id: Uuid) -> Result<Vec<ApprovalRecord>, AppError> {
        let records = sqlx::query_as::<_, ApprovalRecord>(&sql(r#"
            SELECT
                id,
                timesheet_id,
                action,
                acting_identity,
                acting_name,
                acting_on_behalf_of,
                comments,
                version,
                recorded_at
            FROM
                approval_records
            WHERE
                timesheet_id = ?
            ORDER BY
                recorded_at ASC
        "#))
        .bind(timesheet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn admin_edits(&self, timesheet_id: Uuid) -> Result<Vec<AdminEditRecord>, AppError> {
        let records = sqlx::query_as::<_, AdminEditRecord>(&sql(r#"
            SELECT
                id,
                timesheet_id,
                edited_by,
                edit_reason,
                edited_at,
                changed_dates
            FROM
                admin_edits
            WHERE
                timesheet_id = ?
            ORDER BY
                edited_at ASC
        "#))
        .bind(timesheet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
