use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{
    Decision, Entry, MonthlyTimesheet, PendingChanges, Period, TimesheetKey,
};
use crate::error::AppError;
use crate::handlers::shared::{ApiResponse, today};
use crate::services::{BulkEditRequest, Claims, Completeness, EntryStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetQuery {
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    #[serde(default)]
    pub changes: PendingChanges,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEditPayload {
    /// Overlay the client already holds; the bulk edit is layered on top.
    #[serde(default)]
    pub pending: PendingChanges,
    #[serde(flatten)]
    pub request: BulkEditRequest,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
    pub comments: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetView {
    #[serde(flatten)]
    pub timesheet: MonthlyTimesheet,
    pub completeness: Completeness,
    pub is_editable: bool,
    pub can_submit: bool,
    pub can_resubmit: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub pending: PendingChanges,
    pub entries: BTreeMap<NaiveDate, Entry>,
    pub completeness: Completeness,
}

fn view(state: &AppState, timesheet: MonthlyTimesheet, today: NaiveDate) -> TimesheetView {
    let completeness = state
        .eligibility
        .completeness(timesheet.period(), &timesheet.entries);
    let is_editable = timesheet.status.is_editable()
        && state
            .eligibility
            .is_period_open(timesheet.period(), today, Some(timesheet.status));
    TimesheetView {
        completeness,
        is_editable,
        can_submit: state.eligibility.can_submit(&timesheet, today),
        can_resubmit: state.eligibility.can_resubmit(&timesheet, today),
        timesheet,
    }
}

fn draft_view(state: &AppState, store: &EntryStore) -> DraftView {
    let entries = store.effective();
    DraftView {
        pending: store.pending().clone(),
        completeness: state.eligibility.completeness(store.period(), &entries),
        entries,
    }
}

/// Opens the caller's own month for editing.
async fn open_own(
    state: &AppState,
    claims: &Claims,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<EntryStore, AppError> {
    Ok(
        EntryStore::load(state.timesheets.clone(), claims.sub, year, month)
            .await?
            .as_of(today)
            .within(state.eligibility.clone()),
    )
}

pub async fn get_periods(
    claims: Claims,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let periods = state
        .eligibility
        .available_periods_for(state.timesheets.as_ref(), claims.sub, today())
        .await?;
    Ok(ApiResponse::ok(periods))
}

pub async fn get_timesheet(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<(i32, u32)>,
    query: web::Query<TimesheetQuery>,
) -> Result<HttpResponse, AppError> {
    let (year, month) = path.into_inner();
    let today = today();
    let employee_id = query.employee_id.unwrap_or(claims.sub);

    state
        .approvals
        .ensure_can_view(&claims.actor(), employee_id, today)
        .await?;

    let store = EntryStore::load(state.timesheets.clone(), employee_id, year, month).await?;
    Ok(ApiResponse::ok(view(&state, store.timesheet().clone(), today)))
}

pub async fn preview(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<(i32, u32)>,
    changes: web::Json<PendingChanges>,
) -> Result<HttpResponse, AppError> {
    let (year, month) = path.into_inner();
    let store = open_own(&state, &claims, year, month, today())
        .await?
        .with_pending(changes.into_inner())?;
    Ok(ApiResponse::ok(draft_view(&state, &store)))
}

pub async fn bulk_edit(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<(i32, u32)>,
    payload: web::Json<BulkEditPayload>,
) -> Result<HttpResponse, AppError> {
    let (year, month) = path.into_inner();
    let BulkEditPayload { pending, request } = payload.into_inner();

    let mut store = open_own(&state, &claims, year, month, today())
        .await?
        .with_pending(pending)?;
    let documents = state
        .bulk_edit
        .resolve_documents(state.documents.as_ref(), claims.sub, &request.document_ids)
        .await?;
    let staged = state.bulk_edit.apply(&mut store, &request, &documents)?;
    log::debug!("Bulk edit staged {} entries for employee {}", staged, claims.sub);

    Ok(ApiResponse::ok(draft_view(&state, &store)))
}

pub async fn commit_entries(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<(i32, u32)>,
    body: web::Json<CommitRequest>,
) -> Result<HttpResponse, AppError> {
    let (year, month) = path.into_inner();
    let today = today();
    let CommitRequest { changes, reason } = body.into_inner();

    let mut store = open_own(&state, &claims, year, month, today)
        .await?
        .with_pending(changes)?;
    let committed = store.commit_draft(reason.as_deref()).await?.clone();

    Ok(ApiResponse::ok(view(&state, committed, today)))
}

pub async fn submit(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<(i32, u32)>,
) -> Result<HttpResponse, AppError> {
    let (year, month) = path.into_inner();
    let today = today();
    let key = TimesheetKey {
        employee_id: claims.sub,
        period: Period::new(year, month)?,
    };

    let submitted = state
        .approvals
        .submit(&claims.actor(), key, today, Utc::now())
        .await?;
    Ok(ApiResponse::ok(view(&state, submitted, today)))
}

pub async fn decide(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<DecisionRequest>,
) -> Result<HttpResponse, AppError> {
    let timesheet_id = path.into_inner();
    let today = today();

    let decided = state
        .approvals
        .decide(
            &claims.actor(),
            timesheet_id,
            body.decision,
            body.comments.as_deref(),
            today,
            Utc::now(),
        )
        .await?;
    Ok(ApiResponse::ok(view(&state, decided, today)))
}

pub async fn get_approvals(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let timesheet_id = path.into_inner();
    state
        .approvals
        .find_visible(&claims.actor(), timesheet_id, today())
        .await?;

    let history = state.approvals.history(timesheet_id).await?;
    Ok(ApiResponse::ok(history))
}

pub async fn get_presets(
    _claims: Claims,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(ApiResponse::ok(state.bulk_edit.presets().to_vec()))
}
