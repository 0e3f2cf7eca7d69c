use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::PendingChanges;
use crate::error::AppError;
use crate::handlers::shared::{ApiResponse, today};
use crate::services::Claims;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCommitRequest {
    pub changes: PendingChanges,
    #[serde(default)]
    pub edit_reason: String,
}

/// Out-of-band correction of any employee's month, in any status.
pub async fn commit_entries(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, i32, u32)>,
    body: web::Json<AdminCommitRequest>,
) -> Result<HttpResponse, AppError> {
    let (employee_id, year, month) = path.into_inner();
    let AdminCommitRequest {
        changes,
        edit_reason,
    } = body.into_inner();

    let mut session = state
        .admin
        .open(&claims.actor(), employee_id, year, month)
        .await?
        .as_of(today());
    session.stage(changes)?;
    let committed = session.commit_draft(&edit_reason, Utc::now()).await?;

    Ok(ApiResponse::ok(committed))
}

pub async fn get_audit_trail(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let trail = state
        .admin
        .audit_trail(&claims.actor(), path.into_inner())
        .await?;
    Ok(ApiResponse::ok(trail))
}
