use actix_web::{HttpResponse, http::header, web};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::handlers::shared::{ApiResponse, today};
use crate::ports::UploadedFile;
use crate::services::Claims;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedFile {
    pub name: String,
    pub mime_type: String,
    /// Base64 (standard alphabet) file content.
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub files: Vec<EncodedFile>,
}

pub async fn upload_documents(
    claims: Claims,
    state: web::Data<AppState>,
    body: web::Json<UploadRequest>,
) -> Result<HttpResponse, AppError> {
    let files = body
        .into_inner()
        .files
        .into_iter()
        .map(|file| {
            let content = STANDARD.decode(file.content.as_bytes()).map_err(|e| {
                AppError::BadRequest(format!("{} is not valid base64: {}", file.name, e))
            })?;
            Ok(UploadedFile {
                name: file.name,
                mime_type: file.mime_type,
                content,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    if files.is_empty() {
        return Err(AppError::BadRequest("No files provided".to_string()));
    }

    let documents = state.documents.upload(claims.sub, files).await?;
    log::info!(
        "Employee {} uploaded {} supporting document(s)",
        claims.sub,
        documents.len()
    );
    Ok(ApiResponse::created(documents))
}

/// Files are readable by whoever may read the uploader's timesheets.
pub async fn download_document(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let (record, content) = state
        .documents
        .download(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {}", id)))?;

    state
        .approvals
        .ensure_can_view(&claims.actor(), record.owner_id, today())
        .await?;
    let document = record.document;

    Ok(HttpResponse::Ok()
        .content_type(document.mime_type.as_str())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.name.replace('"', "")),
        ))
        .body(content))
}
