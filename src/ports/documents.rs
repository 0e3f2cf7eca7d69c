use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::SupportingDocument;
use crate::error::AppError;

/// A file handed over for upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Metadata of a stored file and the employee who uploaded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub document: SupportingDocument,
    pub owner_id: Uuid,
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Stores the files on behalf of `owner_id` and returns their metadata,
    /// in input order.
    async fn upload(
        &self,
        owner_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<SupportingDocument>, AppError>;

    /// Looks up metadata without the content. Unknown ids are left out.
    async fn describe(&self, ids: &[Uuid]) -> Result<Vec<DocumentRecord>, AppError>;

    async fn download(&self, id: Uuid) -> Result<Option<(DocumentRecord, Vec<u8>)>, AppError>;
}
