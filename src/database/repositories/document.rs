use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::{models::SupportingDocument, utils::sql};
use crate::error::AppError;
use crate::ports::{DocumentRecord, DocumentStore, UploadedFile};

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    size: i64,
    mime_type: String,
}

impl From<DocumentRow> for DocumentRecord {
    fn from(row: DocumentRow) -> Self {
        Self {
            document: SupportingDocument {
                id: row.id,
                name: row.name,
                size: row.size.max(0) as u64,
                mime_type: row.mime_type,
            },
            owner_id: row.owner_id,
        }
    }
}

#[derive(FromRow)]
struct ContentRow {
    #[sqlx(flatten)]
    meta: DocumentRow,
    content: Vec<u8>,
}

/// Keeps uploaded files in Postgres alongside the timesheets.
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentRepository {
    async fn upload(
        &self,
        owner_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<SupportingDocument>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut documents = Vec::with_capacity(files.len());

        for file in files {
            let document = SupportingDocument {
                id: Uuid::new_v4(),
                name: file.name,
                size: file.content.len() as u64,
                mime_type: file.mime_type,
            };

            sqlx::query(&sql(r#"
                INSERT INTO
                    supporting_documents (id, owner_id, name, size, mime_type, content)
                VALUES
                    (?, ?, ?, ?, ?, ?)
            "#))
            .bind(document.id)
            .bind(owner_id)
            .bind(&document.name)
            .bind(document.size as i64)
            .bind(&document.mime_type)
            .bind(file.content)
            .execute(&mut *tx)
            .await?;

            documents.push(document);
        }

        tx.commit().await?;
        log::debug!(
            "Stored {} supporting document(s) for {}",
            documents.len(),
            owner_id
        );
        Ok(documents)
    }

    async fn describe(&self, ids: &[Uuid]) -> Result<Vec<DocumentRecord>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, DocumentRow>(&sql(r#"
            SELECT
                id,
                owner_id,
                name,
                size,
                mime_type
            FROM
                supporting_documents
            WHERE
                id = ANY(?)
        "#))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DocumentRecord::from).collect())
    }

    async fn download(&self, id: Uuid) -> Result<Option<(DocumentRecord, Vec<u8>)>, AppError> {
        let row = sqlx::query_as::<_, ContentRow>(&sql(r#"
            SELECT
                id,
                owner_id,
                name,
                size,
                mime_type,
                content
            FROM
                supporting_documents
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| (DocumentRecord::from(row.meta), row.content)))
    }
}
