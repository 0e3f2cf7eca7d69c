use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{ApproverIdentity, StandinDelegation},
    utils::sql,
};
use crate::error::AppError;
use crate::ports::DelegationDirectory;

#[derive(Clone)]
pub struct PgDelegationRepository {
    pool: PgPool,
}

impl PgDelegationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DelegationDirectory for PgDelegationRepository {
    async fn supervisor_of(&self, employee_id: Uuid) -> Result<Option<ApproverIdentity>, AppError> {
        let supervisor = sqlx::query_as::<_, ApproverIdentity>(&sql(r#"
            SELECT
                s.id,
                s.name,
                s.email
            FROM
                employees e
                JOIN employees s ON s.id = e.supervisor_id
            WHERE
                e.id = ?
        "#))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supervisor)
    }

    async fn delegations_for(
        &self,
        supervisor_id: Uuid,
    ) -> Result<Vec<StandinDelegation>, AppError> {
        let delegations = sqlx::query_as::<_, StandinDelegation>(&sql(r#"
            SELECT
                id,
                supervisor_id,
                standin_id,
                standin_name,
                standin_email,
                start_date,
                end_date,
                status,
                reason,
                created_at
            FROM
                standin_delegations
            WHERE
                supervisor_id = ?
            ORDER BY
                start_date
        "#))
        .bind(supervisor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(delegations)
    }
}
