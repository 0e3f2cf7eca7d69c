use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{ApproverIdentity, StandinDelegation};
use crate::error::AppError;

/// Read access to the reporting line and stand-in delegations.
#[async_trait]
pub trait DelegationDirectory: Send + Sync + 'static {
    /// The supervisor who owns approval of `employee_id`'s timesheets.
    async fn supervisor_of(&self, employee_id: Uuid) -> Result<Option<ApproverIdentity>, AppError>;

    /// All delegations granted by `supervisor_id`, in any status.
    async fn delegations_for(&self, supervisor_id: Uuid)
    -> Result<Vec<StandinDelegation>, AppError>;
}
