use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{ApproverIdentity, StandinDelegation};
use crate::error::{AppError, IntegrityError};
use crate::ports::DelegationDirectory;

/// Who actually acts for a supervisor on a given day.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedApprover {
    pub acting_id: Uuid,
    pub acting_name: String,
    pub acting_email: String,
    /// Set when a stand-in acts for the supervisor.
    pub on_behalf_of: Option<Uuid>,
}

impl ResolvedApprover {
    pub fn is_standin(&self) -> bool {
        self.on_behalf_of.is_some()
    }
}

/// Picks the stand-in whose delegation covers `today`, or the supervisor
/// when none does. More than one covering delegation is a data integrity
/// fault rather than something to pick from.
pub fn resolve(
    supervisor: &ApproverIdentity,
    delegations: &[StandinDelegation],
    today: NaiveDate,
) -> Result<ResolvedApprover, IntegrityError> {
    let active: Vec<&StandinDelegation> = delegations
        .iter()
        .filter(|delegation| delegation.supervisor_id == supervisor.id)
        .filter(|delegation| delegation.is_active_on(today))
        .collect();

    match active.as_slice() {
        [] => Ok(ResolvedApprover {
            acting_id: supervisor.id,
            acting_name: supervisor.name.clone(),
            acting_email: supervisor.email.clone(),
            on_behalf_of: None,
        }),
        [delegation] => Ok(ResolvedApprover {
            acting_id: delegation.standin_id,
            acting_name: delegation.standin_name.clone(),
            acting_email: delegation.standin_email.clone(),
            on_behalf_of: Some(supervisor.id),
        }),
        overlapping => Err(IntegrityError::OverlappingDelegations {
            supervisor_id: supervisor.id,
            count: overlapping.len(),
        }),
    }
}

#[derive(Clone)]
pub struct StandinSubstitution {
    directory: Arc<dyn DelegationDirectory>,
}

impl StandinSubstitution {
    pub fn new(directory: Arc<dyn DelegationDirectory>) -> Self {
        Self { directory }
    }

    pub async fn supervisor_of(&self, employee_id: Uuid) -> Result<ApproverIdentity, AppError> {
        self.directory
            .supervisor_of(employee_id)
            .await?
            .ok_or_else(|| IntegrityError::MissingSupervisor(employee_id).into())
    }

    pub async fn resolve_approver(
        &self,
        supervisor: &ApproverIdentity,
        today: NaiveDate,
    ) -> Result<ResolvedApprover, AppError> {
        let delegations = self.directory.delegations_for(supervisor.id).await?;
        let resolved = resolve(supervisor, &delegations, today)?;
        if resolved.is_standin() {
            log::debug!(
                "{} is standing in for supervisor {} on {}",
                resolved.acting_name,
                supervisor.id,
                today
            );
        }
        Ok(resolved)
    }

    /// The approver for an employee's timesheets on `today`.
    pub async fn approver_for(
        &self,
        employee_id: Uuid,
        today: NaiveDate,
    ) -> Result<(ApproverIdentity, ResolvedApprover), AppError> {
        let supervisor = self.supervisor_of(employee_id).await?;
        let resolved = self.resolve_approver(&supervisor, today).await?;
        Ok((supervisor, resolved))
    }
}
