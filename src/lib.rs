pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

pub use config::Config;
use database::memory::{InMemoryDelegationDirectory, InMemoryDocumentStore, InMemoryTimesheetStore};
use database::repositories::{PgDelegationRepository, PgDocumentRepository, PgTimesheetRepository};
pub use error::AppError;
use ports::{DelegationDirectory, DocumentStore, TimesheetStore};
use services::{AdminAuditOverlay, ApprovalWorkflow, BulkEditCoordinator, SubmissionEligibility};

/// Shared services handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub timesheets: Arc<dyn TimesheetStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub eligibility: SubmissionEligibility,
    pub approvals: ApprovalWorkflow,
    pub admin: AdminAuditOverlay,
    pub bulk_edit: BulkEditCoordinator,
}

impl AppState {
    pub fn new(
        timesheets: Arc<dyn TimesheetStore>,
        directory: Arc<dyn DelegationDirectory>,
        documents: Arc<dyn DocumentStore>,
        eligibility: SubmissionEligibility,
    ) -> Self {
        Self {
            approvals: ApprovalWorkflow::new(timesheets.clone(), directory, eligibility.clone()),
            admin: AdminAuditOverlay::new(timesheets.clone()),
            bulk_edit: BulkEditCoordinator::default(),
            timesheets,
            documents,
            eligibility,
        }
    }

    pub fn postgres(pool: PgPool, config: &Config) -> Self {
        Self::new(
            Arc::new(PgTimesheetRepository::new(pool.clone())),
            Arc::new(PgDelegationRepository::new(pool.clone())),
            Arc::new(PgDocumentRepository::new(pool)),
            SubmissionEligibility::new(config.eligibility_rules()),
        )
    }

    pub fn in_memory(
        timesheets: InMemoryTimesheetStore,
        directory: InMemoryDelegationDirectory,
        documents: InMemoryDocumentStore,
        config: &Config,
    ) -> Self {
        Self::new(
            Arc::new(timesheets),
            Arc::new(directory),
            Arc::new(documents),
            SubmissionEligibility::new(config.eligibility_rules()),
        )
    }
}
