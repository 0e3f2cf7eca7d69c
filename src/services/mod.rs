pub mod admin_overlay;
pub mod approval;
pub mod auth;
pub mod bulk_edit;
pub mod eligibility;
pub mod entry_store;
pub mod standin;

pub use admin_overlay::{AdminAuditOverlay, AdminEditSession};
pub use approval::ApprovalWorkflow;
pub use auth::{Actor, Claims, Role};
pub use bulk_edit::{BulkEditCoordinator, BulkEditRequest, EntryOverride, EntryTemplate};
pub use eligibility::{AvailablePeriod, Completeness, EligibilityRules, SubmissionEligibility};
pub use entry_store::EntryStore;
pub use standin::{ResolvedApprover, StandinSubstitution};
