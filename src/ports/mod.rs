//! Outbound ports the engine calls into. Each has a Postgres adapter under
//! `database::repositories` and an in-memory adapter under `database::memory`.

mod delegations;
mod documents;
mod timesheets;

pub use delegations::*;
pub use documents::*;
pub use timesheets::*;
