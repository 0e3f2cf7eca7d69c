pub mod approval;
pub mod delegation;
pub mod draft;
pub mod entry;
pub mod macros;
pub mod preset;
pub mod timesheet;

// Re-export all models for easy importing
pub use approval::*;
pub use delegation::*;
pub use draft::*;
pub use entry::*;
pub use preset::*;
pub use timesheet::*;
