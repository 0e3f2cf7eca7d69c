pub mod admin;
pub mod documents;
pub mod shared;
pub mod timesheets;
