pub mod auth;
pub mod lead;
pub mod submission;
