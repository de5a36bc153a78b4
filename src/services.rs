pub mod access_gate;
pub mod auth;
pub mod image_client;
pub mod lead_admin;
pub mod quota;
pub mod submission;
