pub mod error;
pub mod messages;
pub mod retry;
pub mod serde_utils;
