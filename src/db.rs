pub mod lead_repo;
pub use lead_repo::{LeadRepository, LeadStore};
pub mod user_repo;
pub use user_repo::{UserRepository, UserStore};
pub mod role_repo;
pub use role_repo::{RoleRepository, RoleStore};

#[cfg(test)]
pub mod memory;
