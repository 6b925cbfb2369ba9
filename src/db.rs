// src/db.rs

pub mod store;
pub use store::{LeadFilter, LeadStore};
pub mod lead_repo;
pub use lead_repo::PgLeadStore;
pub mod memory_store;
pub use memory_store::InMemoryLeadStore;
