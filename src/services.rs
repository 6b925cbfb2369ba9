// src/services.rs

pub mod catalog_service;
pub mod expiry;
pub mod intake;
pub mod lead_service;
pub mod review;
pub mod scoring;

pub use catalog_service::CatalogService;
pub use lead_service::LeadService;
