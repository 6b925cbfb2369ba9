// src/handlers.rs

pub mod categories;
pub mod cron;
pub mod customers;
pub mod leads;
