pub mod auth;
pub mod catalog;
pub mod customer;
pub mod lead;
