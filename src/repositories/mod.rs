// Repositories module - data access layer

pub mod contact_repository;

pub use contact_repository::*;
