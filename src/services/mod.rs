// Services module - business logic layer

pub mod contact_service;

pub use contact_service::ContactService;
