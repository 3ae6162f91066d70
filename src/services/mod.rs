//! Service layer for business logic

mod link_service;

pub use link_service::*;
