/// Database layer: open, migrate, config.
pub mod db;
/// Crate-wide error type.
pub mod error;
/// XML export of publications.
pub mod export;
/// Subscriber setup for `tracing`.
pub mod logging;
/// Entities (Employee, Publication) and their DTOs.
pub mod models;
/// Generic repository, query filters, and the save-changes session.
pub mod repo;
/// Axum-based REST API.
pub mod web;

pub use error::{Error, Result};
