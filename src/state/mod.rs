/// State management module
///
/// This module handles all persisted state:
/// - Database connection, schema and queries (catalog.rs)
/// - Shared data structures (data.rs)
pub mod catalog;
pub mod data;
