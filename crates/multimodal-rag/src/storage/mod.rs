//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for the document registry.

mod database;

pub use database::{DocumentRegistry, REGISTRY_FILE};
