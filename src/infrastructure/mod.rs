//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: In-memory message store
//! - Database: SQLite message store
//! - Adapters: Console rendering

pub mod config;
pub mod storage;
pub mod database;
pub mod adapters;
