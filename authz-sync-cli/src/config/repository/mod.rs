//! Repository layer for database operations

pub mod contexts;
pub mod migrations;
pub mod settings;
