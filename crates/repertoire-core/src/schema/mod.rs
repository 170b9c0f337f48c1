//! SQLite schema and database access.

pub mod db;
pub mod migrations;

pub use db::Database;
