//! SQLite database module for the food order engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
