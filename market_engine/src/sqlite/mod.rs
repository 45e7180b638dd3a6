//! SQLite backend for the marketplace engine.
//!
//! [`SqliteDatabase`] implements all the storage traits defined in the [`crate::traits`] module on
//! top of a single SQLite database, which keeps order, listing and meetup writes inside one
//! transactional boundary.
pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;
