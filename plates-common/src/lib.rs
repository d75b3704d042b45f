//! # Plates Common Library
//!
//! Shared code for the plate archive bot:
//! - Plate normalization and format validation
//! - Plate record store contract and its SQLite implementation
//! - Database initialization
//! - Configuration loading
//! - Conversation event types

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod plate;
pub mod store;

pub use error::{Error, Result};
pub use plate::PlateKey;
pub use store::{PlateStore, SqlitePlateStore};
