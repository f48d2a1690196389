//! # evcat Common Library
//!
//! Shared code for the event catalog tools including:
//! - The `EventRecord` model and the SQLite store accessor
//! - Curation event types (`CurationEvent`) and the event bus
//! - Configuration loading
//! - Date and timestamp helpers for stored event text

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use db::models::EventRecord;
pub use error::{Error, Result};
