//! Utility modules for evcat-curate

pub mod db_retry;

pub use db_retry::retry_on_lock;
