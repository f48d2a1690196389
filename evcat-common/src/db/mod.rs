//! Event store: schema, model and accessor operations

pub mod init;
pub mod models;
pub mod records;

pub use init::*;
pub use models::*;
pub use records::*;
