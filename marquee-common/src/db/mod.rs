//! Database models and queries

pub mod catalog;
pub mod init;
pub mod models;
pub mod settings;

pub use catalog::*;
pub use init::*;
pub use models::*;
pub use settings::*;
