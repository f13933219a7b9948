//! Errors raised by the catalog, the settings store and configuration loading

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Catalog or settings query failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder or database file could not be created
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    /// `config.toml` present but unreadable as TOML
    #[error("Invalid config file: {0}")]
    Config(String),

    /// No movie carries the requested slug
    #[error("No movie with slug '{0}'")]
    MovieNotFound(String),

    /// Movie or server rejected before insertion
    #[error("Invalid catalog entry: {0}")]
    InvalidCatalogEntry(String),
}
