//! Local persistence for Solvault
//!
//! A single-file SQLite key-value store holding the encrypted vault blob,
//! the PIN record, connection settings, and the legacy wallet artifact
//! kept around for migration detection. No cryptography lives here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod database;
pub mod error;
pub mod vault_store;

pub use database::Database;
pub use error::{Error, Result};
pub use vault_store::{VaultStore, DEFAULT_ENDPOINT};
