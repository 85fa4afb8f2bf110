//! Core types for the Solvault wallet
//!
//! Key material, PIN-derived vault encryption, PIN verification hashing,
//! and the shared error taxonomy. No I/O lives here: persistence is
//! `solvault-storage`, the network is `solvault-rpc`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cipher;
pub mod error;
pub mod keys;
pub mod pin;

pub use cipher::{EncryptedVault, NONCE_LENGTH, PBKDF2_ITERATIONS, SALT_LENGTH};
pub use error::{Error, Result};
pub use keys::{Keypair, Pubkey, PUBKEY_LENGTH, SECRET_KEY_LENGTH};
pub use pin::{PinHash, MAX_PIN_LENGTH, MIN_PIN_LENGTH};

/// Base units per whole native token
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Sentinel mint id representing the native token in balance lists
pub const NATIVE_MINT: &str = "11111111111111111111111111111112";
