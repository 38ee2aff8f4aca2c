/// Evently Crypto Library
///
/// Symmetric text encryption for data stored at rest (private message
/// bodies) and single-use token helpers for the password reset flow.
pub mod cipher;
pub mod tokens;

pub use cipher::{CryptoError, TextCipher};
