//! Cryptographic building blocks for password records.
//!
//! Provides parameter validation and the scrypt call, salt generation,
//! pepper mixing, and constant-time comparison.

pub mod compare;
pub mod kdf;
pub mod pepper;
pub mod salt;

pub use compare::compare_equal;
pub use kdf::{ParamRule, ScryptParams, derive, derive_hex};
pub use pepper::Pepper;
pub use salt::{EntropyPolicy, EntropySource, GeneratedSalt, SaltProvider, Strength};

/// Length of the digest stored in a record (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Shortest key the raw KDF call hands out.
pub const MIN_KEY_LEN: usize = 16;
/// Longest output scrypt can produce: (2^32 - 1) * 32 bytes.
pub const MAX_KEY_LEN: u64 = (u32::MAX as u64) * 32;
/// Number of random bytes behind a generated salt.
pub const DEFAULT_SALT_LEN: usize = 8;
/// Upper bound on random bytes behind a generated salt.
pub const MAX_SALT_LEN: usize = 1024;
