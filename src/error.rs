use thiserror::Error;

/// Caller supplied something that can never be hashed.
///
/// These are configuration or programming errors and are never corrected
/// silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("N must be greater than 1 and a power of 2 (got {0})")]
    NotPowerOfTwo(u64),
    #[error("r must be greater than {min} (got {got})")]
    RTooSmall { got: u64, min: u64 },
    #[error("p must be greater than {min} (got {got})")]
    PTooSmall { got: u64, min: u64 },
    #[error("parameter N is too large")]
    NTooLarge,
    #[error("parameter r is too large")]
    RTooLarge,
    #[error("parameter p is too large")]
    PTooLarge,
    #[error("r * p must be below 2^30")]
    BlockCountTooLarge,
    #[error("key length must be between 16 and (2^32 - 1) * 32 bytes (got {0})")]
    KeyLength(usize),
    #[error("password cannot be empty")]
    EmptyPassword,
    #[error("salt cannot be empty")]
    EmptySalt,
    #[error("salt length must be at most {max} bytes (got {got})")]
    SaltLength { got: usize, max: usize },
}

/// A stored record that is structurally malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("record is empty")]
    Empty,
    #[error("record must have 5 fields (found {0})")]
    FieldCount(usize),
    #[error("record field '{0}' is empty")]
    EmptyField(&'static str),
    #[error("record field '{0}' is not numeric")]
    NotNumeric(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KdfError {
    #[error("scrypt rejected the parameters")]
    InvalidParams,
    #[error("scrypt rejected the output length")]
    InvalidOutputLen,
    #[error("scrypt would need {required} bytes, limit is {limit}")]
    MemoryLimit { required: u64, limit: u64 },
}

#[derive(Debug, Error)]
pub enum EntropyError {
    #[error("{source_name} unavailable: {reason}")]
    Unavailable {
        source_name: &'static str,
        reason: String,
    },
    /// The source stopped early; the first `got` bytes of the buffer are usable.
    #[error("{source_name} returned {got} of {wanted} bytes")]
    Short {
        source_name: &'static str,
        got: usize,
        wanted: usize,
    },
    #[error("no cryptographically strong entropy source available")]
    Exhausted,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error("malformed record: {0}")]
    Format(#[from] FormatError),
    #[error("key derivation failed: {0}")]
    Kdf(#[from] KdfError),
    #[error("salt generation failed: {0}")]
    Entropy(#[from] EntropyError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
