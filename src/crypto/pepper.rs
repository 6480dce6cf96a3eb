use std::fmt;

use zeroize::Zeroizing;

/// Application-wide secret prepended to every salt before key derivation.
///
/// It is never written into a record. Hashing and checking must use the same
/// pepper, otherwise every check simply reports a mismatch.
#[derive(Clone, Default)]
pub struct Pepper(Zeroizing<Vec<u8>>);

impl Pepper {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// A pepper that leaves salts untouched.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        !self.0.is_empty()
    }

    /// Returns `pepper || salt`.
    pub fn mix(&self, salt: &[u8]) -> Zeroizing<Vec<u8>> {
        let mut mixed = Zeroizing::new(Vec::with_capacity(self.0.len() + salt.len()));
        mixed.extend_from_slice(&self.0);
        mixed.extend_from_slice(salt);
        mixed
    }
}

impl fmt::Debug for Pepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_enabled() {
            f.write_str("Pepper(<redacted>)")
        } else {
            f.write_str("Pepper(disabled)")
        }
    }
}
