pub mod config;
pub mod crypto;
mod error;
pub mod format;

pub use crate::config::HasherConfig;
pub use crate::crypto::{
    EntropyPolicy, ParamRule, Pepper, SaltProvider, ScryptParams, Strength, compare_equal, kdf,
};
pub use crate::error::{EntropyError, Error, FormatError, KdfError, ParameterError, Result};
pub use crate::format::Record;

use log::{debug, warn};

use crate::crypto::KEY_LEN;

/// Hashes passwords into records and checks passwords against them.
///
/// Holds only read-only state, so one instance can serve concurrent callers.
/// Both operations run scrypt on the calling thread and block until it
/// finishes.
#[derive(Debug)]
pub struct Hasher {
    pepper: Pepper,
    salts: SaltProvider,
    rule: ParamRule,
    salt_length: usize,
    max_memory: u64,
    params: ScryptParams,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::from_config(&HasherConfig::default())
    }
}

impl Hasher {
    pub fn new(pepper: Pepper) -> Self {
        Self {
            pepper,
            ..Self::default()
        }
    }

    pub fn from_config(config: &HasherConfig) -> Self {
        Self {
            pepper: config.pepper(),
            salts: SaltProvider::new(config.entropy_policy),
            rule: config.param_rule,
            salt_length: config.salt_length,
            max_memory: config.max_memory,
            params: config.params,
        }
    }

    /// Replaces the entropy chain used for generated salts.
    pub fn with_salt_provider(mut self, salts: SaltProvider) -> Self {
        self.salts = salts;
        self
    }

    pub fn params(&self) -> &ScryptParams {
        &self.params
    }

    pub fn rule(&self) -> ParamRule {
        self.rule
    }

    pub fn generate_salt(&self, length: usize) -> Result<String> {
        let salt = self.salts.generate(length)?;
        Ok(salt.into_text())
    }

    /// Hashes with the configured cost parameters.
    pub fn hash(&self, password: &str, salt: Option<&str>) -> Result<String> {
        self.hash_with_params(password, salt, self.params)
    }

    pub fn hash_with_params(
        &self,
        password: &str,
        salt: Option<&str>,
        params: ScryptParams,
    ) -> Result<String> {
        let (record, _) = self.hash_reporting_strength(password, salt, params)?;
        Ok(record)
    }

    /// Same as [`Hasher::hash_with_params`], also returning the strength of
    /// the salt in the record.
    ///
    /// Only a generated salt under [`EntropyPolicy::LegacyCompatible`] can be
    /// [`Strength::Weak`].
    pub fn hash_reporting_strength(
        &self,
        password: &str,
        salt: Option<&str>,
        params: ScryptParams,
    ) -> Result<(String, Strength)> {
        if password.is_empty() {
            return Err(ParameterError::EmptyPassword.into());
        }
        params.validate(self.rule)?;
        self.check_memory(&params)?;

        let salt = self.salts.obtain(salt, self.salt_length)?;
        let strength = salt.strength();
        let salt = salt.into_text();
        let digest = self.digest(password, &salt, &params)?;

        if strength == Strength::Weak {
            warn!("record with {params} and salt {salt} uses a non-cryptographic salt");
        }
        debug!("hashed password with {params}");
        Ok((Record::new(params, salt, digest).encode(), strength))
    }

    /// Returns whether `password` matches `record`.
    ///
    /// A wrong password is `Ok(false)`. A record that cannot be parsed, or
    /// whose parameters are unacceptable, is an error.
    pub fn check(&self, password: &str, record: &str) -> Result<bool> {
        let record = Record::decode(record)?;
        let params = *record.params();
        params.validate(self.rule)?;
        self.check_memory(&params)?;

        let calculated = self.digest(password, record.salt(), &params)?;

        debug!("checked password against record with {params}");
        Ok(compare_equal(
            record.digest().as_bytes(),
            calculated.as_bytes(),
        ))
    }

    fn digest(&self, password: &str, salt: &str, params: &ScryptParams) -> Result<String> {
        let mixed = self.pepper.mix(salt.as_bytes());
        kdf::derive_hex(password.as_bytes(), &mixed, params, KEY_LEN)
    }

    fn check_memory(&self, params: &ScryptParams) -> Result<(), KdfError> {
        let required = params.memory_required().unwrap_or(u64::MAX);
        if required > self.max_memory {
            return Err(KdfError::MemoryLimit {
                required,
                limit: self.max_memory,
            });
        }
        Ok(())
    }
}

/// Generates a salt from `length` random bytes.
pub fn generate_salt(length: usize) -> Result<String> {
    Hasher::default().generate_salt(length)
}

/// Hashes `password` with the default cost parameters and no pepper.
pub fn hash(password: &str, salt: Option<&str>) -> Result<String> {
    Hasher::default().hash(password, salt)
}

pub fn hash_with_params(password: &str, salt: Option<&str>, params: ScryptParams) -> Result<String> {
    Hasher::default().hash_with_params(password, salt, params)
}

/// Checks `password` against a record made without a pepper.
pub fn check(password: &str, record: &str) -> Result<bool> {
    Hasher::default().check(password, record)
}
