//! Salt generation.
//!
//! Random bytes come from the first source in a fallback chain that both
//! succeeds and reports cryptographic strength. Generated bytes are rendered
//! as base64 text that never contains the record delimiter.

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine, engine::general_purpose::STANDARD};
use log::warn;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use super::MAX_SALT_LEN;
use crate::error::{EntropyError, ParameterError, Result};
use crate::format::DELIMITER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Strong,
    Weak,
}

/// What to do once every strong source has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntropyPolicy {
    /// Fail with [`EntropyError::Exhausted`].
    #[default]
    Strict,
    /// Fall back to a non-cryptographic PRNG. Salts made this way are
    /// flagged [`Strength::Weak`].
    LegacyCompatible,
}

impl std::str::FromStr for EntropyPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(EntropyPolicy::Strict),
            "legacy-compatible" | "legacy" => Ok(EntropyPolicy::LegacyCompatible),
            other => anyhow::bail!("unknown entropy policy '{other}'"),
        }
    }
}

/// A provider of random bytes.
pub trait EntropySource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fills all of `buf`.
    ///
    /// A source that stops early reports [`EntropyError::Short`] and leaves
    /// the bytes it did produce at the front of `buf`.
    fn fill(&self, buf: &mut [u8]) -> Result<Strength, EntropyError>;
}

/// The operating system CSPRNG.
#[derive(Debug, Default)]
pub struct OsRandom;

impl EntropySource for OsRandom {
    fn name(&self) -> &'static str {
        "OS random generator"
    }

    fn fill(&self, buf: &mut [u8]) -> Result<Strength, EntropyError> {
        getrandom::fill(buf).map_err(|e| EntropyError::Unavailable {
            source_name: self.name(),
            reason: e.to_string(),
        })?;
        Ok(Strength::Strong)
    }
}

/// The thread-local generator from `rand`, a CSPRNG seeded by the OS.
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl EntropySource for ThreadRandom {
    fn name(&self) -> &'static str {
        "thread-local generator"
    }

    fn fill(&self, buf: &mut [u8]) -> Result<Strength, EntropyError> {
        rand::thread_rng()
            .try_fill_bytes(buf)
            .map_err(|e| EntropyError::Unavailable {
                source_name: self.name(),
                reason: e.to_string(),
            })?;
        Ok(Strength::Strong)
    }
}

/// Reads an entropy device such as `/dev/urandom` until the buffer is full.
#[derive(Debug)]
pub struct DeviceRandom {
    path: PathBuf,
}

impl DeviceRandom {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for DeviceRandom {
    fn default() -> Self {
        Self::new("/dev/urandom")
    }
}

impl EntropySource for DeviceRandom {
    fn name(&self) -> &'static str {
        "entropy device"
    }

    fn fill(&self, buf: &mut [u8]) -> Result<Strength, EntropyError> {
        let mut device = File::open(&self.path).map_err(|e| EntropyError::Unavailable {
            source_name: self.name(),
            reason: format!("{}: {e}", self.path.display()),
        })?;

        let wanted = buf.len();
        let mut got = 0;
        while got < wanted {
            match device.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }

        if got < wanted {
            return Err(EntropyError::Short {
                source_name: self.name(),
                got,
                wanted,
            });
        }
        Ok(Strength::Strong)
    }
}

/// A freshly generated salt.
#[derive(Debug, Clone)]
pub struct GeneratedSalt {
    text: String,
    strength: Strength,
}

impl GeneratedSalt {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// `true` when the salt came from the non-cryptographic fallback.
    pub fn is_degraded(&self) -> bool {
        self.strength == Strength::Weak
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

pub struct SaltProvider {
    sources: Vec<Box<dyn EntropySource>>,
    policy: EntropyPolicy,
}

impl Default for SaltProvider {
    fn default() -> Self {
        Self::new(EntropyPolicy::default())
    }
}

impl fmt::Debug for SaltProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaltProvider")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("policy", &self.policy)
            .finish()
    }
}

impl SaltProvider {
    /// The standard chain: OS CSPRNG, thread-local CSPRNG, `/dev/urandom`.
    pub fn new(policy: EntropyPolicy) -> Self {
        Self::with_sources(
            vec![
                Box::new(OsRandom),
                Box::new(ThreadRandom),
                Box::new(DeviceRandom::default()),
            ],
            policy,
        )
    }

    pub fn with_sources(sources: Vec<Box<dyn EntropySource>>, policy: EntropyPolicy) -> Self {
        Self { sources, policy }
    }

    pub fn policy(&self) -> EntropyPolicy {
        self.policy
    }

    /// Returns the caller's salt, sanitized, or a fresh one of `length` bytes.
    ///
    /// A caller supplied salt is reported as [`Strength::Strong`].
    pub fn obtain(&self, explicit: Option<&str>, length: usize) -> Result<GeneratedSalt> {
        match explicit {
            Some(salt) => Ok(GeneratedSalt {
                text: sanitize(salt)?,
                strength: Strength::Strong,
            }),
            None => self.generate(length),
        }
    }

    pub fn generate(&self, length: usize) -> Result<GeneratedSalt> {
        check_length(length)?;

        let mut collected: Vec<u8> = Vec::new();

        for source in &self.sources {
            let mut buf = vec![0u8; length];
            match source.fill(&mut buf) {
                Ok(Strength::Strong) => {
                    return Ok(GeneratedSalt {
                        text: encode(&buf),
                        strength: Strength::Strong,
                    });
                }
                Ok(Strength::Weak) => {
                    warn!("{} is not cryptographically strong, skipping", source.name());
                }
                Err(EntropyError::Short { got, .. }) => {
                    warn!("{} returned {got} of {length} bytes", source.name());
                    let got = got.min(length);
                    if got > collected.len() {
                        collected = buf[..got].to_vec();
                    }
                }
                Err(e) => warn!("{e}"),
            }
        }

        match self.policy {
            EntropyPolicy::Strict => Err(EntropyError::Exhausted.into()),
            EntropyPolicy::LegacyCompatible => {
                warn!("no strong entropy source available, salt falls back to a non-cryptographic PRNG");
                let mut rng = SmallRng::seed_from_u64(weak_seed());
                let buf = weak_fill(&collected, length, &mut rng);
                Ok(GeneratedSalt {
                    text: encode(&buf),
                    strength: Strength::Weak,
                })
            }
        }
    }
}

/// Generated salts must be between 1 and [`MAX_SALT_LEN`] bytes.
pub(crate) fn check_length(length: usize) -> Result<(), ParameterError> {
    if length == 0 {
        return Err(ParameterError::EmptySalt);
    }
    if length > MAX_SALT_LEN {
        return Err(ParameterError::SaltLength {
            got: length,
            max: MAX_SALT_LEN,
        });
    }
    Ok(())
}

/// Base64 text with `+` swapped for `.` and the delimiter removed.
fn encode(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .replace('+', ".")
        .replace(DELIMITER, "")
}

/// Strips the record delimiter from a caller supplied salt.
pub(crate) fn sanitize(salt: &str) -> Result<String, ParameterError> {
    let clean: String = salt.chars().filter(|&c| c != DELIMITER).collect();
    if clean.is_empty() {
        return Err(ParameterError::EmptySalt);
    }
    Ok(clean)
}

/// XORs PRNG noise over whatever was collected and pads to `length`.
fn weak_fill(collected: &[u8], length: usize, rng: &mut impl RngCore) -> Vec<u8> {
    (0..length)
        .map(|i| {
            let noise = (rng.next_u32() & 0xff) as u8;
            collected.get(i).map_or(noise, |b| b ^ noise)
        })
        .collect()
}

fn weak_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    nanos ^ u64::from(std::process::id())
}
