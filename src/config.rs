//! Hasher configuration.
//!
//! Settings come from an optional JSON file and are then overridden by
//! environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::crypto::salt::check_length;
use crate::crypto::{DEFAULT_SALT_LEN, EntropyPolicy, ParamRule, Pepper, ScryptParams};

pub const PEPPER_ENV: &str = "SCRYPTPW_PEPPER";
pub const PARAM_RULE_ENV: &str = "SCRYPTPW_PARAM_RULE";
pub const ENTROPY_POLICY_ENV: &str = "SCRYPTPW_ENTROPY_POLICY";

/// Default ceiling on scrypt working memory (256 MiB).
pub const DEFAULT_MAX_MEMORY: u64 = 256 * 1024 * 1024;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HasherConfig {
    /// Secret prepended to every salt. Absent or empty disables it.
    pub pepper: Option<String>,
    pub param_rule: ParamRule,
    pub entropy_policy: EntropyPolicy,
    /// Random bytes behind each generated salt.
    pub salt_length: usize,
    /// Largest scrypt working set, in bytes, a hash or check may allocate.
    pub max_memory: u64,
    /// Cost parameters used when the caller does not pass any.
    pub params: ScryptParams,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            pepper: None,
            param_rule: ParamRule::default(),
            entropy_policy: EntropyPolicy::default(),
            salt_length: DEFAULT_SALT_LEN,
            max_memory: DEFAULT_MAX_MEMORY,
            params: ScryptParams::default(),
        }
    }
}

impl std::fmt::Debug for HasherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HasherConfig")
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .field("param_rule", &self.param_rule)
            .field("entropy_policy", &self.entropy_policy)
            .field("salt_length", &self.salt_length)
            .field("max_memory", &self.max_memory)
            .field("params", &self.params)
            .finish()
    }
}

impl HasherConfig {
    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Checks settings that the types alone do not bound.
    pub fn validate(&self) -> Result<()> {
        check_length(self.salt_length).context("invalid salt_length")?;
        Ok(())
    }

    /// Loads `path` if it exists, otherwise starts from the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(pepper) = lookup(PEPPER_ENV) {
            self.pepper = Some(pepper);
        }
        if let Some(rule) = lookup(PARAM_RULE_ENV) {
            self.param_rule = rule
                .parse()
                .with_context(|| format!("invalid {PARAM_RULE_ENV}"))?;
        }
        if let Some(policy) = lookup(ENTROPY_POLICY_ENV) {
            self.entropy_policy = policy
                .parse()
                .with_context(|| format!("invalid {ENTROPY_POLICY_ENV}"))?;
        }
        Ok(())
    }

    pub fn pepper(&self) -> Pepper {
        match &self.pepper {
            Some(secret) => Pepper::new(secret.as_bytes()),
            None => Pepper::disabled(),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("", "", "scryptpw").context("could not determine platform directories")?;

    Ok(project_dirs.config_dir().join("config.json"))
}
