use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{MAX_KEY_LEN, MIN_KEY_LEN};
use crate::error::{KdfError, ParameterError, Result};

/// Which lower bounds apply to `r` and `p`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamRule {
    /// `r > 1` and `p > 1`.
    #[default]
    Strict,
    /// `r > 0` and `p > 0`, as older records were written.
    Legacy,
}

impl ParamRule {
    /// `r` and `p` must be strictly greater than this.
    fn floor(self) -> u64 {
        match self {
            ParamRule::Strict => 1,
            ParamRule::Legacy => 0,
        }
    }
}

impl std::str::FromStr for ParamRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ParamRule::Strict),
            "legacy" => Ok(ParamRule::Legacy),
            other => anyhow::bail!("unknown parameter rule '{other}'"),
        }
    }
}

/// Scrypt cost parameters.
///
/// Fields missing from a config file take their [`Default`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScryptParams {
    pub(crate) n: u64,
    pub(crate) r: u64,
    pub(crate) p: u64,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            // 16 MiB with r = 8
            n: 16384,
            r: 8,
            // lowest value the strict rule accepts
            p: 2,
        }
    }
}

impl ScryptParams {
    /// Builds parameters that pass the strict rule.
    pub fn new(n: u64, r: u64, p: u64) -> Result<Self, ParameterError> {
        Self::with_rule(n, r, p, ParamRule::Strict)
    }

    pub fn with_rule(n: u64, r: u64, p: u64, rule: ParamRule) -> Result<Self, ParameterError> {
        let params = Self { n, r, p };
        params.validate(rule)?;
        Ok(params)
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn r(&self) -> u64 {
        self.r
    }

    pub fn p(&self) -> u64 {
        self.p
    }

    pub fn validate(&self, rule: ParamRule) -> Result<(), ParameterError> {
        if self.n <= 1 || self.n & (self.n - 1) != 0 {
            return Err(ParameterError::NotPowerOfTwo(self.n));
        }

        let min = rule.floor();
        if self.r <= min {
            return Err(ParameterError::RTooSmall { got: self.r, min });
        }
        if self.p <= min {
            return Err(ParameterError::PTooSmall { got: self.p, min });
        }

        let r = u32::try_from(self.r).map_err(|_| ParameterError::RTooLarge)?;
        let p = u32::try_from(self.p).map_err(|_| ParameterError::PTooLarge)?;
        let n = usize::try_from(self.n).map_err(|_| ParameterError::NTooLarge)?;

        let r128 = (r as usize)
            .checked_mul(128)
            .ok_or(ParameterError::RTooLarge)?;
        r128.checked_mul(n).ok_or(ParameterError::NTooLarge)?;
        r128.checked_mul(p as usize)
            .ok_or(ParameterError::RTooLarge)?;

        if u64::from(r) * u64::from(p) >= 1 << 30 {
            return Err(ParameterError::BlockCountTooLarge);
        }

        Ok(())
    }

    /// Working memory scrypt allocates for these parameters, in bytes.
    ///
    /// Returns `None` when the figure does not fit in a `u64`.
    pub fn memory_required(&self) -> Option<u64> {
        // V is 128 * r * N, B is 128 * r * p, XY is 256 * r
        let blocks = self.n.checked_add(self.p)?.checked_add(2)?;
        self.r.checked_mul(128)?.checked_mul(blocks)
    }

    fn to_kdf(self) -> Result<scrypt::Params> {
        let log_n = self.n.trailing_zeros() as u8;
        let r = u32::try_from(self.r).map_err(|_| ParameterError::RTooLarge)?;
        let p = u32::try_from(self.p).map_err(|_| ParameterError::PTooLarge)?;

        scrypt::Params::new(log_n, r, p, scrypt::Params::RECOMMENDED_LEN)
            .map_err(|_| KdfError::InvalidParams.into())
    }
}

impl std::fmt::Display for ScryptParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "N={} r={} p={}", self.n, self.r, self.p)
    }
}

fn check_key_len(key_len: usize) -> Result<(), ParameterError> {
    if key_len < MIN_KEY_LEN || key_len as u64 > MAX_KEY_LEN {
        return Err(ParameterError::KeyLength(key_len));
    }
    Ok(())
}

/// Runs scrypt and returns `key_len` raw bytes.
///
/// Only the bounds scrypt itself imposes are enforced here (`N` a power of
/// two above 1, `r` and `p` positive). Record hashing applies its own rule
/// before it gets this far.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    params: &ScryptParams,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    check_key_len(key_len)?;
    params.validate(ParamRule::Legacy)?;

    let kdf = params.to_kdf()?;

    let mut key = Zeroizing::new(vec![0u8; key_len]);
    scrypt::scrypt(password, salt, &kdf, &mut key).map_err(|_| KdfError::InvalidOutputLen)?;

    Ok(key)
}

/// Same as [`derive`], rendered as lowercase hex.
pub fn derive_hex(
    password: &[u8],
    salt: &[u8],
    params: &ScryptParams,
    key_len: usize,
) -> Result<String> {
    let key = derive(password, salt, params, key_len)?;
    Ok(hex::encode(&*key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn raw(n: u64, r: u64, p: u64) -> ScryptParams {
        ScryptParams { n, r, p }
    }

    #[test]
    fn rejects_n_zero() {
        assert_eq!(
            raw(0, 8, 2).validate(ParamRule::Strict),
            Err(ParameterError::NotPowerOfTwo(0))
        );
    }

    #[test]
    fn rejects_n_one() {
        assert_eq!(
            raw(1, 8, 2).validate(ParamRule::Legacy),
            Err(ParameterError::NotPowerOfTwo(1))
        );
    }

    #[test]
    fn rejects_n_not_power_of_two() {
        assert_eq!(
            raw(6, 8, 2).validate(ParamRule::Strict),
            Err(ParameterError::NotPowerOfTwo(6))
        );
    }

    #[test]
    fn rejects_r_one_under_strict_rule() {
        assert_eq!(
            raw(16384, 1, 2).validate(ParamRule::Strict),
            Err(ParameterError::RTooSmall { got: 1, min: 1 })
        );
        assert!(raw(16384, 1, 2).validate(ParamRule::Legacy).is_ok());
    }

    #[test]
    fn rejects_p_zero() {
        assert_eq!(
            raw(16384, 8, 0).validate(ParamRule::Legacy),
            Err(ParameterError::PTooSmall { got: 0, min: 0 })
        );
    }

    #[test]
    fn strict_rule_rejects_p_one() {
        assert_eq!(
            raw(16384, 8, 1).validate(ParamRule::Strict),
            Err(ParameterError::PTooSmall { got: 1, min: 1 })
        );
    }

    #[test]
    fn legacy_rule_accepts_p_one() {
        assert!(raw(16384, 8, 1).validate(ParamRule::Legacy).is_ok());
    }

    #[test]
    fn default_params_pass_strict_rule() {
        assert!(ScryptParams::default().validate(ParamRule::Strict).is_ok());
    }

    #[test]
    fn oversized_n_is_reported_not_wrapped() {
        assert_eq!(
            raw(1 << 62, 8, 2).validate(ParamRule::Strict),
            Err(ParameterError::NTooLarge)
        );
    }

    #[test]
    fn r_above_u32_is_too_large() {
        assert_eq!(
            raw(16, u64::from(u32::MAX) + 1, 2).validate(ParamRule::Strict),
            Err(ParameterError::RTooLarge)
        );
    }

    #[test]
    fn block_buffer_overflow_is_r_too_large() {
        // 128 * r fits, 128 * r * p does not
        assert_eq!(
            raw(16, 1 << 31, 1 << 31).validate(ParamRule::Strict),
            Err(ParameterError::RTooLarge)
        );
    }

    #[test]
    fn block_count_bound() {
        assert_eq!(
            raw(16, 1 << 15, 1 << 15).validate(ParamRule::Strict),
            Err(ParameterError::BlockCountTooLarge)
        );
    }

    #[test]
    fn memory_required_counts_all_buffers() {
        assert_eq!(
            raw(16384, 8, 2).memory_required(),
            Some(128 * 8 * (16384 + 2 + 2))
        );
        assert_eq!(raw(u64::MAX, 8, 2).memory_required(), None);
    }

    #[test]
    fn new_validates_strictly() {
        assert!(ScryptParams::new(16384, 8, 1).is_err());
        assert!(ScryptParams::with_rule(16384, 8, 1, ParamRule::Legacy).is_ok());
    }

    #[test]
    fn param_rule_parses_case_insensitively() {
        assert_eq!("STRICT".parse::<ParamRule>().unwrap(), ParamRule::Strict);
        assert_eq!("legacy".parse::<ParamRule>().unwrap(), ParamRule::Legacy);
        assert!("loose".parse::<ParamRule>().is_err());
    }

    #[test]
    fn derive_matches_rfc7914_vector() {
        let key = derive_hex(b"", b"", &raw(16, 1, 1), 64).unwrap();
        assert_eq!(
            key,
            "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede2144\
             2fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906"
        );
    }

    #[test]
    fn derive_is_deterministic() {
        let params = raw(16, 2, 2);
        let k1 = derive(b"password", b"salt", &params, 32).unwrap();
        let k2 = derive(b"password", b"salt", &params, 32).unwrap();
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn params_affect_output() {
        let k1 = derive(b"pw", b"salt", &raw(16, 2, 2), 32).unwrap();
        let k2 = derive(b"pw", b"salt", &raw(32, 2, 2), 32).unwrap();
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn derive_rejects_short_keys() {
        match derive(b"pw", b"salt", &raw(16, 2, 2), 15) {
            Err(Error::Parameter(ParameterError::KeyLength(15))) => {}
            other => panic!("expected KeyLength error, got: {other:?}"),
        }
    }

    #[test]
    fn derive_rejects_non_power_of_two() {
        assert!(matches!(
            derive(b"pw", b"salt", &raw(24, 2, 2), 32),
            Err(Error::Parameter(ParameterError::NotPowerOfTwo(24)))
        ));
    }

    #[test]
    fn kdf_refusal_is_a_kdf_error() {
        // scrypt needs log2(N) < 16 * r
        assert!(matches!(
            derive(b"pw", b"salt", &raw(1 << 16, 1, 1), 32),
            Err(Error::Kdf(KdfError::InvalidParams))
        ));
    }
}
