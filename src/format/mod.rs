//! Stored record format.
//!
//! ```text
//! N$r$p$salt$digest
//! ```
//!
//! Cost parameters are base-10 integers, the salt is delimiter-free text and
//! the digest is lowercase hex.

use std::fmt;
use std::str::FromStr;

use crate::crypto::ScryptParams;
use crate::error::FormatError;

/// Separates the fields of a record.
pub const DELIMITER: char = '$';

const FIELD_NAMES: [&str; 5] = ["N", "r", "p", "salt", "digest"];

/// A parsed password record.
///
/// Decoding only checks structure. Cost parameters must still be validated
/// before they are used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    params: ScryptParams,
    salt: String,
    digest: String,
}

impl Record {
    pub fn new(params: ScryptParams, salt: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            params,
            salt: salt.into(),
            digest: digest.into(),
        }
    }

    pub fn params(&self) -> &ScryptParams {
        &self.params
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn decode(record: &str) -> Result<Self, FormatError> {
        if record.is_empty() {
            return Err(FormatError::Empty);
        }

        let fields: Vec<&str> = record.split(DELIMITER).collect();
        if fields.len() != FIELD_NAMES.len() {
            return Err(FormatError::FieldCount(fields.len()));
        }

        if let Some((_, name)) = fields
            .iter()
            .zip(FIELD_NAMES)
            .find(|(field, _)| field.is_empty())
        {
            return Err(FormatError::EmptyField(name));
        }

        Ok(Self {
            params: ScryptParams {
                n: parse_cost(fields[0], FIELD_NAMES[0])?,
                r: parse_cost(fields[1], FIELD_NAMES[1])?,
                p: parse_cost(fields[2], FIELD_NAMES[2])?,
            },
            salt: fields[3].to_string(),
            digest: fields[4].to_string(),
        })
    }
}

fn parse_cost(field: &str, name: &'static str) -> Result<u64, FormatError> {
    // u64::from_str accepts a leading '+'
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormatError::NotNumeric(name));
    }
    field.parse().map_err(|_| FormatError::NotNumeric(name))
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = DELIMITER;
        write!(
            f,
            "{}{d}{}{d}{}{d}{}{d}{}",
            self.params.n, self.params.r, self.params.p, self.salt, self.digest
        )
    }
}

impl FromStr for Record {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n: u64, r: u64, p: u64) -> ScryptParams {
        ScryptParams { n, r, p }
    }

    #[test]
    fn encodes_fields_in_order() {
        let record = Record::new(params(16384, 8, 1), "c2FsdA==", "00ff");
        assert_eq!(record.encode(), "16384$8$1$c2FsdA==$00ff");
    }

    #[test]
    fn record_roundtrip() {
        let record = Record::new(params(1024, 8, 2), "fixedsalt", "abcdef");
        let parsed = Record::decode(&record.encode()).unwrap();

        assert_eq!(parsed.params().n(), 1024);
        assert_eq!(parsed.params().r(), 8);
        assert_eq!(parsed.params().p(), 2);
        assert_eq!(parsed.salt(), "fixedsalt");
        assert_eq!(parsed.digest(), "abcdef");
    }

    #[test]
    fn empty_record_fails() {
        assert_eq!(Record::decode(""), Err(FormatError::Empty));
    }

    #[test]
    fn four_fields_fail() {
        assert_eq!(
            Record::decode("16384$8$1$abcd"),
            Err(FormatError::FieldCount(4))
        );
    }

    #[test]
    fn six_fields_fail() {
        assert_eq!(
            Record::decode("16384$8$1$ab$cd$ef"),
            Err(FormatError::FieldCount(6))
        );
    }

    #[test]
    fn empty_field_is_named() {
        assert_eq!(
            Record::decode("16384$8$1$$abcd"),
            Err(FormatError::EmptyField("salt"))
        );
        assert_eq!(
            Record::decode("$8$1$salt$abcd"),
            Err(FormatError::EmptyField("N"))
        );
    }

    #[test]
    fn non_numeric_cost_fails() {
        assert_eq!(
            Record::decode("16384$eight$1$salt$abcd"),
            Err(FormatError::NotNumeric("r"))
        );
        assert_eq!(
            Record::decode("16384$8$-1$salt$abcd"),
            Err(FormatError::NotNumeric("p"))
        );
        assert_eq!(
            Record::decode("+16384$8$1$salt$abcd"),
            Err(FormatError::NotNumeric("N"))
        );
        assert_eq!(
            Record::decode("99999999999999999999999$8$1$salt$abcd"),
            Err(FormatError::NotNumeric("N"))
        );
    }

    #[test]
    fn decode_does_not_validate_costs() {
        let parsed: Record = "6$1$0$salt$abcd".parse().unwrap();
        assert_eq!(parsed.params().n(), 6);
        assert_eq!(parsed.params().p(), 0);
    }
}
