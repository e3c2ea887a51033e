use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Digest schemes the hashing utility knows how to compute.
///
/// Hashes produced elsewhere may name algorithms outside this set; they are
/// still valid storage keys, they just cannot be verified locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Canonical wire name, as it appears in [`ContentHash::algorithm`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Blake3 => "BLAKE3",
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "sha256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            _ => Err(TypeError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Normalized content digest: the only key into shared storage.
///
/// Equality is structural over `(algorithm, value)`. A `ContentHash` never
/// carries a file name or path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "ContentHashRepr")]
pub struct ContentHash {
    algorithm: String,
    value: String,
}

/// Wire shape; deserialization goes through [`ContentHash::new`].
#[derive(Deserialize)]
struct ContentHashRepr {
    algorithm: String,
    value: String,
}

impl From<ContentHashRepr> for ContentHash {
    fn from(repr: ContentHashRepr) -> Self {
        Self::new(repr.algorithm, repr.value)
    }
}

impl ContentHash {
    /// Build a hash descriptor, normalizing both parts.
    ///
    /// The algorithm is upper-cased and the value lower-cased, so `sha-256`
    /// / `DEADBEEF` and `SHA-256` / `deadbeef` address the same record.
    /// No validation happens here; see [`Self::validate`].
    pub fn new(algorithm: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        Self {
            algorithm: algorithm.as_ref().trim().to_ascii_uppercase(),
            value: value.as_ref().trim().to_ascii_lowercase(),
        }
    }

    /// Build a hash for a known algorithm from raw digest bytes.
    pub fn from_digest(algorithm: HashAlgorithm, digest: &[u8]) -> Self {
        Self {
            algorithm: algorithm.as_str().to_string(),
            value: hex::encode(digest),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The algorithm, if it is one this crate can compute.
    pub fn known_algorithm(&self) -> Option<HashAlgorithm> {
        self.algorithm.parse().ok()
    }

    /// Both parts are present.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.algorithm.is_empty() {
            return Err(TypeError::MissingAlgorithm);
        }
        if self.value.is_empty() {
            return Err(TypeError::MissingValue);
        }
        Ok(())
    }

    pub fn is_well_formed(&self) -> bool {
        self.validate().is_ok()
    }

    /// First 8 characters of the value, for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .value
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len());
        &self.value[..end]
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}:{})", self.algorithm, self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

impl FromStr for ContentHash {
    type Err = TypeError;

    /// Parses `ALGORITHM:value`. Whitespace around either part is ignored,
    /// which also accepts the `SHA-256: <hex>` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, value) = s
            .split_once(':')
            .ok_or_else(|| TypeError::MalformedHash(s.to_string()))?;
        let hash = Self::new(algorithm, value);
        hash.validate()?;
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalization_makes_case_irrelevant() {
        let a = ContentHash::new("sha-256", "DEADBEEF");
        let b = ContentHash::new(" SHA-256 ", "deadbeef");
        assert_eq!(a, b);
        assert_eq!(a.algorithm(), "SHA-256");
        assert_eq!(a.value(), "deadbeef");
    }

    #[test]
    fn validate_rejects_missing_parts() {
        assert_eq!(
            ContentHash::new("", "abc").validate(),
            Err(TypeError::MissingAlgorithm)
        );
        assert_eq!(
            ContentHash::new("SHA-256", "  ").validate(),
            Err(TypeError::MissingValue)
        );
        assert!(ContentHash::new("SHA-256", "abc").is_well_formed());
    }

    #[test]
    fn parse_accepts_spaced_form() {
        let hash: ContentHash = "SHA-256: 0a1b".parse().unwrap();
        assert_eq!(hash, ContentHash::new("SHA-256", "0a1b"));
    }

    #[test]
    fn parse_rejects_missing_separator() {
        let err = "deadbeef".parse::<ContentHash>().unwrap_err();
        assert!(matches!(err, TypeError::MalformedHash(_)));
        let err = "SHA-256:".parse::<ContentHash>().unwrap_err();
        assert_eq!(err, TypeError::MissingValue);
    }

    #[test]
    fn from_digest_is_lower_hex() {
        let hash = ContentHash::from_digest(HashAlgorithm::Blake3, &[0xAB, 0x01]);
        assert_eq!(hash.to_string(), "BLAKE3:ab01");
        assert_eq!(hash.known_algorithm(), Some(HashAlgorithm::Blake3));
    }

    #[test]
    fn algorithm_names_are_lenient() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("Blake3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
        assert!("md5".parse::<HashAlgorithm>().is_err());
        assert_eq!(ContentHash::new("MD5", "x").known_algorithm(), None);
    }

    #[test]
    fn short_is_bounded() {
        assert_eq!(ContentHash::new("SHA-256", "0123456789").short(), "01234567");
        assert_eq!(ContentHash::new("SHA-256", "ab").short(), "ab");
    }

    #[test]
    fn serde_uses_field_names() {
        let json = serde_json::to_value(ContentHash::new("SHA-256", "ab")).unwrap();
        assert_eq!(json["algorithm"], "SHA-256");
        assert_eq!(json["value"], "ab");
    }

    #[test]
    fn deserialize_normalizes() {
        let hash: ContentHash =
            serde_json::from_str(r#"{"algorithm":"sha-256","value":"DEADBEEF"}"#).unwrap();
        assert_eq!(hash, ContentHash::new("SHA-256", "deadbeef"));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(alg in "[a-zA-Z0-9-]{1,12}", value in "[a-fA-F0-9]{1,64}") {
            let once = ContentHash::new(&alg, &value);
            let twice = ContentHash::new(once.algorithm(), once.value());
            prop_assert_eq!(once, twice);
        }
    }
}
