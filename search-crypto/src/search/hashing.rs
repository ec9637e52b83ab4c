//! Term hashing: a configurable digest folded to half width.

use crate::errors::SearchCryptoError;
use crate::gf2::vector::BitVector;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest backing the term hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// BLAKE3 in extendable-output mode; any byte-aligned width.
    Blake3,
    /// SHA-256 truncated to the configured width; at most 256 bits.
    Sha256,
}

/// Which digest to use and how many of its bits to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HashConfigRepr", into = "HashConfigRepr")]
pub struct HashConfig {
    algorithm: HashAlgorithm,
    digest_bits: usize,
}

#[derive(Serialize, Deserialize)]
struct HashConfigRepr {
    algorithm: HashAlgorithm,
    digest_bits: usize,
}

impl TryFrom<HashConfigRepr> for HashConfig {
    type Error = SearchCryptoError;

    fn try_from(repr: HashConfigRepr) -> Result<Self, Self::Error> {
        HashConfig::try_with(repr.algorithm, repr.digest_bits)
    }
}

impl From<HashConfig> for HashConfigRepr {
    fn from(config: HashConfig) -> Self {
        HashConfigRepr {
            algorithm: config.algorithm,
            digest_bits: config.digest_bits,
        }
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Blake3,
            digest_bits: 128,
        }
    }
}

impl HashConfig {
    /// # Errors
    ///
    /// Returns `SearchCryptoError::InvalidParameters` if `digest_bits` is zero, not a multiple
    /// of 8, or wider than the algorithm can produce.
    pub fn try_with(algorithm: HashAlgorithm, digest_bits: usize) -> Result<Self, SearchCryptoError> {
        if digest_bits == 0 || digest_bits % 8 != 0 {
            return Err(SearchCryptoError::InvalidParameters(format!(
                "digest width must be a positive multiple of 8, got {}",
                digest_bits
            )));
        }
        if algorithm == HashAlgorithm::Sha256 && digest_bits > 256 {
            return Err(SearchCryptoError::InvalidParameters(format!(
                "SHA-256 cannot produce {} bits",
                digest_bits
            )));
        }
        Ok(Self {
            algorithm,
            digest_bits,
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn digest_bits(&self) -> usize {
        self.digest_bits
    }

    /// Width of the folded hash.
    pub fn folded_bits(&self) -> usize {
        self.digest_bits / 2
    }

    /// The first `digest_bits` bits of the digest of `bytes`.
    pub fn digest(&self, bytes: &[u8]) -> Result<BitVector, SearchCryptoError> {
        let byte_len = self.digest_bits / 8;
        let raw = match self.algorithm {
            HashAlgorithm::Blake3 => {
                let mut out = vec![0u8; byte_len];
                blake3::Hasher::new()
                    .update(bytes)
                    .finalize_xof()
                    .fill(&mut out);
                out
            }
            HashAlgorithm::Sha256 => {
                let full = Sha256::digest(bytes);
                full.get(..byte_len)
                    .ok_or_else(|| {
                        SearchCryptoError::InvalidParameters(format!(
                            "SHA-256 cannot produce {} bits",
                            self.digest_bits
                        ))
                    })?
                    .to_vec()
            }
        };
        BitVector::from_bytes(self.digest_bits, &raw)
    }

    /// Digest of the UTF-8 bytes of `term`, with the low half XORed onto the high half.
    pub fn search_hash(&self, term: &str) -> Result<BitVector, SearchCryptoError> {
        let digest = self.digest(term.as_bytes())?;
        let half = self.folded_bits();
        digest.range(0, half)?.xor(&digest.range(half, self.digest_bits)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_hash_is_folded_digest() {
        let config = HashConfig::default();
        let digest = config.digest(b"risefall").unwrap();
        let folded = config.search_hash("risefall").unwrap();
        assert_eq!(folded.len(), 64);
        for i in 0..64 {
            assert_eq!(folded.get(i), digest.get(i) ^ digest.get(i + 64));
        }
    }

    #[test]
    fn test_hash_is_deterministic_and_term_sensitive() {
        for algorithm in [HashAlgorithm::Blake3, HashAlgorithm::Sha256] {
            let config = HashConfig::try_with(algorithm, 128).unwrap();
            assert_eq!(
                config.search_hash("barbarian").unwrap(),
                config.search_hash("barbarian").unwrap()
            );
            assert_ne!(
                config.search_hash("barbarian").unwrap(),
                config.search_hash("barbarians").unwrap()
            );
        }
    }

    #[test]
    fn test_algorithms_differ() {
        let blake = HashConfig::try_with(HashAlgorithm::Blake3, 128).unwrap();
        let sha = HashConfig::try_with(HashAlgorithm::Sha256, 128).unwrap();
        assert_ne!(blake.digest(b"term").unwrap(), sha.digest(b"term").unwrap());
    }

    #[test]
    fn test_sha256_prefix() {
        let config = HashConfig::try_with(HashAlgorithm::Sha256, 256).unwrap();
        let digest = config.digest(b"abc").unwrap();
        let expected = BitVector::from_bytes(256, &Sha256::digest(b"abc")).unwrap();
        assert_eq!(digest, expected);
    }

    #[test]
    fn test_deserialize_revalidates() {
        let too_wide = r#"{"algorithm":"Sha256","digest_bits":512}"#;
        assert!(serde_json::from_str::<HashConfig>(too_wide).is_err());
        let unaligned = r#"{"algorithm":"Blake3","digest_bits":12}"#;
        assert!(serde_json::from_str::<HashConfig>(unaligned).is_err());

        let config = HashConfig::try_with(HashAlgorithm::Sha256, 256).unwrap();
        let back: HashConfig = serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.search_hash("risefall").unwrap().len(), 128);
    }

    #[test]
    fn test_invalid_widths() {
        assert!(HashConfig::try_with(HashAlgorithm::Blake3, 0).is_err());
        assert!(HashConfig::try_with(HashAlgorithm::Blake3, 12).is_err());
        assert!(HashConfig::try_with(HashAlgorithm::Sha256, 264).is_err());
        assert!(HashConfig::try_with(HashAlgorithm::Blake3, 512).is_ok());
    }
}
