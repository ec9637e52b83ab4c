use crate::errors::SearchCryptoError;
use crate::gf2::matrix_ops::exact_sqrt;
use crate::polynomial::PolynomialFunction;
use crate::polynomial::generators::dense_random_quadratic;
use crate::search::hashing::{HashAlgorithm, HashConfig};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Parameters shared by every key of one search scheme.
///
/// With a `d`-bit digest the search hash and the plaintext block are `d / 2`
/// bits, ciphertexts are `d` bits, the global hash maps `hash || nonce`
/// (`d` bits) to `d / 2` bits, and that output is read as an `s`×`s` matrix
/// with `s² = d / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HashConfig", into = "HashConfig")]
pub struct SearchParams {
    hash: HashConfig,
    /// Side of the squaring matrices and document keys.
    squaring_dimension: usize,
}

impl Default for SearchParams {
    /// BLAKE3 folded from 128 to 64 bits, 8×8 squaring matrices.
    fn default() -> Self {
        Self {
            hash: HashConfig::default(),
            squaring_dimension: 8,
        }
    }
}

impl TryFrom<HashConfig> for SearchParams {
    type Error = SearchCryptoError;

    fn try_from(hash: HashConfig) -> Result<Self, Self::Error> {
        SearchParams::try_with(hash)
    }
}

impl From<SearchParams> for HashConfig {
    fn from(params: SearchParams) -> Self {
        params.hash
    }
}

impl SearchParams {
    /// # Errors
    ///
    /// Returns `SearchCryptoError::InvalidParameters` if the hash config is invalid or half
    /// the digest width is not a perfect square.
    pub fn try_with(hash: HashConfig) -> Result<Self, SearchCryptoError> {
        let hash = HashConfig::try_with(hash.algorithm(), hash.digest_bits())?;
        let squaring_dimension = exact_sqrt(hash.folded_bits()).ok_or_else(|| {
            SearchCryptoError::InvalidParameters(format!(
                "search hash width {} is not a perfect square",
                hash.folded_bits()
            ))
        })?;
        Ok(Self {
            hash,
            squaring_dimension,
        })
    }

    /// Shorthand for `try_with(HashConfig::try_with(algorithm, digest_bits)?)`.
    pub fn with_hash(algorithm: HashAlgorithm, digest_bits: usize) -> Result<Self, SearchCryptoError> {
        Self::try_with(HashConfig::try_with(algorithm, digest_bits)?)
    }

    pub fn hash_config(&self) -> &HashConfig {
        &self.hash
    }

    pub fn search_hash_bits(&self) -> usize {
        self.hash.folded_bits()
    }

    pub fn plaintext_length(&self) -> usize {
        self.search_hash_bits()
    }

    pub fn ciphertext_length(&self) -> usize {
        2 * self.search_hash_bits()
    }

    pub fn global_hash_input_bits(&self) -> usize {
        2 * self.search_hash_bits()
    }

    pub fn squaring_dimension(&self) -> usize {
        self.squaring_dimension
    }

    /// A fresh dense quadratic global hash of the right shape.
    pub fn random_global_hash<R: Rng + ?Sized>(&self, rng: &mut R) -> PolynomialFunction {
        dense_random_quadratic(self.global_hash_input_bits(), self.search_hash_bits(), rng)
    }
}
