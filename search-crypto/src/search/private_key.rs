use crate::errors::SearchCryptoError;
use crate::gf2::matrix_ops::BitMatrix;
use crate::gf2::vector::BitVector;
use crate::keypair::{Decryptor, Encryptor};
use crate::polynomial::PolynomialFunction;
use crate::search::params::SearchParams;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The searcher's secret: two invertible squaring matrices `Lsq` and `Rsq`
/// that blind the two halves of every query hasher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PrivateKeyRepr", into = "PrivateKeyRepr")]
pub struct EncryptedSearchPrivateKey {
    params: SearchParams,
    left_squaring_matrix: BitMatrix,
    right_squaring_matrix: BitMatrix,
}

#[derive(Serialize, Deserialize)]
struct PrivateKeyRepr {
    params: SearchParams,
    #[serde(rename = "leftMatrix")]
    left_matrix: BitMatrix,
    #[serde(rename = "rightMatrix")]
    right_matrix: BitMatrix,
}

impl TryFrom<PrivateKeyRepr> for EncryptedSearchPrivateKey {
    type Error = SearchCryptoError;

    fn try_from(repr: PrivateKeyRepr) -> Result<Self, Self::Error> {
        EncryptedSearchPrivateKey::with_matrices(repr.params, repr.left_matrix, repr.right_matrix)
    }
}

impl From<EncryptedSearchPrivateKey> for PrivateKeyRepr {
    fn from(key: EncryptedSearchPrivateKey) -> Self {
        PrivateKeyRepr {
            params: key.params,
            left_matrix: key.left_squaring_matrix,
            right_matrix: key.right_squaring_matrix,
        }
    }
}

/// Two blinded views of `global_hash ∘ mirrored_decrypt`.
///
/// On `token || nonce_token` the left half yields `H·Lsq` and the right half
/// `Rsq·H`, where `H` is the global hash output read as a square matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHasherPair {
    pub left: PolynomialFunction,
    pub right: PolynomialFunction,
}

impl QueryHasherPair {
    /// Evaluates both halves on `token || nonce_token`.
    pub fn evaluate(
        &self,
        token: &BitVector,
        nonce_token: &BitVector,
    ) -> Result<(BitVector, BitVector), SearchCryptoError> {
        let input = token.concat(nonce_token);
        Ok((self.left.apply(&input)?, self.right.apply(&input)?))
    }
}

impl EncryptedSearchPrivateKey {
    /// Samples both squaring matrices.
    pub fn generate<R: Rng + ?Sized>(params: SearchParams, rng: &mut R) -> Result<Self, SearchCryptoError> {
        let n = params.squaring_dimension();
        let left_squaring_matrix = BitMatrix::random_invertible(n, rng)?;
        let right_squaring_matrix = BitMatrix::random_invertible(n, rng)?;
        debug!(squaring_dimension = n, "generated search private key");
        Ok(Self {
            params,
            left_squaring_matrix,
            right_squaring_matrix,
        })
    }

    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if either matrix is not
    /// `squaring_dimension`-square, and `SearchCryptoError::SingularMatrix` if either is singular.
    pub fn with_matrices(
        params: SearchParams,
        left: BitMatrix,
        right: BitMatrix,
    ) -> Result<Self, SearchCryptoError> {
        let n = params.squaring_dimension();
        for (name, m) in [("left", &left), ("right", &right)] {
            if m.rows() != n || m.cols() != n {
                return Err(SearchCryptoError::DimensionMismatch(format!(
                    "{} squaring matrix is {}×{}, expected {}×{}",
                    name,
                    m.rows(),
                    m.cols(),
                    n,
                    n
                )));
            }
            if !m.is_invertible() {
                return Err(SearchCryptoError::SingularMatrix(format!(
                    "{} squaring matrix",
                    name
                )));
            }
        }
        Ok(Self {
            params,
            left_squaring_matrix: left,
            right_squaring_matrix: right,
        })
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn left_squaring_matrix(&self) -> &BitMatrix {
        &self.left_squaring_matrix
    }

    pub fn right_squaring_matrix(&self) -> &BitMatrix {
        &self.right_squaring_matrix
    }

    /// The folded search hash of `term`.
    pub fn hash(&self, term: &str) -> Result<BitVector, SearchCryptoError> {
        self.params.hash_config().search_hash(term)
    }

    /// Encrypts `hash(term)` under a fresh nonce of the same width.
    pub fn prepare_search_token<E, R>(
        &self,
        public_key: &E,
        term: &str,
        rng: &mut R,
    ) -> Result<BitVector, SearchCryptoError>
    where
        E: Encryptor + ?Sized,
        R: Rng + ?Sized,
    {
        let hash = self.hash(term)?;
        let nonce = BitVector::random(hash.len(), rng);
        public_key.encrypter().apply_halves(&hash, &nonce)
    }

    /// Builds the blinded hasher pair for `global_hash` under `keypair`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `global_hash` does not consume the
    /// mirrored plaintexts or its output is not `squaring_dimension²` bits.
    pub fn query_hasher_pair<K>(
        &self,
        global_hash: &PolynomialFunction,
        keypair: &K,
    ) -> Result<QueryHasherPair, SearchCryptoError>
    where
        K: Decryptor + ?Sized,
    {
        let composed = global_hash.compose(keypair.mirrored_decrypter())?;
        let left = composed.right_multiply(&self.left_squaring_matrix)?;
        let right = composed.left_multiply(&self.right_squaring_matrix)?;
        debug!(
            input_length = composed.input_length(),
            monomials = composed.terms().monomial_count(),
            "built query hasher pair"
        );
        Ok(QueryHasherPair { left, right })
    }

    /// Strips the squaring matrices from a hasher pair's outputs: `H·Lsq, Rsq·H ↦ H·H`.
    pub fn unblind(
        &self,
        left_output: &BitVector,
        right_output: &BitVector,
    ) -> Result<BitMatrix, SearchCryptoError> {
        let hl = BitMatrix::square_from_vector(left_output)?;
        let hr = BitMatrix::square_from_vector(right_output)?;
        hl.multiply(&self.left_squaring_matrix.inverse()?)?
            .multiply(&self.right_squaring_matrix.inverse()?)?
            .multiply(&hr)
    }

    /// A fresh document key for an [`EncryptedSearchSharingKey`](crate::search::EncryptedSearchSharingKey).
    pub fn new_document_key<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<BitMatrix, SearchCryptoError> {
        BitMatrix::random_invertible(self.params.squaring_dimension(), rng)
    }
}
