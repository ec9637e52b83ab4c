use crate::errors::SearchCryptoError;
use crate::gf2::matrix_ops::BitMatrix;
use crate::gf2::vector::BitVector;

use serde::{Deserialize, Serialize};

/// Per-document sharing material: `middle = D · Dᵀ` for an invertible document key `D`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BitMatrix", into = "BitMatrix")]
pub struct EncryptedSearchSharingKey {
    document_key: BitMatrix,
    middle: BitMatrix,
}

impl TryFrom<BitMatrix> for EncryptedSearchSharingKey {
    type Error = SearchCryptoError;

    fn try_from(document_key: BitMatrix) -> Result<Self, Self::Error> {
        EncryptedSearchSharingKey::new(document_key)
    }
}

impl From<EncryptedSearchSharingKey> for BitMatrix {
    fn from(key: EncryptedSearchSharingKey) -> Self {
        key.document_key
    }
}

impl EncryptedSearchSharingKey {
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` for a non-square key and
    /// `SearchCryptoError::SingularMatrix` for a singular one.
    pub fn new(document_key: BitMatrix) -> Result<Self, SearchCryptoError> {
        if !document_key.is_square() {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "document key is {}×{}",
                document_key.rows(),
                document_key.cols()
            )));
        }
        if !document_key.is_invertible() {
            return Err(SearchCryptoError::SingularMatrix("document key".into()));
        }
        let middle = document_key.multiply(&document_key.transpose())?;
        Ok(Self {
            document_key,
            middle,
        })
    }

    pub fn document_key(&self) -> &BitMatrix {
        &self.document_key
    }

    pub fn middle(&self) -> &BitMatrix {
        &self.middle
    }

    /// `H · middle · H` for the global hash output `H`; what a document index stores per term.
    pub fn index_value(&self, global_hash_output: &BitVector) -> Result<BitMatrix, SearchCryptoError> {
        let h = BitMatrix::square_from_vector(global_hash_output)?;
        h.multiply(&self.middle)?.multiply(&h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_middle_is_symmetric_and_invertible() {
        let mut rng = ChaCha20Rng::seed_from_u64(50);
        let key = EncryptedSearchSharingKey::new(BitMatrix::random_invertible(8, &mut rng).unwrap()).unwrap();
        assert_eq!(key.middle().transpose(), *key.middle());
        assert!(key.middle().is_invertible());
    }

    #[test]
    fn test_index_value() {
        let mut rng = ChaCha20Rng::seed_from_u64(51);
        let key = EncryptedSearchSharingKey::new(BitMatrix::random_invertible(4, &mut rng).unwrap()).unwrap();
        let output = BitVector::random(16, &mut rng);
        let h = BitMatrix::square_from_vector(&output).unwrap();
        let expected = h
            .multiply(key.document_key())
            .unwrap()
            .multiply(&key.document_key().transpose())
            .unwrap()
            .multiply(&h)
            .unwrap();
        assert_eq!(key.index_value(&output).unwrap(), expected);
        assert!(key.index_value(&BitVector::zeros(15)).is_err());
    }

    #[test]
    fn test_rejects_bad_document_keys() {
        assert!(matches!(
            EncryptedSearchSharingKey::new(BitMatrix::zeros(3, 4)),
            Err(SearchCryptoError::DimensionMismatch(_))
        ));
        assert!(matches!(
            EncryptedSearchSharingKey::new(BitMatrix::zeros(4, 4)),
            Err(SearchCryptoError::SingularMatrix(_))
        ));
    }
}
