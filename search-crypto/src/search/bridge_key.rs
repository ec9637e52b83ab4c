use crate::errors::SearchCryptoError;
use crate::gf2::matrix_ops::BitMatrix;
use crate::gf2::vector::BitVector;
use crate::search::private_key::EncryptedSearchPrivateKey;
use crate::search::sharing_key::EncryptedSearchSharingKey;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lets a server compare hasher outputs against a document index without
/// learning either squaring matrix: `bridge = Lsq⁻¹ · middle · Rsq⁻¹`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSearchBridgeKey {
    bridge: BitMatrix,
}

impl EncryptedSearchBridgeKey {
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the document key and the squaring
    /// matrices differ in size.
    pub fn new(
        private_key: &EncryptedSearchPrivateKey,
        sharing_key: &EncryptedSearchSharingKey,
    ) -> Result<Self, SearchCryptoError> {
        let bridge = private_key
            .left_squaring_matrix()
            .inverse()?
            .multiply(sharing_key.middle())?
            .multiply(&private_key.right_squaring_matrix().inverse()?)?;
        debug!(dimension = bridge.rows(), "built bridge key");
        Ok(Self { bridge })
    }

    pub fn bridge(&self) -> &BitMatrix {
        &self.bridge
    }

    /// `(H·Lsq) · bridge · (Rsq·H) = H · middle · H`.
    pub fn evaluate(
        &self,
        left_output: &BitVector,
        right_output: &BitVector,
    ) -> Result<BitMatrix, SearchCryptoError> {
        let hl = BitMatrix::square_from_vector(left_output)?;
        let hr = BitMatrix::square_from_vector(right_output)?;
        hl.multiply(&self.bridge)?.multiply(&hr)
    }

    /// Whether the hasher outputs match a stored index value.
    pub fn matches(
        &self,
        left_output: &BitVector,
        right_output: &BitVector,
        index_value: &BitMatrix,
    ) -> Result<bool, SearchCryptoError> {
        Ok(self.evaluate(left_output, right_output)? == *index_value)
    }
}
