//! # Keypair Module
//!
//! The encryption capability the search protocol composes with. The protocol
//! only ever sees these polynomial functions; [`keys`] provides a concrete
//! keypair with an affine decrypter.

pub mod keys;

use crate::polynomial::PolynomialFunction;

/// Holder of an encrypting function over `plaintext || nonce`.
pub trait Encryptor {
    fn encrypter(&self) -> &PolynomialFunction;
}

/// Holder of the decrypting functions matching some [`Encryptor`].
///
/// `decrypter(encrypter(m || r)) == m`, and the mirrored decrypter decrypts two
/// concatenated ciphertexts at once: `mirrored(c1 || c2) == decrypt(c1) || decrypt(c2)`.
pub trait Decryptor {
    fn decrypter(&self) -> &PolynomialFunction;
    fn mirrored_decrypter(&self) -> &PolynomialFunction;
}
