use crate::errors::SearchCryptoError;
use crate::gf2::matrix_ops::BitMatrix;
use crate::gf2::vector::BitVector;
use crate::keypair::{Decryptor, Encryptor};
use crate::polynomial::generators::{dense_random_quadratic, identity, linear};
use crate::polynomial::{PolynomialFunction, Terms};
use crate::search::params::SearchParams;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Keypair over `n`-bit plaintexts and `c`-bit ciphertexts.
///
/// Encryption of `m` with a fresh `(c - n)`-bit nonce `r` is
/// `E · (m || r ⊕ F(r))` for an invertible `E` and a random quadratic mask `F`,
/// so the public encrypter is quadratic while decryption is the affine map
/// "first `n` rows of `E⁻¹`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PrivateKeyRepr", into = "PrivateKeyRepr")]
pub struct PrivateKey {
    plaintext_length: usize,
    ciphertext_length: usize,
    encrypter: PolynomialFunction,
    decrypter: PolynomialFunction,
    mirrored_decrypter: PolynomialFunction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyRepr", into = "PublicKeyRepr")]
pub struct PublicKey {
    plaintext_length: usize,
    ciphertext_length: usize,
    encrypter: PolynomialFunction,
}

#[derive(Serialize, Deserialize)]
struct PrivateKeyRepr {
    plaintext_length: usize,
    ciphertext_length: usize,
    encrypter: PolynomialFunction,
    decrypter: PolynomialFunction,
    mirrored_decrypter: PolynomialFunction,
}

#[derive(Serialize, Deserialize)]
struct PublicKeyRepr {
    plaintext_length: usize,
    ciphertext_length: usize,
    encrypter: PolynomialFunction,
}

impl TryFrom<PrivateKeyRepr> for PrivateKey {
    type Error = SearchCryptoError;

    fn try_from(repr: PrivateKeyRepr) -> Result<Self, Self::Error> {
        let (n, c) = (repr.plaintext_length, repr.ciphertext_length);
        check_lengths(n, c)?;
        check_shape("encrypter", &repr.encrypter, c, c)?;
        check_shape("decrypter", &repr.decrypter, c, n)?;
        check_shape("mirrored decrypter", &repr.mirrored_decrypter, 2 * c, 2 * n)?;
        Ok(PrivateKey {
            plaintext_length: n,
            ciphertext_length: c,
            encrypter: repr.encrypter,
            decrypter: repr.decrypter,
            mirrored_decrypter: repr.mirrored_decrypter,
        })
    }
}

impl From<PrivateKey> for PrivateKeyRepr {
    fn from(key: PrivateKey) -> Self {
        PrivateKeyRepr {
            plaintext_length: key.plaintext_length,
            ciphertext_length: key.ciphertext_length,
            encrypter: key.encrypter,
            decrypter: key.decrypter,
            mirrored_decrypter: key.mirrored_decrypter,
        }
    }
}

impl TryFrom<PublicKeyRepr> for PublicKey {
    type Error = SearchCryptoError;

    fn try_from(repr: PublicKeyRepr) -> Result<Self, Self::Error> {
        check_lengths(repr.plaintext_length, repr.ciphertext_length)?;
        check_shape("encrypter", &repr.encrypter, repr.ciphertext_length, repr.ciphertext_length)?;
        Ok(PublicKey {
            plaintext_length: repr.plaintext_length,
            ciphertext_length: repr.ciphertext_length,
            encrypter: repr.encrypter,
        })
    }
}

impl From<PublicKey> for PublicKeyRepr {
    fn from(key: PublicKey) -> Self {
        PublicKeyRepr {
            plaintext_length: key.plaintext_length,
            ciphertext_length: key.ciphertext_length,
            encrypter: key.encrypter,
        }
    }
}

fn check_lengths(plaintext_length: usize, ciphertext_length: usize) -> Result<(), SearchCryptoError> {
    if plaintext_length == 0 || plaintext_length >= ciphertext_length {
        return Err(SearchCryptoError::InvalidParameters(format!(
            "need 0 < plaintext length < ciphertext length, got {} and {}",
            plaintext_length, ciphertext_length
        )));
    }
    Ok(())
}

fn check_shape(
    name: &str,
    f: &PolynomialFunction,
    input_length: usize,
    output_length: usize,
) -> Result<(), SearchCryptoError> {
    if f.input_length() != input_length || f.output_length() != output_length {
        return Err(SearchCryptoError::DimensionMismatch(format!(
            "{} maps {} to {} bits, expected {} to {}",
            name,
            f.input_length(),
            f.output_length(),
            input_length,
            output_length
        )));
    }
    Ok(())
}

impl PrivateKey {
    /// Keypair sized for `params`: plaintexts are search hashes, ciphertexts twice as wide.
    pub fn try_with<R: Rng + ?Sized>(params: &SearchParams, rng: &mut R) -> Result<Self, SearchCryptoError> {
        Self::generate(params.ciphertext_length(), params.plaintext_length(), rng)
    }

    /// # Errors
    ///
    /// Returns `SearchCryptoError::InvalidParameters` unless `0 < plaintext_length < ciphertext_length`,
    /// and `SearchCryptoError::InternalError` if no invertible matrix could be sampled.
    pub fn generate<R: Rng + ?Sized>(
        ciphertext_length: usize,
        plaintext_length: usize,
        rng: &mut R,
    ) -> Result<Self, SearchCryptoError> {
        check_lengths(plaintext_length, ciphertext_length)?;
        let nonce_length = ciphertext_length - plaintext_length;

        let e = BitMatrix::random_invertible(ciphertext_length, rng)?;
        let mask = dense_random_quadratic(nonce_length, nonce_length, rng);

        // m || r  ↦  m || r ⊕ F(r)
        let nonce = Terms::projection(ciphertext_length, plaintext_length, nonce_length)?;
        let masked_nonce = Terms::stack_outputs(
            &Terms::zero(ciphertext_length, plaintext_length),
            &mask.terms().compose(&nonce)?,
        )?;
        let blinded = identity(ciphertext_length).terms().xor(&masked_nonce)?;
        let encrypter = linear(&e).compose(&PolynomialFunction::from(blinded))?;

        let d = e.inverse()?.row_range(0, plaintext_length)?;
        let decrypter = linear(&d);
        let mirrored_decrypter = linear(&BitMatrix::block_diagonal(&d, &d));

        debug!(
            ciphertext_length,
            plaintext_length,
            encrypter_monomials = encrypter.terms().monomial_count(),
            "generated keypair"
        );

        Ok(Self {
            plaintext_length,
            ciphertext_length,
            encrypter,
            decrypter,
            mirrored_decrypter,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            plaintext_length: self.plaintext_length,
            ciphertext_length: self.ciphertext_length,
            encrypter: self.encrypter.clone(),
        }
    }

    pub fn plaintext_length(&self) -> usize {
        self.plaintext_length
    }

    pub fn ciphertext_length(&self) -> usize {
        self.ciphertext_length
    }

    pub fn decrypt(&self, ciphertext: &BitVector) -> Result<BitVector, SearchCryptoError> {
        self.decrypter.apply(ciphertext)
    }
}

impl PublicKey {
    pub fn plaintext_length(&self) -> usize {
        self.plaintext_length
    }

    pub fn ciphertext_length(&self) -> usize {
        self.ciphertext_length
    }

    /// Encrypts `plaintext` under a fresh random nonce.
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        plaintext: &BitVector,
        rng: &mut R,
    ) -> Result<BitVector, SearchCryptoError> {
        let nonce_length = self
            .encrypter
            .input_length()
            .checked_sub(plaintext.len())
            .ok_or_else(|| {
                SearchCryptoError::DimensionMismatch(format!(
                    "plaintext of {} bits exceeds the encrypter input of {} bits",
                    plaintext.len(),
                    self.encrypter.input_length()
                ))
            })?;
        let nonce = BitVector::random(nonce_length, rng);
        self.encrypt_with_nonce(plaintext, &nonce)
    }

    pub fn encrypt_with_nonce(
        &self,
        plaintext: &BitVector,
        nonce: &BitVector,
    ) -> Result<BitVector, SearchCryptoError> {
        if plaintext.len() != self.plaintext_length {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "plaintext of {} bits for a key over {} bits",
                plaintext.len(),
                self.plaintext_length
            )));
        }
        self.encrypter.apply(&plaintext.concat(nonce))
    }
}

impl Encryptor for PrivateKey {
    fn encrypter(&self) -> &PolynomialFunction {
        &self.encrypter
    }
}

impl Encryptor for PublicKey {
    fn encrypter(&self) -> &PolynomialFunction {
        &self.encrypter
    }
}

impl Decryptor for PrivateKey {
    fn decrypter(&self) -> &PolynomialFunction {
        &self.decrypter
    }

    fn mirrored_decrypter(&self) -> &PolynomialFunction {
        &self.mirrored_decrypter
    }
}
