//! Wire format for bit vectors.
//!
//! A vector is framed as `{ bit_count: u32, words[0]: u64, ..., words[n-1]: u64 }`,
//! all big-endian, and the frame is Base64 encoded with the standard alphabet.
//! Every other serialisable type in the crate nests these strings through serde.

use crate::errors::SearchCryptoError;
use crate::gf2::vector::{BitVector, words_for};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use std::fmt;

// Constants for the frame layout
const LENGTH_BYTES: usize = std::mem::size_of::<u32>();
const WORD_BYTES: usize = std::mem::size_of::<u64>();

/// Frames `vector` and Base64 encodes the frame.
///
/// # Errors
///
/// Returns `SearchCryptoError::InvalidParameters` if the bit count does not fit the 4-byte
/// length field.
///
/// # Example
///
/// ```
/// # use search_crypto::codec::{decode_bit_vector, encode_bit_vector};
/// # use search_crypto::gf2::BitVector;
/// let v = BitVector::unit(70, 65).unwrap();
/// let encoded = encode_bit_vector(&v).unwrap();
/// assert_eq!(decode_bit_vector(&encoded).unwrap(), v);
/// ```
pub fn encode_bit_vector(vector: &BitVector) -> Result<String, SearchCryptoError> {
    let len = u32::try_from(vector.len()).map_err(|_| {
        SearchCryptoError::InvalidParameters(format!(
            "bit vector of {} bits exceeds the wire length field",
            vector.len()
        ))
    })?;

    let mut frame = Vec::with_capacity(LENGTH_BYTES + vector.words().len() * WORD_BYTES);
    frame.extend_from_slice(&len.to_be_bytes());
    for word in vector.words() {
        frame.extend_from_slice(&word.to_be_bytes());
    }
    Ok(STANDARD.encode(frame))
}

/// Decodes a Base64 frame produced by [`encode_bit_vector`].
///
/// # Errors
///
/// Returns `SearchCryptoError::DecodingError` if the input is not Base64, the frame is shorter
/// than the length field, the word section is not a whole number of 8-byte words, the word
/// count disagrees with the declared bit count, or bits are set past the declared length.
pub fn decode_bit_vector(encoded: &str) -> Result<BitVector, SearchCryptoError> {
    let frame = STANDARD
        .decode(encoded)
        .map_err(|e| SearchCryptoError::DecodingError(format!("Base64 decoding failed: {}", e)))?;

    if frame.len() < LENGTH_BYTES {
        return Err(SearchCryptoError::DecodingError(format!(
            "frame of {} bytes has no length field",
            frame.len()
        )));
    }
    let (header, body) = frame.split_at(LENGTH_BYTES);
    if body.len() % WORD_BYTES != 0 {
        return Err(SearchCryptoError::DecodingError(format!(
            "word section of {} bytes is not a multiple of {}",
            body.len(),
            WORD_BYTES
        )));
    }

    let mut len_bytes = [0u8; LENGTH_BYTES];
    len_bytes.copy_from_slice(header);
    let len = u32::from_be_bytes(len_bytes) as usize;

    let words: Vec<u64> = body
        .chunks_exact(WORD_BYTES)
        .map(|chunk| {
            let mut word = [0u8; WORD_BYTES];
            word.copy_from_slice(chunk);
            u64::from_be_bytes(word)
        })
        .collect();
    if words.len() != words_for(len) {
        return Err(SearchCryptoError::DecodingError(format!(
            "{} bits need {} words but the frame carries {}",
            len,
            words_for(len),
            words.len()
        )));
    }

    BitVector::from_words(len, words).map_err(|e| SearchCryptoError::DecodingError(e.to_string()))
}

impl Serialize for BitVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = encode_bit_vector(self).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }
}

struct BitVectorVisitor;

impl Visitor<'_> for BitVectorVisitor {
    type Value = BitVector;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a Base64 encoded bit vector frame")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BitVector, E> {
        decode_bit_vector(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for BitVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(BitVectorVisitor)
    }
}
