//! Fixed-length bit vectors over GF(2).

use crate::errors::SearchCryptoError;

use rand::{Rng, RngCore};

use std::fmt;

pub(crate) const WORD_BITS: usize = u64::BITS as usize;

/// Number of `u64` words needed to hold `len` bits.
#[inline]
pub(crate) fn words_for(len: usize) -> usize {
    len.div_ceil(WORD_BITS)
}

/// XORs `src` into `dst` word by word.
#[inline]
pub(crate) fn xor_words(dst: &mut [u64], src: &[u64]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// A vector of bits with GF(2) arithmetic.
///
/// Bit `i` lives in bit `i % 64` of word `i / 64`. Bits past `len` are kept
/// at zero, so derived equality, ordering and hashing only see the value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BitVector {
    len: usize,
    words: Vec<u64>,
}

impl BitVector {
    /// The all-zero vector of length `len`.
    pub fn zeros(len: usize) -> Self {
        Self {
            len,
            words: vec![0; words_for(len)],
        }
    }

    /// The vector of length `len` with only bit `index` set.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `index >= len`.
    pub fn unit(len: usize, index: usize) -> Result<Self, SearchCryptoError> {
        if index >= len {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "bit index {} out of range for length {}",
                index, len
            )));
        }
        Ok(Self::basis(len, index))
    }

    /// [`unit`](Self::unit) for callers that guarantee `index < len`.
    pub(crate) fn basis(len: usize, index: usize) -> Self {
        let mut v = Self::zeros(len);
        v.toggle(index);
        v
    }

    /// A uniformly random vector of length `len`.
    pub fn random<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut words: Vec<u64> = (0..words_for(len)).map(|_| rng.next_u64()).collect();
        mask_tail(&mut words, len);
        Self { len, words }
    }

    /// Builds a vector from raw words.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the word count does not match `len`
    /// or a bit past `len` is set.
    pub fn from_words(len: usize, words: Vec<u64>) -> Result<Self, SearchCryptoError> {
        if words.len() != words_for(len) {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "{} bits need {} words, got {}",
                len,
                words_for(len),
                words.len()
            )));
        }
        let mut masked = words.clone();
        mask_tail(&mut masked, len);
        if masked != words {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "bits set beyond declared length {}",
                len
            )));
        }
        Ok(Self { len, words })
    }

    /// Interprets `bytes` as a little-endian bit string and keeps the first `len` bits.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `bytes` holds fewer than `len` bits.
    pub fn from_bytes(len: usize, bytes: &[u8]) -> Result<Self, SearchCryptoError> {
        if bytes.len() * 8 < len {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "{} bytes cannot fill {} bits",
                bytes.len(),
                len
            )));
        }
        let mut words = vec![0u64; words_for(len)];
        for (i, word) in words.iter_mut().enumerate() {
            let mut chunk = [0u8; 8];
            let start = i * 8;
            let end = (start + 8).min(bytes.len());
            chunk[..end - start].copy_from_slice(&bytes[start..end]);
            *word = u64::from_le_bytes(chunk);
        }
        mask_tail(&mut words, len);
        Ok(Self { len, words })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The backing words, lowest bits first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub(crate) fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }

    pub fn get(&self, index: usize) -> bool {
        index < self.len && (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Sets bit `index` to `value`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `index` is out of range.
    pub fn set(&mut self, index: usize, value: bool) -> Result<(), SearchCryptoError> {
        if index >= self.len {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "bit index {} out of range for length {}",
                index, self.len
            )));
        }
        let mask = 1u64 << (index % WORD_BITS);
        if value {
            self.words[index / WORD_BITS] |= mask;
        } else {
            self.words[index / WORD_BITS] &= !mask;
        }
        Ok(())
    }

    /// Flips bit `index`; callers guarantee `index < len`.
    #[inline]
    pub(crate) fn toggle(&mut self, index: usize) {
        self.words[index / WORD_BITS] ^= 1u64 << (index % WORD_BITS);
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Parity of the set bits, i.e. the GF(2) sum of all entries.
    pub fn parity(&self) -> bool {
        self.words.iter().fold(0u32, |acc, w| acc ^ w.count_ones()) & 1 == 1
    }

    /// Indices of the set bits in increasing order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(i * WORD_BITS + bit)
            })
        })
    }

    /// True when every bit set in `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &BitVector) -> bool {
        self.words
            .iter()
            .zip(other.words.iter().chain(std::iter::repeat(&0)))
            .all(|(a, b)| a & !b == 0)
    }

    /// `self ⊕ rhs`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the lengths differ.
    pub fn xor(&self, rhs: &BitVector) -> Result<BitVector, SearchCryptoError> {
        let mut out = self.clone();
        out.xor_assign(rhs)?;
        Ok(out)
    }

    /// In-place `self ⊕= rhs` on an owned value.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the lengths differ.
    pub fn xor_assign(&mut self, rhs: &BitVector) -> Result<(), SearchCryptoError> {
        self.check_same_length(rhs, "xor")?;
        xor_words(&mut self.words, &rhs.words);
        Ok(())
    }

    /// `self ∧ rhs`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the lengths differ.
    pub fn and(&self, rhs: &BitVector) -> Result<BitVector, SearchCryptoError> {
        self.check_same_length(rhs, "and")?;
        let words = self.words.iter().zip(&rhs.words).map(|(a, b)| a & b).collect();
        Ok(BitVector {
            len: self.len,
            words,
        })
    }

    /// `self ∨ rhs`, used to multiply monomials (`x·x = x`).
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the lengths differ.
    pub fn or(&self, rhs: &BitVector) -> Result<BitVector, SearchCryptoError> {
        self.check_same_length(rhs, "or")?;
        let words = self.words.iter().zip(&rhs.words).map(|(a, b)| a | b).collect();
        Ok(BitVector {
            len: self.len,
            words,
        })
    }

    /// The bits in `[from, to)` as a new vector.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the range is reversed or out of bounds.
    pub fn range(&self, from: usize, to: usize) -> Result<BitVector, SearchCryptoError> {
        if from > to || to > self.len {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "range {}..{} invalid for length {}",
                from, to, self.len
            )));
        }
        let len = to - from;
        let shift = from % WORD_BITS;
        let base = from / WORD_BITS;
        let mut words: Vec<u64> = (0..words_for(len))
            .map(|i| {
                let low = self.words[base + i] >> shift;
                let high = match self.words.get(base + i + 1) {
                    Some(&w) if shift != 0 => w << (WORD_BITS - shift),
                    _ => 0,
                };
                low | high
            })
            .collect();
        mask_tail(&mut words, len);
        Ok(BitVector { len, words })
    }

    /// `self || rhs`.
    pub fn concat(&self, rhs: &BitVector) -> BitVector {
        let len = self.len + rhs.len;
        let mut words = self.words.clone();
        words.resize(words_for(len), 0);
        let shift = self.len % WORD_BITS;
        let base = self.len / WORD_BITS;
        for (i, &w) in rhs.words.iter().enumerate() {
            if shift == 0 {
                words[base + i] |= w;
            } else {
                words[base + i] |= w << shift;
                if base + i + 1 < words.len() {
                    words[base + i + 1] |= w >> (WORD_BITS - shift);
                }
            }
        }
        BitVector { len, words }
    }

    /// `self` followed by `extra` zero bits.
    pub fn extend_zeros(&self, extra: usize) -> BitVector {
        let len = self.len + extra;
        let mut words = self.words.clone();
        words.resize(words_for(len), 0);
        BitVector { len, words }
    }

    fn check_same_length(&self, rhs: &BitVector, op: &str) -> Result<(), SearchCryptoError> {
        if self.len != rhs.len {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "Vector lengths must match for {} ({} vs {})",
                op, self.len, rhs.len
            )));
        }
        Ok(())
    }
}

fn mask_tail(words: &mut [u64], len: usize) {
    let rem = len % WORD_BITS;
    if rem != 0 {
        if let Some(last) = words.last_mut() {
            *last &= (1u64 << rem) - 1;
        }
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector[{}](", self.len)?;
        for i in 0..self.len {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        f.write_str(")")
    }
}
