use crate::errors::SearchCryptoError;
use crate::gf2::vector::{BitVector, xor_words};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Upper bound on rejection-sampling rounds in [`BitMatrix::random_invertible`].
///
/// A random n×n matrix over GF(2) is invertible with probability above 0.28
/// for every n, so hitting this bound means the random source is broken.
pub const MAX_SAMPLING_ATTEMPTS: usize = 1000;

/// A dense matrix over GF(2), stored as packed rows.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "MatrixRepr", into = "MatrixRepr")]
pub struct BitMatrix {
    rows: Vec<BitVector>,
    cols: usize,
}

#[derive(Serialize, Deserialize)]
struct MatrixRepr {
    cols: usize,
    rows: Vec<BitVector>,
}

impl TryFrom<MatrixRepr> for BitMatrix {
    type Error = SearchCryptoError;

    fn try_from(repr: MatrixRepr) -> Result<Self, Self::Error> {
        BitMatrix::from_rows(repr.rows, repr.cols)
    }
}

impl From<BitMatrix> for MatrixRepr {
    fn from(matrix: BitMatrix) -> Self {
        MatrixRepr {
            cols: matrix.cols,
            rows: matrix.rows,
        }
    }
}

impl BitMatrix {
    /// Builds a matrix from its rows; every row must have length `cols`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` on a ragged row.
    pub fn from_rows(rows: Vec<BitVector>, cols: usize) -> Result<Self, SearchCryptoError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(SearchCryptoError::DimensionMismatch(format!(
                    "Row {} has length {} but expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
        }
        Ok(Self { rows, cols })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows: vec![BitVector::zeros(cols); rows],
            cols,
        }
    }

    /// Creates an identity matrix of size `n`.
    pub fn identity(n: usize) -> Self {
        let mut identity = Self::zeros(n, n);
        for (i, row) in identity.rows.iter_mut().enumerate() {
            row.toggle(i);
        }
        identity
    }

    /// A uniformly random `rows`×`cols` matrix.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        Self {
            rows: (0..rows).map(|_| BitVector::random(cols, rng)).collect(),
            cols,
        }
    }

    /// Rejection-samples a uniformly random invertible `n`×`n` matrix.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::InternalError` if no invertible candidate shows up within
    /// [`MAX_SAMPLING_ATTEMPTS`] draws.
    pub fn random_invertible<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Self, SearchCryptoError> {
        for attempt in 1..=MAX_SAMPLING_ATTEMPTS {
            let candidate = Self::random(n, n, rng);
            if candidate.is_invertible() {
                trace!(n, attempt, "sampled invertible matrix");
                if attempt > 32 {
                    warn!(n, attempt, "invertible sampling needed an unusual number of draws");
                }
                return Ok(candidate);
            }
        }
        Err(SearchCryptoError::InternalError(format!(
            "could not generate invertible {}×{} matrix after {} tries",
            n, n, MAX_SAMPLING_ATTEMPTS
        )))
    }

    /// Reinterprets a length-n² vector as an n×n matrix, row-major.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the length is not a perfect square.
    pub fn square_from_vector(v: &BitVector) -> Result<Self, SearchCryptoError> {
        let n = exact_sqrt(v.len()).ok_or_else(|| {
            SearchCryptoError::DimensionMismatch(format!(
                "vector length {} is not a perfect square",
                v.len()
            ))
        })?;
        let rows = (0..n)
            .map(|i| v.range(i * n, (i + 1) * n))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows, cols: n })
    }

    /// Flattens the matrix row-major into a single vector of length rows×cols.
    pub fn to_vector(&self) -> BitVector {
        self.rows
            .iter()
            .fold(BitVector::zeros(0), |acc, row| acc.concat(row))
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows.len() == self.cols
    }

    pub fn row(&self, index: usize) -> Option<&BitVector> {
        self.rows.get(index)
    }

    pub fn row_vectors(&self) -> &[BitVector] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.rows.get(row).is_some_and(|r| r.get(col))
    }

    /// Sets entry `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the position is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: bool) -> Result<(), SearchCryptoError> {
        let rows = self.rows.len();
        self.rows
            .get_mut(row)
            .ok_or_else(|| {
                SearchCryptoError::DimensionMismatch(format!(
                    "row {} out of range for {} rows",
                    row, rows
                ))
            })?
            .set(col, value)
    }

    /// Computes the matrix product `C = AB` over GF(2).
    ///
    /// Row `i` of `C` is the XOR of the rows of `B` selected by the set bits of row `i` of `A`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `A.cols != B.rows`.
    pub fn multiply(&self, rhs: &BitMatrix) -> Result<BitMatrix, SearchCryptoError> {
        if self.cols != rhs.rows.len() {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "Inner dimensions must match for matrix multiplication ({} vs {})",
                self.cols,
                rhs.rows.len()
            )));
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut acc = BitVector::zeros(rhs.cols);
                for k in row.iter_ones() {
                    acc.xor_assign(&rhs.rows[k])?;
                }
                Ok(acc)
            })
            .collect::<Result<Vec<_>, SearchCryptoError>>()?;
        Ok(BitMatrix {
            rows,
            cols: rhs.cols,
        })
    }

    /// A·x where A is an m×n matrix and x is a length–n vector.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `x.len() != A.cols`.
    pub fn multiply_vector(&self, x: &BitVector) -> Result<BitVector, SearchCryptoError> {
        if x.len() != self.cols {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "Matrix columns ({}) must match vector length ({})",
                self.cols,
                x.len()
            )));
        }
        let mut y = BitVector::zeros(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            if row.and(x)?.parity() {
                y.toggle(i);
            }
        }
        Ok(y)
    }

    pub fn transpose(&self) -> BitMatrix {
        let mut t = BitMatrix::zeros(self.cols, self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            for j in row.iter_ones() {
                t.rows[j].toggle(i);
            }
        }
        t
    }

    /// Rows `[from, to)` as a new matrix.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the range is invalid.
    pub fn row_range(&self, from: usize, to: usize) -> Result<BitMatrix, SearchCryptoError> {
        if from > to || to > self.rows.len() {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "row range {}..{} invalid for {} rows",
                from,
                to,
                self.rows.len()
            )));
        }
        Ok(BitMatrix {
            rows: self.rows[from..to].to_vec(),
            cols: self.cols,
        })
    }

    /// `diag(A, B)`: `A` in the top-left block, `B` in the bottom-right, zeros elsewhere.
    pub fn block_diagonal(a: &BitMatrix, b: &BitMatrix) -> BitMatrix {
        let cols = a.cols + b.cols;
        let upper = a.rows.iter().map(|row| row.extend_zeros(b.cols));
        let lower = b.rows.iter().map(|row| BitVector::zeros(a.cols).concat(row));
        BitMatrix {
            rows: upper.chain(lower).collect(),
            cols,
        }
    }

    /// Rank over GF(2) by forward elimination on a scratch copy.
    pub fn rank(&self) -> usize {
        let mut mat = self.rows.clone();
        let n = mat.len();
        let mut rank = 0;

        for col in 0..self.cols {
            if rank >= n {
                break;
            }
            let Some(pivot) = (rank..n).find(|&r| mat[r].get(col)) else {
                continue;
            };
            mat.swap(rank, pivot);
            let (done, below) = mat.split_at_mut(rank + 1);
            let pivot_row = &done[rank];
            for row in below.iter_mut().filter(|r| r.get(col)) {
                xor_words(row.words_mut(), pivot_row.words());
            }
            rank += 1;
        }

        rank
    }

    pub fn is_invertible(&self) -> bool {
        self.is_square() && self.rank() == self.cols
    }

    /// Inverts a square matrix by Gauss–Jordan elimination against an adjoined identity.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` for a non-square matrix and
    /// `SearchCryptoError::SingularMatrix` when some column has no pivot.
    pub fn inverse(&self) -> Result<BitMatrix, SearchCryptoError> {
        let n = self.rows.len();
        if !self.is_square() {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "matrix_inverse: matrix must be square, got {}×{}",
                n, self.cols
            )));
        }

        let mut left = self.rows.clone();
        let mut right = BitMatrix::identity(n).rows;

        for col in 0..n {
            let pivot = (col..n).find(|&r| left[r].get(col)).ok_or_else(|| {
                SearchCryptoError::SingularMatrix(format!("no pivot in column {}", col))
            })?;
            if pivot != col {
                left.swap(pivot, col);
                right.swap(pivot, col);
            }
            let pivot_left = left[col].clone();
            let pivot_right = right[col].clone();
            for row in 0..n {
                if row != col && left[row].get(col) {
                    left[row].xor_assign(&pivot_left)?;
                    right[row].xor_assign(&pivot_right)?;
                }
            }
        }

        Ok(BitMatrix {
            rows: right,
            cols: n,
        })
    }
}

/// `Some(r)` when `n == r * r`.
pub fn exact_sqrt(n: usize) -> Option<usize> {
    let r = n.isqrt();
    (r * r == n).then_some(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    use quickcheck_macros::quickcheck;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn matrix(rows: &[&[u8]]) -> BitMatrix {
        let cols = rows.first().map_or(0, |r| r.len());
        let rows = rows
            .iter()
            .map(|r| {
                let mut v = BitVector::zeros(cols);
                for (j, &b) in r.iter().enumerate() {
                    v.set(j, b == 1).unwrap();
                }
                v
            })
            .collect();
        BitMatrix::from_rows(rows, cols).unwrap()
    }

    #[test]
    fn test_matrix_mul_ok() {
        let a = matrix(&[&[1, 1], &[0, 1]]);
        let b = matrix(&[&[1, 0], &[1, 1]]);
        // [1 1][1 0]   [0 1]
        // [0 1][1 1] = [1 1]
        assert_eq!(a.multiply(&b).unwrap(), matrix(&[&[0, 1], &[1, 1]]));
    }

    #[test]
    fn test_matrix_mul_dimension_mismatch() {
        let a = BitMatrix::zeros(2, 2);
        let _ = a.multiply(&BitMatrix::zeros(2, 3)).unwrap();
        assert!(a.multiply(&BitMatrix::zeros(3, 1)).is_err());
    }

    #[test]
    fn test_identity_matrix() {
        let expected3 = matrix(&[&[1, 0, 0], &[0, 1, 0], &[0, 0, 1]]);
        assert_eq!(BitMatrix::identity(3), expected3);
        assert_eq!(BitMatrix::identity(0).rows(), 0);
    }

    #[test]
    fn test_matrix_inverse_ok() {
        let m = matrix(&[&[1, 1, 0], &[0, 1, 1], &[0, 0, 1]]);
        let inv = m.inverse().unwrap();
        assert_eq!(inv, matrix(&[&[1, 1, 1], &[0, 1, 1], &[0, 0, 1]]));
        assert_eq!(m.multiply(&inv).unwrap(), BitMatrix::identity(3));
    }

    #[test]
    fn test_matrix_inverse_singular() {
        let m = matrix(&[&[1, 1], &[1, 1]]);
        assert!(matches!(m.inverse(), Err(SearchCryptoError::SingularMatrix(_))));
        assert!(BitMatrix::zeros(2, 3).inverse().is_err());
    }

    #[test]
    fn test_matrix_rank_simple() {
        let m = matrix(&[&[1, 0, 1], &[1, 0, 1], &[0, 1, 1]]);
        assert_eq!(m.rank(), 2);
        assert_eq!(BitMatrix::identity(5).rank(), 5);
        assert_eq!(BitMatrix::zeros(4, 4).rank(), 0);
        assert_eq!(matrix(&[&[1, 1], &[1, 1]]).rank(), 1);
    }

    #[test]
    fn test_square_reshape() {
        let v = BitVector::random(64, &mut rand::rng());
        let m = BitMatrix::square_from_vector(&v).unwrap();
        assert_eq!(m.rows(), 8);
        assert_eq!(m.cols(), 8);
        assert_eq!(m.get(2, 5), v.get(2 * 8 + 5));
        assert_eq!(m.to_vector(), v);
        assert!(BitMatrix::square_from_vector(&BitVector::zeros(63)).is_err());
    }

    #[test]
    fn test_multiply_vector_and_transpose() {
        let a = matrix(&[&[1, 1, 0], &[0, 1, 1]]);
        let x = BitVector::unit(3, 1).unwrap();
        let y = a.multiply_vector(&x).unwrap();
        assert_eq!(y.iter_ones().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(a.transpose().transpose(), a);
        assert_eq!(a.transpose().rows(), 3);
        assert!(a.multiply_vector(&BitVector::zeros(2)).is_err());
    }

    #[test]
    fn test_block_diagonal() {
        let a = BitMatrix::identity(2);
        let b = matrix(&[&[1, 1, 1]]);
        let d = BitMatrix::block_diagonal(&a, &b);
        assert_eq!(d.rows(), 3);
        assert_eq!(d.cols(), 5);
        assert_eq!(d, matrix(&[&[1, 0, 0, 0, 0], &[0, 1, 0, 0, 0], &[0, 0, 1, 1, 1]]));
    }

    #[test]
    fn test_random_invertible_round_trip() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for n in [1, 2, 8, 33, 70] {
            let m = BitMatrix::random_invertible(n, &mut rng).unwrap();
            let inv = m.inverse().unwrap();
            assert_eq!(m.multiply(&inv).unwrap(), BitMatrix::identity(n));
            assert_eq!(inv.multiply(&m).unwrap(), BitMatrix::identity(n));
        }
    }

    #[quickcheck]
    fn prop_inverse_is_two_sided(seed: u64, size: u8) -> bool {
        let n = (size % 24) as usize + 1;
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let m = BitMatrix::random_invertible(n, &mut rng).unwrap();
        let inv = m.inverse().unwrap();
        m.multiply(&inv).unwrap() == BitMatrix::identity(n)
            && inv.multiply(&m).unwrap() == BitMatrix::identity(n)
    }

    #[quickcheck]
    fn prop_singular_iff_rank_deficient(seed: u64) -> bool {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let m = BitMatrix::random(6, 6, &mut rng);
        m.inverse().is_ok() == (m.rank() == 6)
    }
}
