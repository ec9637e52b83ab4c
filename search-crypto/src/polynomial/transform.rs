//! Linear pre/post-transformation of a function's contributions.
//!
//! Each contribution is read as a square matrix, multiplied on one or both
//! sides and flattened again. Monomials and pipelines are untouched, so for
//! every input `x`: `right_multiply(f, R)(x) = square(f(x)) · R` and likewise
//! for the left and two-sided forms.

use crate::errors::SearchCryptoError;
use crate::gf2::matrix_ops::{BitMatrix, exact_sqrt};
use crate::polynomial::{PolynomialFunction, Terms};

impl PolynomialFunction {
    /// Contributions `C ↦ C · rhs`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` unless the output length is `n²` with
    /// `n == rhs.rows()`.
    pub fn right_multiply(&self, rhs: &BitMatrix) -> Result<PolynomialFunction, SearchCryptoError> {
        let side = self.contribution_side()?;
        expect_dimension("right_multiply", side, rhs.rows())?;
        self.transform_contributions(side * rhs.cols(), |c| c.multiply(rhs))
    }

    /// Contributions `C ↦ lhs · C`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` unless the output length is `n²` with
    /// `n == lhs.cols()`.
    pub fn left_multiply(&self, lhs: &BitMatrix) -> Result<PolynomialFunction, SearchCryptoError> {
        let side = self.contribution_side()?;
        expect_dimension("left_multiply", side, lhs.cols())?;
        self.transform_contributions(lhs.rows() * side, |c| lhs.multiply(&c))
    }

    /// Contributions `C ↦ lhs · C · rhs`; equal to
    /// `self.right_multiply(rhs)?.left_multiply(lhs)` in either order.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` unless the output length is `n²` with
    /// `n == lhs.cols() == rhs.rows()`.
    pub fn two_sided_multiply(
        &self,
        lhs: &BitMatrix,
        rhs: &BitMatrix,
    ) -> Result<PolynomialFunction, SearchCryptoError> {
        let side = self.contribution_side()?;
        expect_dimension("two_sided_multiply (left)", side, lhs.cols())?;
        expect_dimension("two_sided_multiply (right)", side, rhs.rows())?;
        self.transform_contributions(lhs.rows() * rhs.cols(), |c| lhs.multiply(&c)?.multiply(rhs))
    }

    fn contribution_side(&self) -> Result<usize, SearchCryptoError> {
        exact_sqrt(self.output_length()).ok_or_else(|| {
            SearchCryptoError::DimensionMismatch(format!(
                "output length {} is not a perfect square",
                self.output_length()
            ))
        })
    }

    fn transform_contributions<F>(
        &self,
        output_length: usize,
        op: F,
    ) -> Result<PolynomialFunction, SearchCryptoError>
    where
        F: Fn(BitMatrix) -> Result<BitMatrix, SearchCryptoError>,
    {
        self.map_terms(|terms| {
            let contributions = terms
                .contributions()
                .iter()
                .map(|c| Ok(op(BitMatrix::square_from_vector(c)?)?.to_vector()))
                .collect::<Result<Vec<_>, SearchCryptoError>>()?;
            Terms::try_new(
                terms.input_length(),
                output_length,
                terms.monomials().to_vec(),
                contributions,
            )
        })
    }
}

fn expect_dimension(op: &str, side: usize, found: usize) -> Result<(), SearchCryptoError> {
    if side != found {
        return Err(SearchCryptoError::DimensionMismatch(format!(
            "{}: contributions are {}×{} but the matrix side is {}",
            op, side, side, found
        )));
    }
    Ok(())
}
