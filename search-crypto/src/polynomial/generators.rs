//! Constructors for commonly used polynomial functions.

use crate::gf2::matrix_ops::BitMatrix;
use crate::gf2::vector::BitVector;
use crate::polynomial::{PolynomialFunction, Terms};

use itertools::Itertools;
use rand::Rng;

/// `x ↦ x` on `n` bits.
pub fn identity(n: usize) -> PolynomialFunction {
    linear(&BitMatrix::identity(n))
}

/// `x ↦ M·x`. Column `j` of `M` becomes the contribution of the monomial `x_j`;
/// all-zero columns are left out.
pub fn linear(matrix: &BitMatrix) -> PolynomialFunction {
    let columns = matrix.transpose();
    let (monomials, contributions): (Vec<_>, Vec<_>) = columns
        .row_vectors()
        .iter()
        .enumerate()
        .filter(|(_, column)| !column.is_zero())
        .map(|(j, column)| (BitVector::basis(matrix.cols(), j), column.clone()))
        .unzip();

    PolynomialFunction::Plain(Terms {
        input_length: matrix.cols(),
        output_length: matrix.rows(),
        monomials,
        contributions,
    })
}

/// A random quadratic function with every monomial of degree at most two present,
/// each with a uniformly random contribution.
pub fn dense_random_quadratic<R: Rng + ?Sized>(
    input_length: usize,
    output_length: usize,
    rng: &mut R,
) -> PolynomialFunction {
    let constant = std::iter::once(BitVector::zeros(input_length));
    let linear_terms = (0..input_length).map(|i| BitVector::basis(input_length, i));
    let quadratic_terms = (0..input_length).tuple_combinations().map(|(i, j)| {
        let mut m = BitVector::basis(input_length, i);
        m.toggle(j);
        m
    });

    let monomials: Vec<BitVector> = constant.chain(linear_terms).chain(quadratic_terms).collect();
    let contributions = monomials
        .iter()
        .map(|_| BitVector::random(output_length, rng))
        .collect();

    PolynomialFunction::Plain(Terms {
        input_length,
        output_length,
        monomials,
        contributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_linear_matches_matrix() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let m = BitMatrix::random(7, 12, &mut rng);
        let f = linear(&m);
        assert_eq!(f.terms().degree(), 1);
        for _ in 0..10 {
            let x = BitVector::random(12, &mut rng);
            assert_eq!(f.apply(&x).unwrap(), m.multiply_vector(&x).unwrap());
        }
    }

    #[test]
    fn test_identity() {
        let x = BitVector::random(70, &mut rand::rng());
        assert_eq!(identity(70).apply(&x).unwrap(), x);
    }

    #[test]
    fn test_dense_quadratic_shape() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let f = dense_random_quadratic(10, 4, &mut rng);
        assert_eq!(f.input_length(), 10);
        assert_eq!(f.output_length(), 4);
        // 1 + 10 + C(10, 2)
        assert_eq!(f.terms().monomial_count(), 56);
        assert_eq!(f.terms().degree(), 2);
    }
}
