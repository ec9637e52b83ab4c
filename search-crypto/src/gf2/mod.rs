//! # GF(2) Module
//!
//! Bit vectors and bit matrices over the two-element field: addition is XOR,
//! multiplication is AND.

pub mod matrix_ops;
pub mod vector;

pub use matrix_ops::BitMatrix;
pub use vector::BitVector;
