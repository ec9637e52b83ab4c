//! # Polynomial Function Module
//!
//! Multivariate polynomial functions over GF(2) in the "contributions" form:
//! every monomial (a set of input variables, ANDed together) carries an
//! output mask that is XORed into the result whenever the monomial is 1.
//!
//! A [`PolynomialFunction`] is either [`Plain`](PolynomialFunction::Plain) or
//! [`Parameterized`](PolynomialFunction::Parameterized). A parameterized
//! function owns named sub-functions ("pipelines") whose outputs are appended
//! to the input before its own terms are evaluated.

pub mod compose;
pub mod generators;
pub mod transform;

use crate::errors::SearchCryptoError;
use crate::gf2::vector::BitVector;

use serde::{Deserialize, Serialize};

/// Monomials and their contributions over `input_length` variables.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "TermsRepr", into = "TermsRepr")]
pub struct Terms {
    input_length: usize,
    output_length: usize,
    monomials: Vec<BitVector>,
    contributions: Vec<BitVector>,
}

#[derive(Serialize, Deserialize)]
struct TermsRepr {
    input_length: usize,
    output_length: usize,
    monomials: Vec<BitVector>,
    contributions: Vec<BitVector>,
}

impl TryFrom<TermsRepr> for Terms {
    type Error = SearchCryptoError;

    fn try_from(repr: TermsRepr) -> Result<Self, Self::Error> {
        Terms::try_new(
            repr.input_length,
            repr.output_length,
            repr.monomials,
            repr.contributions,
        )
    }
}

impl From<Terms> for TermsRepr {
    fn from(terms: Terms) -> Self {
        TermsRepr {
            input_length: terms.input_length,
            output_length: terms.output_length,
            monomials: terms.monomials,
            contributions: terms.contributions,
        }
    }
}

impl Terms {
    /// Validates and assembles a term list.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the two lists differ in length or any
    /// monomial / contribution has the wrong bit length.
    pub fn try_new(
        input_length: usize,
        output_length: usize,
        monomials: Vec<BitVector>,
        contributions: Vec<BitVector>,
    ) -> Result<Self, SearchCryptoError> {
        if monomials.len() != contributions.len() {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "{} monomials but {} contributions",
                monomials.len(),
                contributions.len()
            )));
        }
        if let Some((i, m)) = monomials
            .iter()
            .enumerate()
            .find(|(_, m)| m.len() != input_length)
        {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "monomial {} has length {} but input length is {}",
                i,
                m.len(),
                input_length
            )));
        }
        if let Some((i, c)) = contributions
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != output_length)
        {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "contribution {} has length {} but output length is {}",
                i,
                c.len(),
                output_length
            )));
        }
        Ok(Self {
            input_length,
            output_length,
            monomials,
            contributions,
        })
    }

    /// The function that is identically zero.
    pub fn zero(input_length: usize, output_length: usize) -> Self {
        Self {
            input_length,
            output_length,
            monomials: Vec::new(),
            contributions: Vec::new(),
        }
    }

    /// Copies `width` input variables starting at `offset` straight to the output.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the window does not fit the input.
    pub fn projection(input_length: usize, offset: usize, width: usize) -> Result<Self, SearchCryptoError> {
        if offset + width > input_length {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "projection window {}..{} exceeds input length {}",
                offset,
                offset + width,
                input_length
            )));
        }
        let monomials = (0..width)
            .map(|i| BitVector::unit(input_length, offset + i))
            .collect::<Result<Vec<_>, _>>()?;
        let contributions = (0..width)
            .map(|i| BitVector::unit(width, i))
            .collect::<Result<Vec<_>, _>>()?;
        Terms::try_new(input_length, width, monomials, contributions)
    }

    pub fn input_length(&self) -> usize {
        self.input_length
    }

    pub fn output_length(&self) -> usize {
        self.output_length
    }

    pub fn monomials(&self) -> &[BitVector] {
        &self.monomials
    }

    pub fn contributions(&self) -> &[BitVector] {
        &self.contributions
    }

    pub fn monomial_count(&self) -> usize {
        self.monomials.len()
    }

    /// Largest monomial size; 0 for constant or empty functions.
    pub fn degree(&self) -> usize {
        self.monomials.iter().map(BitVector::count_ones).max().unwrap_or(0)
    }

    /// Pairs of (monomial, contribution) in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (&BitVector, &BitVector)> {
        self.monomials.iter().zip(&self.contributions)
    }

    /// Evaluates the terms at `input`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `input.len() != input_length`.
    pub fn apply(&self, input: &BitVector) -> Result<BitVector, SearchCryptoError> {
        if input.len() != self.input_length {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "input of length {} for function with input length {}",
                input.len(),
                self.input_length
            )));
        }
        let mut acc = BitVector::zeros(self.output_length);
        for (monomial, contribution) in self.iter() {
            if monomial.is_subset_of(input) {
                acc.xor_assign(contribution)?;
            }
        }
        Ok(acc)
    }

    /// The same function over `extra` additional trailing variables it ignores.
    pub fn pad_inputs(&self, extra: usize) -> Terms {
        Terms {
            input_length: self.input_length + extra,
            output_length: self.output_length,
            monomials: self.monomials.iter().map(|m| m.extend_zeros(extra)).collect(),
            contributions: self.contributions.clone(),
        }
    }

    /// `x ↦ top(x) || bottom(x)`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the input lengths differ.
    pub fn stack_outputs(top: &Terms, bottom: &Terms) -> Result<Terms, SearchCryptoError> {
        if top.input_length != bottom.input_length {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "cannot stack functions with input lengths {} and {}",
                top.input_length, bottom.input_length
            )));
        }
        let upper = top
            .iter()
            .map(|(m, c)| (m.clone(), c.extend_zeros(bottom.output_length)));
        let lower = bottom
            .iter()
            .map(|(m, c)| (m.clone(), BitVector::zeros(top.output_length).concat(c)));
        let (monomials, contributions) = upper.chain(lower).unzip();
        Ok(Terms {
            input_length: top.input_length,
            output_length: top.output_length + bottom.output_length,
            monomials,
            contributions,
        })
    }

    /// `x ↦ self(x) ⊕ rhs(x)`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` unless both shapes agree.
    pub fn xor(&self, rhs: &Terms) -> Result<Terms, SearchCryptoError> {
        if self.input_length != rhs.input_length || self.output_length != rhs.output_length {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "cannot add a {}→{} function to a {}→{} function",
                rhs.input_length, rhs.output_length, self.input_length, self.output_length
            )));
        }
        let mut out = self.clone();
        out.monomials.extend(rhs.monomials.iter().cloned());
        out.contributions.extend(rhs.contributions.iter().cloned());
        Ok(out)
    }
}

/// A named sub-function feeding extra variables into a parameterized function.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    pub function: PolynomialFunction,
}

/// Terms evaluated over `input || pipeline_1(input) || pipeline_2(input) || ...`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "ParameterizedRepr", into = "ParameterizedRepr")]
pub struct ParameterizedFunction {
    input_length: usize,
    terms: Terms,
    pipelines: Vec<Pipeline>,
}

#[derive(Serialize, Deserialize)]
struct ParameterizedRepr {
    input_length: usize,
    terms: Terms,
    pipelines: Vec<Pipeline>,
}

impl TryFrom<ParameterizedRepr> for ParameterizedFunction {
    type Error = SearchCryptoError;

    fn try_from(repr: ParameterizedRepr) -> Result<Self, Self::Error> {
        ParameterizedFunction::try_new(repr.input_length, repr.terms, repr.pipelines)
    }
}

impl From<ParameterizedFunction> for ParameterizedRepr {
    fn from(f: ParameterizedFunction) -> Self {
        ParameterizedRepr {
            input_length: f.input_length,
            terms: f.terms,
            pipelines: f.pipelines,
        }
    }
}

impl ParameterizedFunction {
    /// # Errors
    ///
    /// Returns `SearchCryptoError::InvalidParameters` for an empty pipeline list (that function
    /// is [`PolynomialFunction::Plain`]), and `SearchCryptoError::DimensionMismatch` if a pipeline
    /// does not take `input_length` bits, or `terms` does not range over the input plus all
    /// pipeline outputs.
    pub fn try_new(
        input_length: usize,
        terms: Terms,
        pipelines: Vec<Pipeline>,
    ) -> Result<Self, SearchCryptoError> {
        if pipelines.is_empty() {
            return Err(SearchCryptoError::InvalidParameters(
                "parameterized function without pipelines".into(),
            ));
        }
        if let Some(p) = pipelines.iter().find(|p| p.function.input_length() != input_length) {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "pipeline '{}' takes {} bits but the function input is {} bits",
                p.name,
                p.function.input_length(),
                input_length
            )));
        }
        let extended = input_length + pipeline_width(&pipelines);
        if terms.input_length() != extended {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "terms range over {} variables, expected {} (input plus pipelines)",
                terms.input_length(),
                extended
            )));
        }
        Ok(Self {
            input_length,
            terms,
            pipelines,
        })
    }

    pub fn terms(&self) -> &Terms {
        &self.terms
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }
}

fn pipeline_width(pipelines: &[Pipeline]) -> usize {
    pipelines.iter().map(|p| p.function.output_length()).sum()
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolynomialFunction {
    Plain(Terms),
    Parameterized(ParameterizedFunction),
}

impl From<Terms> for PolynomialFunction {
    fn from(terms: Terms) -> Self {
        PolynomialFunction::Plain(terms)
    }
}

impl PolynomialFunction {
    /// Builds a parameterized function, or a plain one when `pipelines` is empty.
    ///
    /// # Errors
    ///
    /// See [`ParameterizedFunction::try_new`].
    pub fn parameterized(
        input_length: usize,
        terms: Terms,
        pipelines: Vec<Pipeline>,
    ) -> Result<Self, SearchCryptoError> {
        if pipelines.is_empty() {
            if terms.input_length() != input_length {
                return Err(SearchCryptoError::DimensionMismatch(format!(
                    "terms take {} bits, expected {}",
                    terms.input_length(),
                    input_length
                )));
            }
            return Ok(PolynomialFunction::Plain(terms));
        }
        Ok(PolynomialFunction::Parameterized(ParameterizedFunction::try_new(
            input_length,
            terms,
            pipelines,
        )?))
    }

    pub fn input_length(&self) -> usize {
        match self {
            PolynomialFunction::Plain(t) => t.input_length(),
            PolynomialFunction::Parameterized(p) => p.input_length,
        }
    }

    pub fn output_length(&self) -> usize {
        self.terms().output_length()
    }

    /// The monomial/contribution table. For a parameterized function its
    /// variables are the input followed by the pipeline outputs.
    pub fn terms(&self) -> &Terms {
        match self {
            PolynomialFunction::Plain(t) => t,
            PolynomialFunction::Parameterized(p) => &p.terms,
        }
    }

    pub fn monomials(&self) -> &[BitVector] {
        self.terms().monomials()
    }

    pub fn contributions(&self) -> &[BitVector] {
        self.terms().contributions()
    }

    /// Pipelines in substitution order; empty for a plain function.
    pub fn pipelines(&self) -> &[Pipeline] {
        match self {
            PolynomialFunction::Plain(_) => &[],
            PolynomialFunction::Parameterized(p) => &p.pipelines,
        }
    }

    pub fn is_parameterized(&self) -> bool {
        matches!(self, PolynomialFunction::Parameterized(_))
    }

    /// Evaluates the function at `input`.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `input.len() != input_length`.
    pub fn apply(&self, input: &BitVector) -> Result<BitVector, SearchCryptoError> {
        match self {
            PolynomialFunction::Plain(t) => t.apply(input),
            PolynomialFunction::Parameterized(p) => {
                if input.len() != p.input_length {
                    return Err(SearchCryptoError::DimensionMismatch(format!(
                        "input of length {} for function with input length {}",
                        input.len(),
                        p.input_length
                    )));
                }
                let mut extended = input.clone();
                for pipeline in &p.pipelines {
                    extended = extended.concat(&pipeline.function.apply(input)?);
                }
                p.terms.apply(&extended)
            }
        }
    }

    /// Evaluates the function at `lhs || rhs`, two halves of equal length.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if the halves differ in length or do not
    /// add up to the input length.
    pub fn apply_halves(&self, lhs: &BitVector, rhs: &BitVector) -> Result<BitVector, SearchCryptoError> {
        if lhs.len() != rhs.len() {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "halves must have equal length ({} vs {})",
                lhs.len(),
                rhs.len()
            )));
        }
        self.apply(&lhs.concat(rhs))
    }

    /// Rebuilds the same variant around a transformed term table.
    pub(crate) fn map_terms<F>(&self, f: F) -> Result<PolynomialFunction, SearchCryptoError>
    where
        F: FnOnce(&Terms) -> Result<Terms, SearchCryptoError>,
    {
        match self {
            PolynomialFunction::Plain(t) => Ok(PolynomialFunction::Plain(f(t)?)),
            PolynomialFunction::Parameterized(p) => {
                Ok(PolynomialFunction::Parameterized(ParameterizedFunction::try_new(
                    p.input_length,
                    f(&p.terms)?,
                    p.pipelines.clone(),
                )?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::gf2::BitMatrix;
    use crate::polynomial::generators::{dense_random_quadratic, identity, linear};

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn bits(len: usize, ones: &[usize]) -> BitVector {
        let mut v = BitVector::zeros(len);
        for &i in ones {
            v.set(i, true).unwrap();
        }
        v
    }

    #[test]
    fn test_apply_hand_built() {
        // f(x0, x1, x2) = (x0·x1 ⊕ 1, x2 ⊕ x0·x1)
        let terms = Terms::try_new(
            3,
            2,
            vec![bits(3, &[]), bits(3, &[0, 1]), bits(3, &[2])],
            vec![bits(2, &[0]), bits(2, &[0, 1]), bits(2, &[1])],
        )
        .unwrap();
        let f = PolynomialFunction::from(terms);

        assert_eq!(f.apply(&bits(3, &[])).unwrap(), bits(2, &[0]));
        assert_eq!(f.apply(&bits(3, &[0, 1])).unwrap(), bits(2, &[1]));
        assert_eq!(f.apply(&bits(3, &[0, 1, 2])).unwrap(), bits(2, &[]));
        assert_eq!(f.apply(&bits(3, &[2])).unwrap(), bits(2, &[0, 1]));
        assert!(f.apply(&bits(4, &[])).is_err());
    }

    #[test]
    fn test_try_new_validates_shapes() {
        assert!(Terms::try_new(3, 2, vec![bits(3, &[0])], vec![]).is_err());
        assert!(Terms::try_new(3, 2, vec![bits(4, &[0])], vec![bits(2, &[0])]).is_err());
        assert!(Terms::try_new(3, 2, vec![bits(3, &[0])], vec![bits(3, &[0])]).is_err());
    }

    #[test]
    fn test_apply_is_pure() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let f = dense_random_quadratic(20, 9, &mut rng);
        let snapshot = f.clone();
        let x = BitVector::random(20, &mut rng);
        let x_copy = x.clone();

        let first = f.apply(&x).unwrap();
        let second = f.apply(&x).unwrap();
        assert_eq!(first, second);
        assert_eq!(x, x_copy);
        assert_eq!(f, snapshot);
    }

    #[test]
    fn test_apply_halves_matches_concatenation() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let f = dense_random_quadratic(16, 4, &mut rng);
        let lhs = BitVector::random(8, &mut rng);
        let rhs = BitVector::random(8, &mut rng);
        assert_eq!(
            f.apply_halves(&lhs, &rhs).unwrap(),
            f.apply(&lhs.concat(&rhs)).unwrap()
        );
        assert!(f.apply_halves(&lhs, &BitVector::zeros(7)).is_err());
    }

    #[test]
    fn test_parameterized_apply_substitutes_pipelines() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let pipeline = dense_random_quadratic(6, 3, &mut rng);
        // Terms over input (6) || pipeline output (3).
        let core = dense_random_quadratic(9, 5, &mut rng);
        let f = PolynomialFunction::parameterized(
            6,
            core.terms().clone(),
            vec![Pipeline {
                name: "mix".into(),
                function: pipeline.clone(),
            }],
        )
        .unwrap();
        assert!(f.is_parameterized());

        let x = BitVector::random(6, &mut rng);
        let expected = core.apply(&x.concat(&pipeline.apply(&x).unwrap())).unwrap();
        assert_eq!(f.apply(&x).unwrap(), expected);
    }

    #[test]
    fn test_parameterized_shape_checks() {
        let p = Pipeline {
            name: "id".into(),
            function: identity(4),
        };
        assert!(PolynomialFunction::parameterized(4, Terms::zero(7, 2), vec![p.clone()]).is_err());
        assert!(PolynomialFunction::parameterized(5, Terms::zero(9, 2), vec![p.clone()]).is_err());
        assert!(PolynomialFunction::parameterized(4, Terms::zero(8, 2), vec![p]).is_ok());
        assert!(!PolynomialFunction::parameterized(4, Terms::zero(4, 2), vec![]).unwrap().is_parameterized());
    }

    #[test]
    fn test_parameterized_requires_pipelines() {
        assert!(matches!(
            ParameterizedFunction::try_new(4, Terms::zero(4, 2), vec![]),
            Err(SearchCryptoError::InvalidParameters(_))
        ));

        let json = serde_json::to_value(Terms::zero(4, 2)).unwrap();
        let value = serde_json::json!({
            "kind": "parameterized",
            "input_length": 4,
            "terms": json,
            "pipelines": [],
        });
        assert!(serde_json::from_value::<PolynomialFunction>(value).is_err());
    }

    #[test]
    fn test_stack_and_xor() {
        let mut rng = ChaCha20Rng::seed_from_u64(14);
        let a = linear(&BitMatrix::random(3, 5, &mut rng));
        let b = dense_random_quadratic(5, 3, &mut rng);
        let x = BitVector::random(5, &mut rng);

        let stacked = Terms::stack_outputs(a.terms(), b.terms()).unwrap();
        assert_eq!(
            stacked.apply(&x).unwrap(),
            a.apply(&x).unwrap().concat(&b.apply(&x).unwrap())
        );

        let sum = a.terms().xor(b.terms()).unwrap();
        assert_eq!(
            sum.apply(&x).unwrap(),
            a.apply(&x).unwrap().xor(&b.apply(&x).unwrap()).unwrap()
        );

        let padded = b.terms().pad_inputs(2);
        assert_eq!(padded.apply(&x.concat(&bits(2, &[0, 1]))).unwrap(), b.apply(&x).unwrap());
    }

    #[test]
    fn test_projection() {
        let p = Terms::projection(10, 4, 3).unwrap();
        let x = bits(10, &[3, 4, 6, 9]);
        assert_eq!(p.apply(&x).unwrap(), bits(3, &[0, 2]));
        assert!(Terms::projection(10, 8, 3).is_err());
    }
}
