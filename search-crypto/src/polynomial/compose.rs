//! Function composition `f ∘ g`.
//!
//! Every input variable of `f` is replaced by the matching output polynomial of
//! `g` and the products are multiplied out over GF(2), where `x·x = x` and equal
//! monomials cancel in pairs. The result can have as many monomials as the
//! product of the operands' monomial counts; nothing here caps that growth.

use crate::errors::SearchCryptoError;
use crate::gf2::vector::{BitVector, words_for, xor_words};
use crate::polynomial::{Pipeline, PolynomialFunction, Terms, pipeline_width};

use tracing::debug;

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

/// A polynomial as the set of its monomials (coefficients are bits).
type MonomialSet = HashSet<BitVector>;

impl PolynomialFunction {
    /// Returns `self ∘ inner`, i.e. `x ↦ self(inner(x))`.
    ///
    /// Pipelines of `inner` are kept in front; pipelines of `self` are
    /// re-rooted onto `inner`'s input and follow them. The result is plain
    /// exactly when neither operand has pipelines.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `self.input_length() != inner.output_length()`.
    pub fn compose(&self, inner: &PolynomialFunction) -> Result<PolynomialFunction, SearchCryptoError> {
        if self.input_length() != inner.output_length() {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "cannot compose a function taking {} bits with one producing {} bits",
                self.input_length(),
                inner.output_length()
            )));
        }

        let inherited = inner.pipelines();
        let own = self.pipelines();
        if own.is_empty() {
            let terms = self.terms().compose(inner.terms())?;
            return PolynomialFunction::parameterized(inner.input_length(), terms, inherited.to_vec());
        }

        let rerooted = own
            .iter()
            .map(|p| {
                Ok(Pipeline {
                    name: p.name.clone(),
                    function: p.function.compose(inner)?,
                })
            })
            .collect::<Result<Vec<_>, SearchCryptoError>>()?;

        // Variables of the result: inner input, inner pipelines, re-rooted pipelines.
        // The substitution feeds self's input from inner's terms and passes the
        // re-rooted pipeline outputs through unchanged.
        let extra = pipeline_width(&rerooted);
        let base = inner.terms().input_length();
        let substitution = Terms::stack_outputs(
            &inner.terms().pad_inputs(extra),
            &Terms::projection(base + extra, base, extra)?,
        )?;
        let terms = self.terms().compose(&substitution)?;

        let mut pipelines = inherited.to_vec();
        pipelines.extend(rerooted);
        PolynomialFunction::parameterized(inner.input_length(), terms, pipelines)
    }
}

impl Terms {
    /// Composes two term tables; `self` reads the outputs of `inner`.
    ///
    /// Monomials of the result are listed in sorted order and those whose
    /// contribution cancels to zero are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SearchCryptoError::DimensionMismatch` if `self.input_length() != inner.output_length()`.
    pub fn compose(&self, inner: &Terms) -> Result<Terms, SearchCryptoError> {
        if self.input_length != inner.output_length {
            return Err(SearchCryptoError::DimensionMismatch(format!(
                "cannot compose a function taking {} bits with one producing {} bits",
                self.input_length, inner.output_length
            )));
        }

        let composed = if self.degree() <= 2 && inner.degree() <= 1 {
            compose_quadratic_affine(self, inner)?
        } else {
            expand_composition(self, inner)?
        };

        debug!(
            outer = self.monomial_count(),
            inner = inner.monomial_count(),
            result = composed.monomial_count(),
            "composed polynomial functions"
        );
        Ok(composed)
    }
}

/// Generic composition by distributive expansion; works for any degrees.
pub(crate) fn expand_composition(outer: &Terms, inner: &Terms) -> Result<Terms, SearchCryptoError> {
    let n = inner.input_length;

    let mut outputs: Vec<MonomialSet> = vec![MonomialSet::new(); inner.output_length];
    for (monomial, contribution) in inner.iter() {
        for j in contribution.iter_ones() {
            toggle(&mut outputs[j], monomial.clone());
        }
    }

    let mut collected = BTreeMap::new();
    for (monomial, contribution) in outer.iter() {
        let mut product = MonomialSet::from([BitVector::zeros(n)]);
        for var in monomial.iter_ones() {
            product = multiply(&product, &outputs[var])?;
            if product.is_empty() {
                break;
            }
        }
        for term in product {
            accumulate(&mut collected, term, contribution)?;
        }
    }

    Terms::from_collected(n, outer.output_length, collected)
}

/// Composition of a function of degree ≤ 2 with an affine one.
///
/// With `inner(x) = G·x ⊕ g`, shifting by `g` folds into the linear and
/// constant coefficients, and the quadratic part becomes the bilinear form
/// `Gᵀ·C·G` whose entries are contribution vectors. The tables below hold
/// those vector entries as flat word slices.
pub(crate) fn compose_quadratic_affine(outer: &Terms, inner: &Terms) -> Result<Terms, SearchCryptoError> {
    let n = inner.input_length;
    let m = inner.output_length;
    let w = words_for(outer.output_length);

    // Rows of G and the offset g.
    let mut linear = vec![BitVector::zeros(n); m];
    let mut offset = BitVector::zeros(m);
    for (monomial, contribution) in inner.iter() {
        match monomial.iter_ones().next() {
            None => offset.xor_assign(contribution)?,
            Some(var) => {
                for i in contribution.iter_ones() {
                    linear[i].toggle(var);
                }
            }
        }
    }

    let mut constant = BitVector::zeros(outer.output_length);
    let mut coefficients = vec![BitVector::zeros(outer.output_length); m];
    let mut pairs = Vec::new();
    for (monomial, contribution) in outer.iter() {
        let vars: Vec<usize> = monomial.iter_ones().collect();
        match vars[..] {
            [] => constant.xor_assign(contribution)?,
            [i] => {
                coefficients[i].xor_assign(contribution)?;
                if offset.get(i) {
                    constant.xor_assign(contribution)?;
                }
            }
            [i, j] => {
                let (shift_i, shift_j) = (offset.get(i), offset.get(j));
                if shift_j {
                    coefficients[i].xor_assign(contribution)?;
                }
                if shift_i {
                    coefficients[j].xor_assign(contribution)?;
                }
                if shift_i && shift_j {
                    constant.xor_assign(contribution)?;
                }
                pairs.push((i, j, contribution));
            }
            _ => {
                return Err(SearchCryptoError::InternalError(format!(
                    "monomial of degree {} in quadratic composition",
                    vars.len()
                )));
            }
        }
    }

    // lin[k] = Σ_i G[i][k]·coefficients[i]
    let mut lin = vec![0u64; n * w];
    for (row, coefficient) in linear.iter().zip(&coefficients) {
        if coefficient.is_zero() {
            continue;
        }
        for k in row.iter_ones() {
            xor_words(&mut lin[k * w..(k + 1) * w], coefficient.words());
        }
    }

    // half[i][l] = Σ_{j > i} C[i][j]·G[j][l]
    let mut half = vec![0u64; m * n * w];
    for &(i, j, contribution) in &pairs {
        for l in linear[j].iter_ones() {
            let at = (i * n + l) * w;
            xor_words(&mut half[at..at + w], contribution.words());
        }
    }

    // full[k][l] = Σ_i G[i][k]·half[i][l]
    let mut full = vec![0u64; n * n * w];
    for (i, row) in linear.iter().enumerate() {
        let source = &half[i * n * w..(i + 1) * n * w];
        if source.iter().all(|&word| word == 0) {
            continue;
        }
        for k in row.iter_ones() {
            xor_words(&mut full[k * n * w..(k + 1) * n * w], source);
        }
    }

    let entry = |k: usize, l: usize| &full[(k * n + l) * w..(k * n + l + 1) * w];
    let mut collected = BTreeMap::new();
    if !constant.is_zero() {
        collected.insert(BitVector::zeros(n), constant);
    }
    for k in 0..n {
        let mut words = lin[k * w..(k + 1) * w].to_vec();
        xor_words(&mut words, entry(k, k));
        if words.iter().any(|&word| word != 0) {
            let mut monomial = BitVector::zeros(n);
            monomial.toggle(k);
            collected.insert(monomial, BitVector::from_words(outer.output_length, words)?);
        }
        for l in (k + 1)..n {
            let mut words = entry(k, l).to_vec();
            xor_words(&mut words, entry(l, k));
            if words.iter().any(|&word| word != 0) {
                let mut monomial = BitVector::zeros(n);
                monomial.toggle(k);
                monomial.toggle(l);
                collected.insert(monomial, BitVector::from_words(outer.output_length, words)?);
            }
        }
    }

    Terms::from_collected(n, outer.output_length, collected)
}

impl Terms {
    fn from_collected(
        input_length: usize,
        output_length: usize,
        collected: BTreeMap<BitVector, BitVector>,
    ) -> Result<Terms, SearchCryptoError> {
        let (monomials, contributions) = collected
            .into_iter()
            .filter(|(_, contribution)| !contribution.is_zero())
            .unzip();
        Terms::try_new(input_length, output_length, monomials, contributions)
    }
}

fn toggle(set: &mut MonomialSet, monomial: BitVector) {
    if !set.remove(&monomial) {
        set.insert(monomial);
    }
}

fn multiply(lhs: &MonomialSet, rhs: &MonomialSet) -> Result<MonomialSet, SearchCryptoError> {
    let mut product = MonomialSet::with_capacity(lhs.len() * rhs.len());
    for a in lhs {
        for b in rhs {
            toggle(&mut product, a.or(b)?);
        }
    }
    Ok(product)
}

fn accumulate(
    collected: &mut BTreeMap<BitVector, BitVector>,
    monomial: BitVector,
    contribution: &BitVector,
) -> Result<(), SearchCryptoError> {
    match collected.entry(monomial) {
        Entry::Vacant(slot) => {
            slot.insert(contribution.clone());
        }
        Entry::Occupied(mut slot) => slot.get_mut().xor_assign(contribution)?,
    }
    Ok(())
}
