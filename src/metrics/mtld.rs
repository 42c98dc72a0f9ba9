//! Measure of Textual Lexical Diversity.
//!
//! A factor is a run of tokens whose running type-token ratio stays above the
//! threshold. The sequence length divided by the number of factors estimates
//! the mean factor length; the estimate is taken in both reading directions
//! and averaged.

use std::collections::HashSet;

use crate::util::round_to;

pub const DEFAULT_TTR_THRESHOLD: f64 = 0.72;
pub const MIN_TOKENS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MtldEstimate {
    pub forward: f64,
    pub backward: f64,
}

impl MtldEstimate {
    pub fn value(&self) -> f64 {
        (self.forward + self.backward) / 2.0
    }
}

/// MTLD rounded to two decimals, or `0.0` below [`MIN_TOKENS`].
pub fn mtld<S: AsRef<str>>(tokens: &[S], threshold: f64) -> f64 {
    estimate(tokens, threshold)
        .map(|estimate| round_to(estimate.value(), 2))
        .unwrap_or(0.0)
}

pub fn estimate<S: AsRef<str>>(tokens: &[S], threshold: f64) -> Option<MtldEstimate> {
    if tokens.len() < MIN_TOKENS {
        return None;
    }

    let forward = pass_estimate(tokens.iter(), tokens.len(), threshold);
    let backward = pass_estimate(tokens.iter().rev(), tokens.len(), threshold);
    Some(MtldEstimate { forward, backward })
}

fn pass_estimate<'a, S, I>(tokens: I, length: usize, threshold: f64) -> f64
where
    S: AsRef<str> + 'a,
    I: Iterator<Item = &'a S>,
{
    let factors = factor_count(tokens, threshold);
    // No factor closed and no partial progress: the pass has no estimate.
    if factors > 0.0 {
        length as f64 / factors
    } else {
        0.0
    }
}

/// Full factors closed in one pass plus the fractional trailing factor.
pub fn factor_count<'a, S, I>(tokens: I, threshold: f64) -> f64
where
    S: AsRef<str> + 'a,
    I: Iterator<Item = &'a S>,
{
    let mut factors = 0.0;
    let mut types = HashSet::<&str>::new();
    let mut count = 0_usize;
    let mut ratio = 1.0;

    for token in tokens {
        types.insert(token.as_ref());
        count += 1;
        ratio = types.len() as f64 / count as f64;
        if ratio <= threshold {
            factors += 1.0;
            types.clear();
            count = 0;
            ratio = 1.0;
        }
    }

    if count > 0 && threshold < 1.0 {
        factors += (1.0 - ratio) / (1.0 - threshold);
    }

    factors
}
