use std::collections::HashSet;

use anyhow::Result;
use serde_json::{Value, json};

use super::mtld::mtld as mtld_value;
use crate::schedule::WorkerContext;
use crate::util::round_to;

pub(super) fn unique_count<S: AsRef<str>>(tokens: &[S]) -> usize {
    tokens
        .iter()
        .map(|token| token.as_ref())
        .collect::<HashSet<&str>>()
        .len()
}

/// Distinct over total, four decimals; `0.0` for an empty sequence.
pub(super) fn type_token_ratio<S: AsRef<str>>(tokens: &[S]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    round_to(unique_count(tokens) as f64 / tokens.len() as f64, 4)
}

pub(super) fn ttr(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let annotation = context.annotate(text)?;
    let tokens = annotation.tokens(true);
    let lemmas = annotation.lemmas(true);
    Ok(json!({
        "ttr_tokens": type_token_ratio(&tokens),
        "ttr_lemmas": type_token_ratio(&lemmas),
    }))
}

pub(super) fn ttr_extra(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let annotation = context.annotate(text)?;
    let tokens = annotation.tokens(true);
    let lemmas = annotation.lemmas(true);
    Ok(json!({
        "unique_tokens": unique_count(&tokens),
        "total_tokens": tokens.len(),
        "unique_lemmas": unique_count(&lemmas),
        "total_lemmas": lemmas.len(),
    }))
}

pub(super) fn mtld(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let threshold = context.params().mtld_threshold;
    let annotation = context.annotate(text)?;
    Ok(json!({
        "mtld_tokens": mtld_value(&annotation.tokens(true), threshold),
        "mtld_lemmas": mtld_value(&annotation.lemmas(true), threshold),
    }))
}

pub(super) fn mtld_extra(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let threshold = context.params().mtld_threshold;
    let annotation = context.annotate(text)?;
    Ok(json!({
        "token_count": annotation.tokens(true).len(),
        "lemma_count": annotation.lemmas(true).len(),
        "threshold": threshold,
    }))
}
