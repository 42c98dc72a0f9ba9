use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use serde_json::{Value, json};

use crate::corpus::ComparisonKey;
use crate::schedule::{ComparisonScope, WorkerContext};
use crate::util::round_to;

/// Below this many lemmas every lemma counts as a keyword.
const MIN_LEMMAS_FOR_RANKING: usize = 5;

/// Intersection over union, four decimals. Two empty sets are identical.
pub(super) fn jaccard(left: &BTreeSet<String>, right: &BTreeSet<String>) -> f64 {
    let union = left.union(right).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = left.intersection(right).count();
    round_to(intersection as f64 / union as f64, 4)
}

/// Shared keywords relative to the mean keyword-set size, in percent.
pub(super) fn keyword_overlap(left: &BTreeSet<String>, right: &BTreeSet<String>) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 100.0;
    }
    let intersection = left.intersection(right).count();
    let mean_size = (left.len() + right.len()) as f64 / 2.0;
    round_to(intersection as f64 / mean_size * 100.0, 2)
}

/// The `limit` most frequent lemmas, ties broken alphabetically.
///
/// Within a single document inverse document frequency is constant, so term
/// frequency alone orders the candidates.
pub(super) fn top_keywords(lemmas: &[String], limit: usize) -> BTreeSet<String> {
    if lemmas.len() < MIN_LEMMAS_FOR_RANKING {
        return lemmas.iter().cloned().collect();
    }

    let mut frequencies = HashMap::<&str, usize>::new();
    for lemma in lemmas {
        *frequencies.entry(lemma.as_str()).or_insert(0) += 1;
    }

    let mut ranked = frequencies.into_iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(lemma, _)| lemma.to_string())
        .collect()
}

fn lemma_set(text: &str, context: &mut WorkerContext) -> Result<BTreeSet<String>> {
    Ok(context.annotate(text)?.lemmas(true).into_iter().collect())
}

pub(super) fn jaccard_similarity(
    scope: &ComparisonScope<'_>,
    context: &mut WorkerContext,
) -> Result<BTreeMap<ComparisonKey, Value>> {
    scope.pairwise(
        context,
        lemma_set,
        |left, right| json!(jaccard(left, right)),
        None,
    )
}

pub(super) fn tfidf_overlap(
    scope: &ComparisonScope<'_>,
    context: &mut WorkerContext,
) -> Result<BTreeMap<ComparisonKey, Value>> {
    let limit = context.params().top_n_keywords;
    scope.pairwise(
        context,
        |text, context| Ok(top_keywords(&context.annotate(text)?.lemmas(true), limit)),
        |left, right| json!(keyword_overlap(left, right)),
        Some(json!({ "top_n_keywords": limit })),
    )
}
