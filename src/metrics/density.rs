use anyhow::Result;
use serde_json::{Value, json};

use crate::annotate::Annotation;
use crate::schedule::WorkerContext;
use crate::util::round_to;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct DensityBreakdown {
    pub(super) density: f64,
    pub(super) content_words: usize,
    pub(super) total_words: usize,
    pub(super) nouns: usize,
    pub(super) verbs: usize,
    pub(super) adjectives: usize,
    pub(super) adverbs: usize,
}

pub(super) fn breakdown(annotation: &Annotation) -> DensityBreakdown {
    let total_words = annotation.tokens(false).len();
    let content_words = annotation.content_words().len();
    let pos = annotation.pos_counts();
    let count = |tag: &str| pos.get(tag).copied().unwrap_or(0);

    let density = if total_words == 0 {
        0.0
    } else {
        round_to(content_words as f64 / total_words as f64 * 100.0, 2)
    };

    DensityBreakdown {
        density,
        content_words,
        total_words,
        nouns: count("NOUN"),
        verbs: count("VERB"),
        adjectives: count("ADJ"),
        adverbs: count("ADV"),
    }
}

pub(super) fn interpretation(density: f64) -> &'static str {
    match density {
        value if value >= 60.0 => "very_dense",
        value if value >= 50.0 => "dense",
        value if value >= 40.0 => "moderate",
        _ => "low",
    }
}

pub(super) fn lexical_density(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let annotation = context.annotate(text)?;
    Ok(json!(breakdown(annotation).density))
}

pub(super) fn lexical_density_extra(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let annotation = context.annotate(text)?;
    let stats = breakdown(annotation);
    Ok(json!({
        "content_words_count": stats.content_words,
        "total_words_count": stats.total_words,
        "function_words_count": stats.total_words - stats.content_words,
        "pos_breakdown": {
            "nouns": stats.nouns,
            "verbs": stats.verbs,
            "adjectives": stats.adjectives,
            "adverbs": stats.adverbs,
        },
        "interpretation": interpretation(stats.density),
    }))
}
