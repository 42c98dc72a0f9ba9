use anyhow::Result;
use serde_json::{Value, json};

use crate::schedule::WorkerContext;
use crate::util::round_to;

pub(super) fn word_count(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let annotation = context.annotate(text)?;
    Ok(json!(annotation.tokens(true).len()))
}

pub(super) fn sentence_count(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let annotation = context.annotate(text)?;
    Ok(json!(annotation.sentences().len()))
}

pub(super) fn paragraph_count(text: &str, _context: &mut WorkerContext) -> Result<Value> {
    Ok(json!(count_paragraphs(text)))
}

pub(super) fn count_paragraphs(text: &str) -> usize {
    text.split("\n\n")
        .filter(|paragraph| !paragraph.trim().is_empty())
        .count()
}

pub(super) fn avg_sentence_length(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let annotation = context.annotate(text)?;
    let words = annotation.tokens(true).len();
    let sentences = annotation.sentences().len();
    Ok(json!(mean_sentence_length(words, sentences)))
}

pub(super) fn avg_sentence_length_extra(
    text: &str,
    context: &mut WorkerContext,
) -> Result<Value> {
    let annotation = context.annotate(text)?;
    Ok(json!({
        "word_count": annotation.tokens(true).len(),
        "sentence_count": annotation.sentences().len(),
    }))
}

pub(super) fn mean_sentence_length(words: usize, sentences: usize) -> f64 {
    if sentences == 0 {
        return 0.0;
    }
    round_to(words as f64 / sentences as f64, 2)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct WordLengthStats {
    pub(super) avg_word_length: f64,
    pub(super) total_chars: usize,
    pub(super) word_count: usize,
}

pub(super) fn word_length_stats<S: AsRef<str>>(tokens: &[S]) -> WordLengthStats {
    let total_chars = tokens
        .iter()
        .map(|token| token.as_ref().chars().count())
        .sum::<usize>();
    let avg_word_length = if tokens.is_empty() {
        0.0
    } else {
        round_to(total_chars as f64 / tokens.len() as f64, 2)
    };

    WordLengthStats {
        avg_word_length,
        total_chars,
        word_count: tokens.len(),
    }
}

pub(super) fn avg_word_length(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let tokens = context.annotate(text)?.tokens(false);
    Ok(json!(word_length_stats(&tokens).avg_word_length))
}

pub(super) fn avg_word_length_extra(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let tokens = context.annotate(text)?.tokens(false);
    let stats = word_length_stats(&tokens);
    Ok(json!({
        "total_chars": stats.total_chars,
        "word_count": stats.word_count,
    }))
}
