use anyhow::Result;
use serde_json::{Value, json};

use crate::schedule::WorkerContext;
use crate::util::round_to;

const POLISH_VOWELS: &str = "aąeęioóuy";
const HARD_WORD_SYLLABLES: usize = 3;

/// Vowel count approximation of Polish syllables; every word has at least one.
pub(super) fn count_syllables(word: &str) -> usize {
    word.to_lowercase()
        .chars()
        .filter(|ch| POLISH_VOWELS.contains(*ch))
        .count()
        .max(1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct ReadabilityScores {
    pub(super) flesch_reading_ease: f64,
    pub(super) fog_index: f64,
    pub(super) avg_sentence_length: f64,
    pub(super) avg_syllables_per_word: f64,
    pub(super) hard_words_count: usize,
    pub(super) hard_words_percent: f64,
}

pub(super) fn score<S: AsRef<str>>(tokens: &[S], sentence_count: usize) -> ReadabilityScores {
    let word_count = tokens.len();
    let syllables = tokens
        .iter()
        .map(|token| count_syllables(token.as_ref()))
        .collect::<Vec<_>>();
    let total_syllables = syllables.iter().sum::<usize>();
    let hard_words_count = syllables
        .iter()
        .filter(|count| **count >= HARD_WORD_SYLLABLES)
        .count();

    let words = word_count.max(1) as f64;
    let sentences = sentence_count.max(1) as f64;
    let asl = word_count as f64 / sentences;
    let asw = total_syllables as f64 / words;
    let hard_percent = hard_words_count as f64 / words * 100.0;

    let (flesch_reading_ease, fog_index) = if word_count == 0 || sentence_count == 0 {
        (0.0, 0.0)
    } else {
        (
            round_to(206.835 - 1.015 * asl - 84.6 * asw, 2),
            round_to(0.4 * (asl + hard_percent), 2),
        )
    };

    ReadabilityScores {
        flesch_reading_ease,
        fog_index,
        avg_sentence_length: round_to(asl, 2),
        avg_syllables_per_word: round_to(asw, 2),
        hard_words_count,
        hard_words_percent: round_to(hard_percent, 2),
    }
}

pub(super) fn readability_level(flesch_reading_ease: f64) -> &'static str {
    match flesch_reading_ease {
        score if score >= 90.0 => "very_easy",
        score if score >= 80.0 => "easy",
        score if score >= 70.0 => "fairly_easy",
        score if score >= 60.0 => "standard",
        score if score >= 50.0 => "fairly_difficult",
        score if score >= 30.0 => "difficult",
        _ => "very_difficult",
    }
}

fn scores_for(text: &str, context: &mut WorkerContext) -> Result<ReadabilityScores> {
    let annotation = context.annotate(text)?;
    Ok(score(&annotation.tokens(true), annotation.sentences().len()))
}

pub(super) fn readability(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let scores = scores_for(text, context)?;
    Ok(json!({
        "flesch_reading_ease": scores.flesch_reading_ease,
        "fog_index": scores.fog_index,
        "readability_level": readability_level(scores.flesch_reading_ease),
    }))
}

pub(super) fn readability_extra(text: &str, context: &mut WorkerContext) -> Result<Value> {
    let scores = scores_for(text, context)?;
    Ok(json!({
        "avg_sentence_length": scores.avg_sentence_length,
        "avg_syllables_per_word": scores.avg_syllables_per_word,
        "hard_words_count": scores.hard_words_count,
        "hard_words_percent": scores.hard_words_percent,
    }))
}
