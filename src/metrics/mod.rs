use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;

use crate::corpus::ComparisonKey;
use crate::model::AggregateKind;
use crate::schedule::{ComparisonScope, WorkerContext};

mod density;
mod diversity;
pub mod mtld;
mod overlap;
mod readability;
mod text;

pub const DEFAULT_TOP_N_KEYWORDS: usize = 20;

/// Tunables shared by every task of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricParams {
    pub mtld_threshold: f64,
    pub top_n_keywords: usize,
}

impl Default for MetricParams {
    fn default() -> Self {
        Self {
            mtld_threshold: mtld::DEFAULT_TTR_THRESHOLD,
            top_n_keywords: DEFAULT_TOP_N_KEYWORDS,
        }
    }
}

/// Per-version metric value or auxiliary data, computed from one text.
pub type CalcFn = fn(&str, &mut WorkerContext) -> Result<Value>;

/// Comparison metric over all versions of one document.
pub type CompareFn =
    fn(&ComparisonScope<'_>, &mut WorkerContext) -> Result<BTreeMap<ComparisonKey, Value>>;

#[derive(Clone, Copy)]
pub enum MetricKind {
    PerVersion {
        calculate: CalcFn,
        extra: Option<CalcFn>,
    },
    Comparison {
        compare: CompareFn,
    },
}

#[derive(Clone, Copy)]
pub struct MetricSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: MetricKind,
}

impl MetricSpec {
    pub fn aggregate_kind(&self) -> AggregateKind {
        match self.kind {
            MetricKind::PerVersion { .. } => AggregateKind::PerVersion,
            MetricKind::Comparison { .. } => AggregateKind::Comparison,
        }
    }
}

pub const REGISTRY: &[MetricSpec] = &[
    MetricSpec {
        name: "word_count",
        description: "Number of alphabetic tokens",
        kind: MetricKind::PerVersion {
            calculate: text::word_count,
            extra: None,
        },
    },
    MetricSpec {
        name: "sentence_count",
        description: "Number of sentences",
        kind: MetricKind::PerVersion {
            calculate: text::sentence_count,
            extra: None,
        },
    },
    MetricSpec {
        name: "avg_sentence_length",
        description: "Mean words per sentence",
        kind: MetricKind::PerVersion {
            calculate: text::avg_sentence_length,
            extra: Some(text::avg_sentence_length_extra),
        },
    },
    MetricSpec {
        name: "readability",
        description: "Flesch reading ease and Gunning fog index",
        kind: MetricKind::PerVersion {
            calculate: readability::readability,
            extra: Some(readability::readability_extra),
        },
    },
    MetricSpec {
        name: "ttr",
        description: "Type-token ratio over tokens and lemmas",
        kind: MetricKind::PerVersion {
            calculate: diversity::ttr,
            extra: Some(diversity::ttr_extra),
        },
    },
    MetricSpec {
        name: "mtld",
        description: "Measure of textual lexical diversity over tokens and lemmas",
        kind: MetricKind::PerVersion {
            calculate: diversity::mtld,
            extra: Some(diversity::mtld_extra),
        },
    },
    MetricSpec {
        name: "lexical_density",
        description: "Share of content words in percent",
        kind: MetricKind::PerVersion {
            calculate: density::lexical_density,
            extra: Some(density::lexical_density_extra),
        },
    },
    MetricSpec {
        name: "paragraph_count",
        description: "Number of blank-line separated paragraphs",
        kind: MetricKind::PerVersion {
            calculate: text::paragraph_count,
            extra: None,
        },
    },
    MetricSpec {
        name: "avg_word_length",
        description: "Mean characters per word",
        kind: MetricKind::PerVersion {
            calculate: text::avg_word_length,
            extra: Some(text::avg_word_length_extra),
        },
    },
    MetricSpec {
        name: "jaccard_similarity",
        description: "Jaccard index of lemma sets between versions",
        kind: MetricKind::Comparison {
            compare: overlap::jaccard_similarity,
        },
    },
    MetricSpec {
        name: "tfidf_overlap",
        description: "Overlap of top keywords between versions in percent",
        kind: MetricKind::Comparison {
            compare: overlap::tfidf_overlap,
        },
    },
];

pub fn lookup(name: &str) -> Option<&'static MetricSpec> {
    REGISTRY.iter().find(|spec| spec.name == name)
}
