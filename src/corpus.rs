use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::model::ArticleRecord;

pub const DEFAULT_VERSIONS: [&str; 3] = ["adult_full", "adult_short", "child_short"];

const ARTICLE_EXTENSION: &str = "json";
const COMPARISON_KEY_SEPARATOR: &str = "__";

/// Ordered, duplicate-free set of version labels shared by every document in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSet {
    labels: Vec<String>,
}

impl VersionSet {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut resolved = Vec::<String>::new();
        for label in labels {
            let label = label.into().trim().to_string();
            if label.is_empty() {
                bail!("version labels must not be empty");
            }
            if label.contains(COMPARISON_KEY_SEPARATOR) || label.contains(['/', '\\']) {
                bail!("version label contains a reserved sequence: {label}");
            }
            if resolved.contains(&label) {
                bail!("duplicate version label: {label}");
            }
            resolved.push(label);
        }

        if resolved.is_empty() {
            bail!("at least one version label is required");
        }

        Ok(Self { labels: resolved })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Every unordered pair of distinct versions, in enumeration order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for (index, first) in self.labels.iter().enumerate() {
            for second in &self.labels[index + 1..] {
                pairs.push((first.as_str(), second.as_str()));
            }
        }
        pairs
    }
}

impl Default for VersionSet {
    fn default() -> Self {
        Self {
            labels: DEFAULT_VERSIONS.iter().map(|label| label.to_string()).collect(),
        }
    }
}

/// Canonical name for an unordered pair of distinct versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonKey(String);

impl ComparisonKey {
    /// Returns `None` when both sides name the same version.
    pub fn new(first: &str, second: &str) -> Option<Self> {
        if first == second {
            return None;
        }
        let (low, high) = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        Some(Self(format!("{low}{COMPARISON_KEY_SEPARATOR}{high}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComparisonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only access to the documents of a corpus.
///
/// `load_content` distinguishes an absent `(document, version)` pair
/// (`Ok(None)`) from a pair that exists but could not be read (`Err`).
pub trait DocumentSource: Send + Sync {
    fn list_documents(&self) -> Result<Vec<String>>;

    fn load_content(&self, document: &str, version: &str) -> Result<Option<String>>;

    fn describe(&self) -> String;
}

/// Corpus laid out as `<root>/<document>/<version>.json`.
#[derive(Debug, Clone)]
pub struct FsCorpus {
    root: PathBuf,
}

impl FsCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn article_path(&self, document: &str, version: &str) -> PathBuf {
        self.root
            .join(document)
            .join(format!("{version}.{ARTICLE_EXTENSION}"))
    }

    pub fn load_article(&self, document: &str, version: &str) -> Result<Option<ArticleRecord>> {
        let path = self.article_path(document, version);
        if !path.is_file() {
            return Ok(None);
        }

        let raw =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let article: ArticleRecord = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse article {}", path.display()))?;
        Ok(Some(article))
    }
}

impl DocumentSource for FsCorpus {
    fn list_documents(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            bail!("corpus root does not exist: {}", self.root.display());
        }

        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("failed to read {}", self.root.display()))?;

        let mut documents = Vec::new();
        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", self.root.display()))?;
            let path = entry.path();

            if !entry
                .file_type()
                .with_context(|| format!("failed to inspect file type: {}", path.display()))?
                .is_dir()
            {
                continue;
            }

            let name = entry
                .file_name()
                .to_str()
                .map(ToOwned::to_owned)
                .with_context(|| format!("invalid UTF-8 directory name: {}", path.display()))?;
            if name.starts_with('.') {
                continue;
            }
            documents.push(name);
        }

        documents.sort();
        Ok(documents)
    }

    fn load_content(&self, document: &str, version: &str) -> Result<Option<String>> {
        Ok(self
            .load_article(document, version)?
            .map(|article| article.content))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::BTreeMap;

    use anyhow::{Result, anyhow};

    use super::DocumentSource;

    /// In-memory corpus; `fail` entries exist but cannot be loaded.
    #[derive(Debug, Default)]
    pub struct MemoryCorpus {
        documents: BTreeMap<String, BTreeMap<String, Option<String>>>,
    }

    impl MemoryCorpus {
        pub fn with(mut self, document: &str, version: &str, content: &str) -> Self {
            self.documents
                .entry(document.to_string())
                .or_default()
                .insert(version.to_string(), Some(content.to_string()));
            self
        }

        pub fn with_document(mut self, document: &str) -> Self {
            self.documents.entry(document.to_string()).or_default();
            self
        }

        pub fn fail(mut self, document: &str, version: &str) -> Self {
            self.documents
                .entry(document.to_string())
                .or_default()
                .insert(version.to_string(), None);
            self
        }
    }

    impl DocumentSource for MemoryCorpus {
        fn list_documents(&self) -> Result<Vec<String>> {
            Ok(self.documents.keys().cloned().collect())
        }

        fn load_content(&self, document: &str, version: &str) -> Result<Option<String>> {
            match self
                .documents
                .get(document)
                .and_then(|versions| versions.get(version))
            {
                None => Ok(None),
                Some(Some(content)) => Ok(Some(content.clone())),
                Some(None) => Err(anyhow!("simulated read failure for {document}/{version}")),
            }
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }
}
