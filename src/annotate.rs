use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Universal POS tags counted as content words.
pub const CONTENT_POS: [&str; 4] = ["NOUN", "VERB", "ADJ", "ADV"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub text: String,
    pub lemma: String,
    #[serde(default)]
    pub pos: String,
    pub is_alpha: bool,
}

impl AnnotatedToken {
    pub fn is_content_word(&self) -> bool {
        self.is_alpha && CONTENT_POS.contains(&self.pos.as_str())
    }
}

/// Tokens and sentences of one text, as produced by an annotator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub tokens: Vec<AnnotatedToken>,
    #[serde(default)]
    pub sentences: Vec<String>,
}

impl Annotation {
    /// Alphabetic word forms in text order.
    pub fn tokens(&self, lowercase: bool) -> Vec<String> {
        self.alpha_tokens()
            .map(|token| fold_case(&token.text, lowercase))
            .collect()
    }

    pub fn lemmas(&self, lowercase: bool) -> Vec<String> {
        self.alpha_tokens()
            .map(|token| fold_case(&token.lemma, lowercase))
            .collect()
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn content_words(&self) -> Vec<String> {
        self.tokens
            .iter()
            .filter(|token| token.is_content_word())
            .map(|token| token.text.to_lowercase())
            .collect()
    }

    pub fn pos_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for token in self.alpha_tokens() {
            *counts.entry(token.pos.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn alpha_tokens(&self) -> impl Iterator<Item = &AnnotatedToken> {
        self.tokens.iter().filter(|token| token.is_alpha)
    }
}

fn fold_case(value: &str, lowercase: bool) -> String {
    if lowercase {
        value.to_lowercase()
    } else {
        value.to_string()
    }
}

/// Tokenization, lemmatization, tagging and sentence splitting for one worker.
pub trait Annotator {
    fn annotate(&mut self, text: &str) -> Result<Annotation>;
}

/// Builds annotators. Called at most once per worker, on first use.
pub trait AnnotatorFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Annotator>>;
}

impl<F> AnnotatorFactory for F
where
    F: Fn() -> Result<Box<dyn Annotator>> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn Annotator>> {
        self()
    }
}

/// Dependency-free annotator: Unicode word tokens, lowercased forms as lemmas,
/// no part-of-speech tags.
#[derive(Debug, Clone)]
pub struct RegexAnnotator {
    word: Regex,
    sentence: Regex,
}

impl RegexAnnotator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            word: Regex::new(r"\w+").context("failed to compile word regex")?,
            sentence: Regex::new(r"[^.!?…\n]+[.!?…]*")
                .context("failed to compile sentence regex")?,
        })
    }
}

impl Annotator for RegexAnnotator {
    fn annotate(&mut self, text: &str) -> Result<Annotation> {
        let tokens = self
            .word
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|word| word.chars().all(char::is_alphabetic))
            .map(|word| AnnotatedToken {
                text: word.to_string(),
                lemma: word.to_lowercase(),
                pos: String::new(),
                is_alpha: true,
            })
            .collect();

        let sentences = self
            .sentence
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|sentence| sentence.chars().any(char::is_alphanumeric))
            .map(ToOwned::to_owned)
            .collect();

        Ok(Annotation { tokens, sentences })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexAnnotatorFactory;

impl AnnotatorFactory for RegexAnnotatorFactory {
    fn create(&self) -> Result<Box<dyn Annotator>> {
        Ok(Box::new(RegexAnnotator::new()?))
    }
}

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    annotation: Annotation,
}

/// Long-lived external annotation process speaking line-delimited JSON.
///
/// Each request is `{"text": ...}` on one line; each response is one line
/// holding `{"tokens": [...], "sentences": [...]}` or `{"error": ...}`.
pub struct CommandAnnotator {
    program: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl CommandAnnotator {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to execute annotator {program}"))?;

        let stdin = child
            .stdin
            .take()
            .with_context(|| format!("annotator {program} has no stdin"))?;
        let stdout = child
            .stdout
            .take()
            .with_context(|| format!("annotator {program} has no stdout"))?;

        debug!(program, pid = child.id(), "annotator process started");

        Ok(Self {
            program: program.to_string(),
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
        })
    }
}

impl Annotator for CommandAnnotator {
    fn annotate(&mut self, text: &str) -> Result<Annotation> {
        let stdin = self
            .stdin
            .as_mut()
            .with_context(|| format!("annotator {} input is closed", self.program))?;

        let mut request = serde_json::to_vec(&AnnotateRequest { text })
            .context("failed to serialize annotation request")?;
        request.push(b'\n');
        stdin
            .write_all(&request)
            .and_then(|()| stdin.flush())
            .with_context(|| format!("failed to send text to annotator {}", self.program))?;

        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .with_context(|| format!("failed to read from annotator {}", self.program))?;
        if read == 0 {
            bail!("annotator {} closed its output", self.program);
        }

        let response: AnnotateResponse = serde_json::from_str(line.trim_end())
            .with_context(|| format!("annotator {} returned malformed json", self.program))?;
        if let Some(error) = response.error {
            bail!("annotator {} failed: {}", self.program, error);
        }

        Ok(response.annotation)
    }
}

impl Drop for CommandAnnotator {
    fn drop(&mut self) {
        self.stdin.take();
        let _ = self.child.wait();
    }
}

#[derive(Debug, Clone)]
pub struct CommandAnnotatorFactory {
    program: String,
    args: Vec<String>,
}

impl CommandAnnotatorFactory {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl AnnotatorFactory for CommandAnnotatorFactory {
    fn create(&self) -> Result<Box<dyn Annotator>> {
        Ok(Box::new(CommandAnnotator::spawn(&self.program, &self.args)?))
    }
}

#[cfg(test)]
mod tests;
