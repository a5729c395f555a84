//! Compiles the pattern maps of an [`Options`] and classifies tool output.
//!
//! Patterns are compiled here, at first use, never when options are built.
//! A malformed pattern is a configuration error and is reported as
//! [`PatternError`], separate from any failure of the tool itself.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

use crate::options::Options;

/// A pattern key that is not a valid regular expression.
#[derive(Debug, Error)]
#[error("invalid pattern '{pattern}': {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

// ── PatternSet ───────────────────────────────────────────────────────────────

/// Compiled `pattern -> explanation` pairs, ordered by pattern text so the
/// first match is the same on every run.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    entries: Vec<(Regex, String)>,
}

impl PatternSet {
    pub fn compile(patterns: &HashMap<String, String>) -> Result<Self, PatternError> {
        Self::compile_with(patterns, |pattern| pattern.to_string())
    }

    /// Compiles each key after rewriting it with `wrap`. Errors still name
    /// the original key.
    fn compile_with(
        patterns: &HashMap<String, String>,
        wrap: impl Fn(&str) -> String,
    ) -> Result<Self, PatternError> {
        let mut keys: Vec<&String> = patterns.keys().collect();
        keys.sort();
        let entries = keys
            .into_iter()
            .map(|key| {
                let regex = Regex::new(&wrap(key)).map_err(|source| PatternError {
                    pattern: key.clone(),
                    source,
                })?;
                Ok((regex, patterns[key].clone()))
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { entries })
    }

    /// Explanation attached to the first pattern matching `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(regex, _)| regex.is_match(text))
            .map(|(_, explanation)| explanation.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ── Classification ───────────────────────────────────────────────────────────

/// Verdict on a failed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClass {
    /// Output matched a retryable pattern.
    Retryable { explanation: String },
    /// Nothing matched; surface the failure.
    Fatal,
}

/// A warnings-as-errors pattern matched the output of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningMatch {
    pub explanation: String,
}

impl Options {
    /// Compiles `retryable_errors`.
    pub fn retryable_patterns(&self) -> Result<PatternSet, PatternError> {
        PatternSet::compile(&self.retryable_errors)
    }

    /// Compiles `warnings_as_errors`, each key wrapped so it only matches a
    /// whole `Warning:` line of terraform output.
    pub fn warning_patterns(&self) -> Result<PatternSet, PatternError> {
        PatternSet::compile_with(&self.warnings_as_errors, |pattern| {
            format!("\nWarning: {pattern}[^\n]*\n")
        })
    }

    /// Compiles both pattern maps and reports the first invalid key.
    ///
    /// Nothing calls this implicitly; it lets a test fail on a bad pattern
    /// before the first terraform run.
    pub fn validate_patterns(&self) -> Result<(), PatternError> {
        self.retryable_patterns()?;
        self.warning_patterns()?;
        Ok(())
    }

    /// Classifies a failed run from its captured output and error text.
    pub fn classify_failure(
        &self,
        output: &str,
        error_text: &str,
    ) -> Result<FailureClass, PatternError> {
        let patterns = self.retryable_patterns()?;
        Ok(classify(&patterns, output, error_text))
    }

    /// Looks for an escalated warning in the output of a successful run.
    pub fn find_warning(&self, output: &str) -> Result<Option<WarningMatch>, PatternError> {
        let patterns = self.warning_patterns()?;
        Ok(patterns.find(output).map(|explanation| WarningMatch {
            explanation: explanation.to_string(),
        }))
    }
}

/// Classifies against an already compiled set, for drivers that compile once
/// per invocation and classify once per attempt.
#[must_use]
pub fn classify(patterns: &PatternSet, output: &str, error_text: &str) -> FailureClass {
    match patterns
        .find(output)
        .or_else(|| patterns.find(error_text))
    {
        Some(explanation) => FailureClass::Retryable {
            explanation: explanation.to_string(),
        },
        None => FailureClass::Fatal,
    }
}
