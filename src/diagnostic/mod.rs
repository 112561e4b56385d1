//! Guided symptom triage over a diagnostic decision tree.
//!
//! The tree is fetched from the backend's knowledge endpoint once per
//! session and never mutated afterwards. Each [`QuestionNode`] carries an
//! ordered set of options; every option either leads to another question or
//! terminates in a diagnosis string.
//!
//! Walking the tree one choice at a time is the job of
//! [`walker::DiagnosticWalker`].
pub mod walker;

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use walker::{DiagnosticWalker, Prompt, Step};

// ---------------------------------------------------------------------------
// Tree model
// ---------------------------------------------------------------------------

/// The complete diagnostic tree as served by `GET /api/knowledge/diagnostic-tree`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticTree {
    pub start: QuestionNode,
}

/// A single question and the options offered for it.
///
/// `options` preserves the document order of the JSON object: that order is
/// the order buttons are shown in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionNode {
    pub question: String,
    pub options: IndexMap<String, Branch>,
}

/// Where an option leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Branch {
    /// Terminal leaf: the diagnosis text.
    Diagnosis(String),
    /// A follow-up question.
    Question(QuestionNode),
}

impl DiagnosticTree {
    /// Largest number of choices needed to reach any diagnosis.
    pub fn max_depth(&self) -> usize {
        self.start.depth()
    }
}

impl QuestionNode {
    /// Option keys in display order.
    pub fn option_keys(&self) -> Vec<String> {
        self.options.keys().cloned().collect()
    }

    fn depth(&self) -> usize {
        self.options
            .values()
            .map(|branch| match branch {
                Branch::Diagnosis(_) => 1,
                Branch::Question(node) => 1 + node.depth(),
            })
            .max()
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Contract violations raised by the walker. None of these are retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticError {
    #[error("diagnostic tree has not been loaded")]
    NotLoaded,
    #[error("diagnosis has not been started")]
    NotStarted,
    #[error("diagnosis already finished; restart to walk again")]
    Finished,
    #[error("option '{key}' is not offered by the current question")]
    InvalidOption { key: String },
    #[error("a different diagnostic tree is already loaded")]
    TreeConflict,
}

// ---------------------------------------------------------------------------
// Option labels
// ---------------------------------------------------------------------------

/// First ASCII word character after an ASCII word boundary. Non-ASCII
/// letters count as separators, so `éa` becomes `éA`.
static WORD_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)[A-Za-z0-9_]").expect("word-start regex must compile")
});

/// Turn an option key into a button label.
///
/// Underscores become spaces and the first character of every word is
/// upper-cased: `bercak_coklat` → `Bercak Coklat`.
pub fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    WORD_START
        .replace_all(&spaced, |caps: &regex::Captures| caps[0].to_ascii_uppercase())
        .into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
