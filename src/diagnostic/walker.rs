//! Forward-only walker over a [`DiagnosticTree`].
//!
//! The walker owns the loaded tree and a [`WalkState`]. The current node is
//! re-resolved from the root by following the chosen path, so a failed
//! `choose` never has anything to roll back.
//!
//! There is no "back" operation: users pick one of the offered options or
//! restart from the root.
use serde::Serialize;

use super::{Branch, DiagnosticError, DiagnosticTree, QuestionNode};

/// A question ready to be shown: text plus option keys in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub question: String,
    pub options: Vec<String>,
}

impl Prompt {
    fn from_node(node: &QuestionNode) -> Self {
        Self {
            question: node.question.clone(),
            options: node.option_keys(),
        }
    }
}

/// Result of a single choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// The choice led to another question.
    Continue(Prompt),
    /// The choice reached a leaf.
    Terminal { diagnosis: String },
}

/// Progress through the tree since the last `start()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkState {
    /// Option keys chosen so far, root first. Only keys that led to a
    /// question are recorded.
    pub path: Vec<String>,
    /// Diagnosis reached, if the walk has finished.
    pub outcome: Option<String>,
}

#[derive(Debug, Default)]
pub struct DiagnosticWalker {
    tree: Option<DiagnosticTree>,
    state: Option<WalkState>,
}

impl DiagnosticWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the tree.
    ///
    /// Loading the same tree twice is a no-op. Loading a different tree over
    /// an existing one fails with [`DiagnosticError::TreeConflict`].
    pub fn load(&mut self, tree: DiagnosticTree) -> Result<(), DiagnosticError> {
        match &self.tree {
            Some(existing) if *existing == tree => Ok(()),
            Some(_) => Err(DiagnosticError::TreeConflict),
            None => {
                self.tree = Some(tree);
                Ok(())
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.tree.is_some()
    }

    pub fn tree(&self) -> Option<&DiagnosticTree> {
        self.tree.as_ref()
    }

    /// Begin a new walk at the root and return its prompt.
    pub fn start(&mut self) -> Result<Prompt, DiagnosticError> {
        let tree = self.tree.as_ref().ok_or(DiagnosticError::NotLoaded)?;
        let prompt = Prompt::from_node(&tree.start);
        self.state = Some(WalkState::default());
        Ok(prompt)
    }

    /// Same as [`start`](Self::start).
    pub fn restart(&mut self) -> Result<Prompt, DiagnosticError> {
        self.start()
    }

    /// Begin a new walk already positioned after `path`, as if each key had
    /// been chosen in turn. Every key must lead to a question.
    ///
    /// On error the walk state is unchanged.
    pub fn resume(&mut self, path: &[String]) -> Result<Prompt, DiagnosticError> {
        let tree = self.tree.as_ref().ok_or(DiagnosticError::NotLoaded)?;
        let prompt = Prompt::from_node(resolve(tree, path)?);
        self.state = Some(WalkState {
            path: path.to_vec(),
            outcome: None,
        });
        Ok(prompt)
    }

    /// Pick `option_key` at the current question.
    ///
    /// On error the walk state is unchanged.
    pub fn choose(&mut self, option_key: &str) -> Result<Step, DiagnosticError> {
        let tree = self.tree.as_ref().ok_or(DiagnosticError::NotLoaded)?;
        let state = self.state.as_mut().ok_or(DiagnosticError::NotStarted)?;
        if state.outcome.is_some() {
            return Err(DiagnosticError::Finished);
        }

        let node = resolve(tree, &state.path)?;
        let branch = node
            .options
            .get(option_key)
            .ok_or_else(|| DiagnosticError::InvalidOption {
                key: option_key.to_string(),
            })?;

        match branch {
            Branch::Question(next) => {
                state.path.push(option_key.to_string());
                Ok(Step::Continue(Prompt::from_node(next)))
            }
            Branch::Diagnosis(text) => {
                state.outcome = Some(text.clone());
                Ok(Step::Terminal {
                    diagnosis: text.clone(),
                })
            }
        }
    }

    /// Prompt for the question the walk is currently at.
    pub fn current_prompt(&self) -> Result<Prompt, DiagnosticError> {
        let tree = self.tree.as_ref().ok_or(DiagnosticError::NotLoaded)?;
        let state = self.state.as_ref().ok_or(DiagnosticError::NotStarted)?;
        resolve(tree, &state.path).map(Prompt::from_node)
    }

    /// Keys chosen since the last start. Empty when no walk is active.
    pub fn path(&self) -> &[String] {
        self.state.as_ref().map(|s| s.path.as_slice()).unwrap_or(&[])
    }

    pub fn outcome(&self) -> Option<&str> {
        self.state.as_ref().and_then(|s| s.outcome.as_deref())
    }

    pub fn state(&self) -> Option<&WalkState> {
        self.state.as_ref()
    }
}

/// Follow `path` from the root. Every key on a recorded path led to a
/// question when it was chosen, and the tree never changes after load.
fn resolve<'t>(
    tree: &'t DiagnosticTree,
    path: &[String],
) -> Result<&'t QuestionNode, DiagnosticError> {
    let mut node = &tree.start;
    for key in path {
        node = match node.options.get(key) {
            Some(Branch::Question(next)) => next,
            _ => return Err(DiagnosticError::InvalidOption { key: key.clone() }),
        };
    }
    Ok(node)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
