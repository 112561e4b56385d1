use tracing::{debug, info};

use super::FlowError;
use crate::backend::MarketBackend;
use crate::diagnostic::{DiagnosticWalker, Prompt, Step};

/// The symptom-diagnosis flow: lazy tree load plus a walker.
#[derive(Debug, Default)]
pub struct DiagnosticFlow {
    walker: DiagnosticWalker,
}

impl DiagnosticFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a diagnosis, fetching the tree on first use.
    ///
    /// The tree is fetched at most once per flow. A failed fetch leaves the
    /// flow unloaded so the next start tries again.
    pub fn start(&mut self, backend: &impl MarketBackend) -> Result<Prompt, FlowError> {
        self.ensure_loaded(backend)?;
        Ok(self.walker.start()?)
    }

    /// Start a walk positioned after `path`, fetching the tree if needed.
    ///
    /// Lets a caller that tracks its own progress (one dashboard tab among
    /// several) continue from where it was, whatever other callers did to
    /// the shared walk in between.
    pub fn resume(
        &mut self,
        backend: &impl MarketBackend,
        path: &[String],
    ) -> Result<Prompt, FlowError> {
        self.ensure_loaded(backend)?;
        Ok(self.walker.resume(path)?)
    }

    fn ensure_loaded(&mut self, backend: &impl MarketBackend) -> Result<(), FlowError> {
        if !self.walker.is_loaded() {
            debug!("fetching diagnostic tree");
            let tree = backend.diagnostic_tree()?;
            info!(depth = tree.max_depth(), "diagnostic tree loaded");
            self.walker.load(tree)?;
        }
        Ok(())
    }

    pub fn choose(&mut self, option_key: &str) -> Result<Step, FlowError> {
        Ok(self.walker.choose(option_key)?)
    }

    pub fn restart(&mut self) -> Result<Prompt, FlowError> {
        Ok(self.walker.restart()?)
    }

    pub fn walker(&self) -> &DiagnosticWalker {
        &self.walker
    }
}
