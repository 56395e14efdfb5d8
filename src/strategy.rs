//! Strategy/Context plumbing shared by every pipeline stage
//!
//! Each stage (ingestion, inspection, cleaning, feature engineering, splitting,
//! model building, evaluation) exposes a closed `enum` of concrete strategies
//! implementing [`Strategy`]. A [`Context`] holds the currently selected
//! strategy and forwards calls to it unchanged.

use crate::error::Result;

/// A single-operation capability contract.
pub trait Strategy {
    /// Borrowed input the strategy operates on
    type Input<'a>;
    /// Value produced by a successful run
    type Output;

    /// Run the strategy
    fn execute(&self, input: Self::Input<'_>) -> Result<Self::Output>;
}

/// Holds one selected strategy and delegates to it.
#[derive(Debug, Clone)]
pub struct Context<S: Strategy> {
    strategy: S,
}

impl<S: Strategy> Context<S> {
    /// Create a context around an initial strategy
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    /// Replace the current strategy. No validation is performed.
    pub fn set_strategy(&mut self, strategy: S) {
        self.strategy = strategy;
    }

    /// Currently selected strategy
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Forward to the selected strategy and return its result verbatim
    pub fn execute(&self, input: S::Input<'_>) -> Result<S::Output> {
        self.strategy.execute(input)
    }
}
