//! Pass manager for orchestrating compilation.

use tracing::{debug, info, instrument};

use qreg_ir::QuantumFunction;

use crate::config::CompileConfig;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{ConstraintEnforcement, SafetyVerification, TimelineAnalysis};
use crate::property::PropertySet;

/// Manages and executes a sequence of compilation passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given function.
    #[instrument(skip(self, function, properties), fields(function = %function.name()))]
    pub fn run(
        &self,
        function: &mut QuantumFunction,
        properties: &mut PropertySet,
    ) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on {} ops",
            self.passes.len(),
            function.len()
        );

        for pass in &self.passes {
            if pass.should_run(function, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(function, properties)?;
                debug!("Pass {} completed, ops: {}", pass.name(), function.len());
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, ops: {}, registers: {}",
            function.len(),
            function.num_registers()
        );
        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Names of the passes, in order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the standard pipeline.
pub struct PassManagerBuilder {
    config: CompileConfig,
    timeline: bool,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: CompileConfig::default(),
            timeline: false,
        }
    }

    /// Use the given configuration.
    #[must_use]
    pub fn with_config(mut self, config: CompileConfig) -> Self {
        self.config = config;
        self
    }

    /// Publish the final register timeline as a property.
    #[must_use]
    pub fn with_timeline(mut self) -> Self {
        self.timeline = true;
        self
    }

    /// Build the pass manager and return it with the properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let mut pm = PassManager::new();

        if self.config.enforce {
            pm.add_pass(ConstraintEnforcement);
        }
        if self.timeline {
            pm.add_pass(TimelineAnalysis);
        }
        // Verification goes last so that it sees every rewrite.
        if self.config.verify {
            pm.add_pass(SafetyVerification);
        }

        (pm, PropertySet::from_config(&self.config))
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
