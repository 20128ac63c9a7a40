//! Pass trait and types for compilation passes.

use qreg_ir::QuantumFunction;

use crate::error::CompileResult;
use crate::property::PropertySet;

/// The kind of compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Reads the function and publishes results to the `PropertySet`.
    Analysis,
    /// Replaces the function's instruction list.
    Transformation,
}

/// A compilation pass over one register-versioned function.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass.
    ///
    /// Analysis passes leave `function` untouched. Transformation passes build
    /// a new instruction list and install it with
    /// [`QuantumFunction::replace_ops`].
    fn run(&self, function: &mut QuantumFunction, properties: &mut PropertySet)
    -> CompileResult<()>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _function: &QuantumFunction, _properties: &PropertySet) -> bool {
        true
    }
}
