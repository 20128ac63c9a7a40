//! Quantum-safe register allocation for classical integer arithmetic.
//!
//! This crate turns a [`ClassicalFunction`](qreg_ir::ClassicalFunction) into
//! register-versioned operations that a reversible backend can execute:
//!
//! - [`QuantumSafeTranslator`]: lowers SSA values onto registers, linearises
//!   conditional branches into predicated operations and regenerates values
//!   whose register was overwritten
//! - [`passes::ConstraintEnforcement`]: repairs any function so that no
//!   overwritten version is read and no operation duplicates a register into
//!   itself
//! - [`passes::SafetyVerification`]: checks both constraints and fails the
//!   compilation otherwise
//! - [`PassManager`]: runs passes over a [`QuantumFunction`](qreg_ir::QuantumFunction)
//!
//! # Example
//!
//! ```
//! use qreg_compile::{CompileConfig, compile};
//! use qreg_ir::{ArithOp, FunctionBuilder, Predicate};
//!
//! let mut b = FunctionBuilder::new("abs_diff");
//! let x = b.constant(2);
//! let y = b.constant(5);
//! let lt = b.compare(Predicate::Lt, x, y);
//! let d = b.select(lt, y, x);
//! let e = b.select(lt, x, y);
//! let r = b.binary(ArithOp::Sub, d, e);
//! b.ret(Some(r));
//!
//! let config = CompileConfig::with_bits(5).unwrap();
//! let out = compile(&b.finish(), &config).unwrap();
//! assert!(out.function.returned_value().is_some());
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod manager;
pub mod pass;
pub mod passes;
pub mod property;
pub mod translate;

pub use config::CompileConfig;
pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use property::PropertySet;
pub use translate::{ControlStack, Predicated, QuantumSafeTranslator, Translation};

use qreg_ir::ClassicalFunction;
use tracing::{debug, instrument};

use crate::passes::EnforcementReport;

/// Translate `function` and run the configured passes over the result.
///
/// Bindings of classical values are updated when enforcement moves a result
/// to another register.
#[instrument(skip_all, fields(function = %function.name, bits = config.bit_width.bits()))]
pub fn compile(function: &ClassicalFunction, config: &CompileConfig) -> CompileResult<Translation> {
    let translator = QuantumSafeTranslator::new(config.bit_width);
    let mut translation = translator.translate(function)?;

    let (pm, mut properties) = PassManagerBuilder::new().with_config(*config).build();
    pm.run(&mut translation.function, &mut properties)?;

    if let Some(report) = properties.get::<EnforcementReport>() {
        for binding in translation.bindings.values_mut() {
            if let Some(moved) = report.relocated.get(&binding.slot) {
                debug!("binding {} relocated to {}", binding, moved);
                *binding = moved.with_path(binding.path);
            }
        }
    }

    Ok(translation)
}
