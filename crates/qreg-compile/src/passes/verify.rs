//! Reversibility constraint verification.
//!
//! Checks that a register-versioned function respects every physical
//! constraint:
//!
//! 1. **Write-in-place**: arithmetic results live in the left operand's
//!    register at the next version; fresh-register results start at 0.
//! 2. **Single producer**: each register version is produced once.
//! 3. **No-cloning**: no operation reads one version as two principal
//!    operands.
//! 4. **Temporal validity**: every read happens after the version is
//!    produced and before its register is overwritten.

use rustc_hash::FxHashMap;
use std::fmt;
use tracing::{debug, warn};

use qreg_ir::{DependencyDag, QuantumFunction, Slot};

use super::timeline::RegisterTimeline;
use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// One broken constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// An operation fails its own structural check.
    Malformed {
        /// Operation position.
        position: usize,
        /// Check failure message.
        detail: String,
    },
    /// A version is produced more than once.
    DuplicateProducer {
        /// Second producer position.
        position: usize,
        /// First producer position.
        first: usize,
        /// The slot.
        slot: Slot,
    },
    /// Both principal operands name the same version.
    SelfDuplication {
        /// Operation position.
        position: usize,
        /// The shared slot.
        slot: Slot,
    },
    /// A read of a version no earlier operation produced.
    UndefinedRead {
        /// Operation position.
        position: usize,
        /// The slot.
        slot: Slot,
    },
    /// A read after the version's register was overwritten.
    StaleRead {
        /// Operation position.
        position: usize,
        /// The slot.
        slot: Slot,
        /// Position of the overwrite.
        overwritten_at: usize,
    },
}

impl Violation {
    /// Position of the offending operation.
    pub fn position(&self) -> usize {
        match self {
            Violation::Malformed { position, .. }
            | Violation::DuplicateProducer { position, .. }
            | Violation::SelfDuplication { position, .. }
            | Violation::UndefinedRead { position, .. }
            | Violation::StaleRead { position, .. } => *position,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Malformed { position, detail } => {
                write!(f, "op {position}: {detail}")
            }
            Violation::DuplicateProducer {
                position,
                first,
                slot,
            } => write!(f, "op {position}: {slot} already produced by op {first}"),
            Violation::SelfDuplication { position, slot } => {
                write!(f, "op {position}: reads {slot} as both operands")
            }
            Violation::UndefinedRead { position, slot } => {
                write!(f, "op {position}: reads {slot} before it is produced")
            }
            Violation::StaleRead {
                position,
                slot,
                overwritten_at,
            } => write!(
                f,
                "op {position}: reads {slot} after op {overwritten_at} overwrote it"
            ),
        }
    }
}

/// Result of checking a function.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    /// Whether no violation was found.
    pub passed: bool,
    /// Number of operations checked.
    pub ops_checked: usize,
    /// Every violation found, in program order.
    pub violations: Vec<Violation>,
}

/// Check every constraint on `function` and collect all violations.
pub fn check_constraints(function: &QuantumFunction) -> VerificationReport {
    let ops = function.ops();
    let dag = DependencyDag::build(ops);
    let timeline = RegisterTimeline::build(&dag);
    let mut violations = Vec::new();
    let mut producers: FxHashMap<Slot, usize> = FxHashMap::default();

    for (position, op) in ops.iter().enumerate() {
        if let Err(e) = op.validate() {
            violations.push(Violation::Malformed {
                position,
                detail: e.to_string(),
            });
        }

        let principal = op.principal_operands();
        if principal.len() == 2 && principal[0].same_slot(&principal[1]) {
            violations.push(Violation::SelfDuplication {
                position,
                slot: principal[0].slot,
            });
        }

        let in_place = op.is_write_in_place();
        for (index, (value, producer)) in op
            .operands()
            .iter()
            .zip(dag.operand_producers(position))
            .enumerate()
        {
            let Some(lifetime) = producer.and_then(|p| timeline.of_producer(p)) else {
                violations.push(Violation::UndefinedRead {
                    position,
                    slot: value.slot,
                });
                continue;
            };
            if !lifetime.is_readable_at(position, in_place && index == 0) {
                violations.push(Violation::StaleRead {
                    position,
                    slot: value.slot,
                    overwritten_at: lifetime.next_overwrite.unwrap_or(position),
                });
            }
        }

        if let Some(result) = op.result() {
            if let Some(&first) = producers.get(&result.slot) {
                violations.push(Violation::DuplicateProducer {
                    position,
                    first,
                    slot: result.slot,
                });
            } else {
                producers.insert(result.slot, position);
            }
        }
    }

    VerificationReport {
        passed: violations.is_empty(),
        ops_checked: ops.len(),
        violations,
    }
}

/// Analysis pass that fails compilation on any constraint violation.
///
/// Runs last so that a bug in the translator or in a rewrite pass aborts
/// compilation instead of yielding wrong arithmetic.
pub struct SafetyVerification;

impl Pass for SafetyVerification {
    fn name(&self) -> &'static str {
        "safety-verification"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(
        &self,
        function: &mut QuantumFunction,
        properties: &mut PropertySet,
    ) -> CompileResult<()> {
        let report = check_constraints(function);
        if let Some(first) = report.violations.first() {
            for v in &report.violations {
                warn!("Constraint violation: {}", v);
            }
            return Err(CompileError::StructuralViolation {
                stage: self.name().into(),
                detail: format!("{} violation(s), first: {first}", report.violations.len()),
            });
        }

        debug!(
            "Safety verification passed: {} operations checked",
            report.ops_checked
        );
        properties.insert(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qreg_ir::{BinaryOpcode, BitWidth, Operation, RegisterId, Value};

    fn w4() -> BitWidth {
        BitWidth::new(4).unwrap()
    }

    fn val(reg: u32, ver: u32) -> Value {
        Value::new(Slot::new(RegisterId(reg), ver), w4())
    }

    fn func(ops: Vec<Operation>) -> QuantumFunction {
        QuantumFunction::from_ops("t", w4(), ops)
    }

    #[test]
    fn test_clean_function_passes() {
        let f = func(vec![
            Operation::init(val(0, 0), 1).unwrap(),
            Operation::init(val(1, 0), 2).unwrap(),
            Operation::binary(BinaryOpcode::Add, val(0, 1), val(0, 0), val(1, 0), None).unwrap(),
            Operation::ret(Some(val(0, 1))),
        ]);
        let report = check_constraints(&f);
        assert!(report.passed, "{:?}", report.violations);
        assert_eq!(report.ops_checked, 4);
    }

    #[test]
    fn test_self_duplication() {
        let f = func(vec![
            Operation::init(val(0, 0), 1).unwrap(),
            Operation::binary(BinaryOpcode::Add, val(0, 1), val(0, 0), val(0, 0), None).unwrap(),
        ]);
        let report = check_constraints(&f);
        assert!(
            report
                .violations
                .iter()
                .any(|v| matches!(v, Violation::SelfDuplication { position: 1, .. }))
        );
    }

    #[test]
    fn test_stale_read() {
        let f = func(vec![
            Operation::init(val(0, 0), 1).unwrap(),
            Operation::init(val(1, 0), 2).unwrap(),
            Operation::binary(BinaryOpcode::Add, val(0, 1), val(0, 0), val(1, 0), None).unwrap(),
            Operation::binary(BinaryOpcode::Sub, val(1, 1), val(1, 0), val(0, 0), None).unwrap(),
        ]);
        let report = check_constraints(&f);
        assert_eq!(
            report.violations,
            vec![Violation::StaleRead {
                position: 3,
                slot: val(0, 0).slot,
                overwritten_at: 2,
            }]
        );
    }

    #[test]
    fn test_duplicate_producer_and_undefined_read() {
        let f = func(vec![
            Operation::init(val(0, 0), 1).unwrap(),
            Operation::init(val(0, 0), 2).unwrap(),
            Operation::ret(Some(val(5, 0))),
        ]);
        let report = check_constraints(&f);
        assert!(!report.passed);
        assert!(report.violations.iter().any(|v| matches!(
            v,
            Violation::DuplicateProducer {
                position: 1,
                first: 0,
                ..
            }
        )));
        assert!(
            report
                .violations
                .iter()
                .any(|v| matches!(v, Violation::UndefinedRead { position: 2, .. }))
        );
    }

    #[test]
    fn test_pass_fails_on_violation() {
        let mut f = func(vec![
            Operation::init(val(0, 0), 1).unwrap(),
            Operation::binary(BinaryOpcode::Add, val(0, 1), val(0, 0), val(0, 0), None).unwrap(),
        ]);
        let mut props = PropertySet::new();
        let err = SafetyVerification.run(&mut f, &mut props).unwrap_err();
        assert!(matches!(err, CompileError::StructuralViolation { .. }));
        assert!(props.get::<VerificationReport>().is_none());
    }
}
