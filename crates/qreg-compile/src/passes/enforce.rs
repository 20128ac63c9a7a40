//! Constraint enforcement.
//!
//! Rewrites a register-versioned function so that every reversibility
//! constraint holds globally, whatever the producer of the input did
//! locally. One forward walk over the original instruction list:
//!
//! - an operand whose version is still readable at its use is kept;
//! - an operand whose register was overwritten before its use is
//!   regenerated from its defining expression into fresh registers;
//! - if two principal operands resolve to the same version, the right one
//!   is regenerated.
//!
//! Operations are rebuilt around the resolved operands. An arithmetic
//! operation whose left operand was regenerated writes the regenerated
//! register, and later readers of its result follow it there.
//!
//! On input that already satisfies every constraint the rewrite reproduces
//! the input exactly, so running the pass on its own output changes nothing.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use qreg_ir::{DependencyDag, IrError, OpKind, Operation, QuantumFunction, Slot, Value};

use super::timeline::RegisterTimeline;
use crate::emit::Emitter;
use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Summary of one enforcement run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnforcementReport {
    /// Operands regenerated because their register had been overwritten.
    pub recomputed: usize,
    /// Operands regenerated to break a self-duplication.
    pub deduplicated: usize,
    /// Fresh-register results moved off a version produced twice.
    pub renamed: usize,
    /// Result slots of the input that now live elsewhere.
    pub relocated: FxHashMap<Slot, Value>,
}

impl EnforcementReport {
    /// Whether the pass left the function unchanged.
    pub fn is_noop(&self) -> bool {
        self.recomputed == 0 && self.deduplicated == 0 && self.renamed == 0
    }
}

/// Transformation pass establishing the reversibility constraints.
pub struct ConstraintEnforcement;

impl Pass for ConstraintEnforcement {
    fn name(&self) -> &'static str {
        "constraint-enforcement"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(
        &self,
        function: &mut QuantumFunction,
        properties: &mut PropertySet,
    ) -> CompileResult<()> {
        let (ops, report) = enforce(function)?;
        if report.is_noop() {
            debug!("Constraint enforcement: no rewrites needed");
        } else {
            info!(
                "Constraint enforcement: {} recomputed, {} deduplicated, {} renamed ({} -> {} ops)",
                report.recomputed,
                report.deduplicated,
                report.renamed,
                function.len(),
                ops.len()
            );
        }
        function.replace_ops(ops);
        properties.insert(report);
        Ok(())
    }
}

/// Rewrite `function`'s instruction list so every constraint holds.
pub fn enforce(function: &QuantumFunction) -> CompileResult<(Vec<Operation>, EnforcementReport)> {
    let ops = function.ops();
    let dag = DependencyDag::build(ops);
    let timeline = RegisterTimeline::build(&dag);
    let mut emitter = Emitter::new(function.next_register_id());
    let mut report = EnforcementReport::default();
    let mut mapped: Vec<Option<Value>> = vec![None; ops.len()];
    let mut produced: FxHashSet<Slot> = FxHashSet::default();

    for (position, op) in ops.iter().enumerate() {
        let in_place = op.is_write_in_place();
        let mut resolved = Vec::new();

        for (index, (value, producer)) in op
            .operands()
            .iter()
            .zip(dag.operand_producers(position))
            .enumerate()
        {
            let producer = producer.ok_or(IrError::UndefinedSlot(value.slot))?;
            let readable = timeline
                .of_producer(producer)
                .is_some_and(|l| l.is_readable_at(position, in_place && index == 0));

            let operand = match mapped[producer] {
                Some(current) if readable => {
                    if current.same_slot(value) {
                        *value
                    } else {
                        current.with_path(value.path)
                    }
                }
                _ => {
                    debug!(
                        "op {}: {} overwritten before use, recomputing",
                        position, value.slot
                    );
                    report.recomputed += 1;
                    let expr = dag.defining_expr(producer)?;
                    emitter.rematerialize(&expr)?
                }
            };
            resolved.push(operand);
        }

        if op.principal_operands().len() == 2 && resolved[0].same_slot(&resolved[1]) {
            let producer = dag.operand_producers(position)[1]
                .ok_or(IrError::UndefinedSlot(resolved[1].slot))?;
            debug!(
                "op {}: {} read twice, regenerating right operand",
                position, resolved[1].slot
            );
            report.deduplicated += 1;
            let expr = dag.defining_expr(producer)?;
            resolved[1] = emitter.rematerialize(&expr)?;
        }

        let mut rebuilt = rebuild(op, &resolved)?;
        if let Some(result) = rebuilt.result() {
            if !op.is_write_in_place() && produced.contains(&result.slot) {
                report.renamed += 1;
                let fresh = emitter.fresh(result.width);
                rebuilt = with_result(&rebuilt, fresh)?;
            }
        }

        if let (Some(old), Some(new)) = (op.result(), rebuilt.result()) {
            if !old.same_slot(&new) {
                report.relocated.insert(old.slot, new);
            }
            produced.insert(new.slot);
        }
        mapped[position] = rebuilt.result();
        emitter.push(rebuilt);
    }

    Ok((emitter.into_ops(), report))
}

/// `op` with its operands replaced by `resolved` (in `operands()` order).
///
/// An arithmetic result follows its left operand; other results keep their
/// slot.
fn rebuild(op: &Operation, resolved: &[Value]) -> CompileResult<Operation> {
    let operand = |i: usize| {
        resolved.get(i).copied().ok_or_else(|| CompileError::StructuralViolation {
            stage: "constraint-enforcement".into(),
            detail: format!("{} is missing operand {i}", op.name()),
        })
    };
    let result = op.result();
    let fresh_result = || {
        result.ok_or_else(|| CompileError::StructuralViolation {
            stage: "constraint-enforcement".into(),
            detail: format!("{} has no result", op.name()),
        })
    };
    let in_place_result = |lhs: Value, original: &Value| match result {
        Some(r) if lhs.same_slot(original) => r,
        _ => lhs.next_version(),
    };

    let rebuilt = match op.kind() {
        OpKind::Init { .. } => op.clone(),
        OpKind::Duplicate { .. } => Operation::duplicate(fresh_result()?, operand(0)?)?,
        OpKind::Binary {
            op: opcode,
            lhs,
            control,
            ..
        } => {
            let l = operand(0)?;
            let c = match control {
                Some(_) => Some(operand(2)?),
                None => None,
            };
            Operation::binary(*opcode, in_place_result(l, lhs), l, operand(1)?, c)?
        }
        OpKind::BinaryImm {
            op: opcode,
            lhs,
            imm,
            control,
        } => {
            let l = operand(0)?;
            let c = match control {
                Some(_) => Some(operand(1)?),
                None => None,
            };
            Operation::binary_imm(*opcode, in_place_result(l, lhs), l, *imm, c)?
        }
        OpKind::Compare { predicate, .. } => {
            Operation::compare(*predicate, fresh_result()?, operand(0)?, operand(1)?)?
        }
        OpKind::And { .. } => Operation::and(fresh_result()?, operand(0)?, operand(1)?)?,
        OpKind::Not { .. } => Operation::not(fresh_result()?, operand(0)?)?,
        OpKind::Return { value } => Operation::ret(match value {
            Some(_) => Some(operand(0)?),
            None => None,
        }),
    };
    Ok(rebuilt)
}

/// Fresh-register operation `op` writing `result` instead.
fn with_result(op: &Operation, result: Value) -> CompileResult<Operation> {
    let operands = op.operands();
    let rebuilt = match op.kind() {
        OpKind::Init { value } => Operation::init(result, *value)?,
        OpKind::Duplicate { source } => Operation::duplicate(result, *source)?,
        OpKind::Compare { predicate, .. } => {
            Operation::compare(*predicate, result, operands[0], operands[1])?
        }
        OpKind::And { .. } => Operation::and(result, operands[0], operands[1])?,
        OpKind::Not { .. } => Operation::not(result, operands[0])?,
        OpKind::Binary { .. } | OpKind::BinaryImm { .. } | OpKind::Return { .. } => {
            return Err(CompileError::StructuralViolation {
                stage: "constraint-enforcement".into(),
                detail: format!("{} does not open a fresh register", op.name()),
            });
        }
    };
    Ok(rebuilt)
}
