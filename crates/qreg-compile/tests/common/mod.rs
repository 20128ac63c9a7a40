//! Reference interpreters shared by the integration tests.

#![allow(dead_code)]

use rustc_hash::FxHashMap;

use qreg_ir::{OpKind, QuantumFunction, RegisterId, Slot, Value};

/// Run `function` on physical registers: every operand is read from the
/// register's current contents, as a reversible backend would.
///
/// Returns `None` when a division by zero is reached.
pub fn run_registers(function: &QuantumFunction) -> Option<i64> {
    let mut regs: FxHashMap<RegisterId, i64> = FxHashMap::default();
    let read = |regs: &FxHashMap<RegisterId, i64>, v: &Value| regs.get(&v.register()).copied();
    for op in function.ops() {
        match op.kind() {
            OpKind::Return { value } => {
                return value.map(|v| read(&regs, &v)).unwrap_or(Some(0));
            }
            kind => {
                let result = op.result()?;
                let value = step(kind, |v| read(&regs, v), result)?;
                regs.insert(result.register(), value);
            }
        }
    }
    None
}

/// Run `function` reading every operand by its versioned slot, the meaning
/// the IR assigns to a function regardless of register reuse.
pub fn run_slots(function: &QuantumFunction) -> Option<i64> {
    let mut slots: FxHashMap<Slot, i64> = FxHashMap::default();
    for op in function.ops() {
        match op.kind() {
            OpKind::Return { value } => {
                return value.map(|v| slots.get(&v.slot).copied()).unwrap_or(Some(0));
            }
            kind => {
                let result = op.result()?;
                let value = step(kind, |v| slots.get(&v.slot).copied(), result)?;
                slots.insert(result.slot, value);
            }
        }
    }
    None
}

fn step(kind: &OpKind, read: impl Fn(&Value) -> Option<i64>, result: Value) -> Option<i64> {
    let width = result.width;
    let truth = |b: bool| i64::from(b);
    Some(match kind {
        OpKind::Init { value } => *value,
        OpKind::Duplicate { source } => read(source)?,
        OpKind::Binary {
            op,
            lhs,
            rhs,
            control,
        } => {
            let l = read(lhs)?;
            match control {
                Some(c) if read(c)? == 0 => l,
                _ => op.evaluate(l, read(rhs)?, width)?,
            }
        }
        OpKind::BinaryImm {
            op,
            lhs,
            imm,
            control,
        } => {
            let l = read(lhs)?;
            match control {
                Some(c) if read(c)? == 0 => l,
                _ => op.evaluate(l, *imm, width)?,
            }
        }
        OpKind::Compare {
            predicate,
            lhs,
            rhs,
        } => truth(predicate.evaluate(read(lhs)?, read(rhs)?)),
        OpKind::And { lhs, rhs } => truth(read(lhs)? != 0 && read(rhs)? != 0),
        OpKind::Not { operand } => truth(read(operand)? == 0),
        OpKind::Return { .. } => return None,
    })
}
