//! Register allocation and instruction emission.
//!
//! [`Emitter`] owns the register-id counter and the latest version of every
//! register for one function compilation. The translator and the enforcement
//! pass both emit through it, and both regenerate overwritten values with
//! [`Emitter::rematerialize`].

use rustc_hash::FxHashMap;
use std::rc::Rc;
use tracing::trace;

use qreg_ir::{
    BinaryOpcode, BitWidth, Expr, OpKind, Operation, Predicate, RegisterId, Slot, Value,
};

use crate::error::CompileResult;

/// Instruction sink with per-function register allocation.
#[derive(Debug)]
pub struct Emitter {
    ops: Vec<Operation>,
    next_register: u32,
    latest: FxHashMap<RegisterId, u32>,
    reads: FxHashMap<Slot, u32>,
}

impl Emitter {
    /// Create an emitter whose fresh registers start at `first_register`.
    pub fn new(first_register: RegisterId) -> Self {
        Self {
            ops: Vec::new(),
            next_register: first_register.0,
            latest: FxHashMap::default(),
            reads: FxHashMap::default(),
        }
    }

    /// Number of instructions emitted so far.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consume the emitter, returning the instruction list.
    pub fn into_ops(self) -> Vec<Operation> {
        self.ops
    }

    /// A value at version 0 of a register never used before.
    pub fn fresh(&mut self, width: BitWidth) -> Value {
        let register = RegisterId(self.next_register);
        self.next_register += 1;
        Value::new(Slot::new(register, 0), width)
    }

    /// Whether `value` is still the latest version of its register.
    pub fn is_current(&self, value: &Value) -> bool {
        self.latest.get(&value.register()) == Some(&value.version())
    }

    /// Whether some emitted instruction produced `slot`.
    pub fn has_produced(&self, slot: Slot) -> bool {
        self.latest
            .get(&slot.register)
            .is_some_and(|&latest| slot.version <= latest)
    }

    /// Tag a reading of `value` with its path number.
    pub fn read(&mut self, value: Value) -> Value {
        let count = self.reads.entry(value.slot).or_insert(0);
        let tagged = value.with_path(*count);
        *count += 1;
        tagged
    }

    /// Append an already-built instruction.
    pub fn push(&mut self, op: Operation) {
        if let Some(result) = op.result() {
            let latest = self.latest.entry(result.register()).or_insert(0);
            *latest = (*latest).max(result.version());
            self.next_register = self.next_register.max(result.register().0 + 1);
        }
        trace!("emit {}", op);
        self.ops.push(op);
    }

    // =========================================================================
    // Operation helpers
    // =========================================================================

    /// `init value` into a fresh register.
    pub fn init(&mut self, value: i64, width: BitWidth) -> CompileResult<Value> {
        let result = self.fresh(width);
        self.push(Operation::init(result, value)?);
        Ok(result)
    }

    /// Copy `source` into a fresh register.
    pub fn duplicate(&mut self, source: Value) -> CompileResult<Value> {
        let result = self.fresh(source.width);
        let source = self.read(source);
        self.push(Operation::duplicate(result, source)?);
        Ok(result)
    }

    /// `lhs op= rhs [if control]`.
    pub fn binary(
        &mut self,
        op: BinaryOpcode,
        lhs: Value,
        rhs: Value,
        control: Option<Value>,
    ) -> CompileResult<Value> {
        let result = lhs.next_version();
        let lhs = self.read(lhs);
        let rhs = self.read(rhs);
        let control = control.map(|c| self.read(c));
        self.push(Operation::binary(op, result, lhs, rhs, control)?);
        Ok(result)
    }

    /// `lhs op= imm [if control]`.
    pub fn binary_imm(
        &mut self,
        op: BinaryOpcode,
        lhs: Value,
        imm: i64,
        control: Option<Value>,
    ) -> CompileResult<Value> {
        let result = lhs.next_version();
        let lhs = self.read(lhs);
        let control = control.map(|c| self.read(c));
        self.push(Operation::binary_imm(op, result, lhs, imm, control)?);
        Ok(result)
    }

    /// Boolean comparison into a fresh register.
    pub fn compare(
        &mut self,
        predicate: Predicate,
        lhs: Value,
        rhs: Value,
    ) -> CompileResult<Value> {
        let result = self.fresh(BitWidth::BOOL);
        let lhs = self.read(lhs);
        let rhs = self.read(rhs);
        self.push(Operation::compare(predicate, result, lhs, rhs)?);
        Ok(result)
    }

    /// Conjunction into a fresh register.
    pub fn and(&mut self, lhs: Value, rhs: Value) -> CompileResult<Value> {
        let result = self.fresh(BitWidth::BOOL);
        let lhs = self.read(lhs);
        let rhs = self.read(rhs);
        self.push(Operation::and(result, lhs, rhs)?);
        Ok(result)
    }

    /// Negation into a fresh register.
    pub fn not(&mut self, operand: Value) -> CompileResult<Value> {
        let result = self.fresh(BitWidth::BOOL);
        let operand = self.read(operand);
        self.push(Operation::not(result, operand)?);
        Ok(result)
    }

    /// `return value`.
    pub fn ret(&mut self, value: Option<Value>) {
        let value = value.map(|v| self.read(v));
        self.push(Operation::ret(value));
    }

    /// `cond ? if_true : if_false` in a fresh register.
    ///
    /// Lowered as `d = dup if_false; d -= if_false if cond; d += if_true if cond`.
    /// The caller guarantees `cond` shares no slot with either arm.
    pub fn select(&mut self, cond: Value, if_true: Value, if_false: Value) -> CompileResult<Value> {
        let merged = self.duplicate(if_false)?;
        let merged = self.binary(BinaryOpcode::Sub, merged, if_false, Some(cond))?;
        self.binary(BinaryOpcode::Add, merged, if_true, Some(cond))
    }

    // =========================================================================
    // Recomputation
    // =========================================================================

    /// Regenerate the value of `expr` into registers that did not exist before.
    ///
    /// The emitted sequence is unpredicated: controls recorded inside the
    /// expression are regenerated along with it, so the result equals the
    /// value the expression described when it was recorded. A subexpression
    /// shared by several parents is rebuilt once and copied for the others.
    pub fn rematerialize(&mut self, expr: &Expr) -> CompileResult<Value> {
        let mut rebuilt = FxHashMap::default();
        self.rebuild(expr, &mut rebuilt)
    }

    fn rebuild_shared(
        &mut self,
        expr: &Rc<Expr>,
        rebuilt: &mut FxHashMap<*const Expr, Value>,
    ) -> CompileResult<Value> {
        let key = Rc::as_ptr(expr);
        if let Some(&value) = rebuilt.get(&key) {
            // A parent may have consumed the earlier copy in place.
            if self.is_current(&value) {
                return self.duplicate(value);
            }
        }
        let value = self.rebuild(expr, rebuilt)?;
        rebuilt.insert(key, value);
        Ok(value)
    }

    fn rebuild(
        &mut self,
        expr: &Expr,
        rebuilt: &mut FxHashMap<*const Expr, Value>,
    ) -> CompileResult<Value> {
        match expr {
            Expr::Const { value, width } => self.init(*value, *width),
            Expr::Binary {
                op,
                lhs,
                rhs,
                control,
            } => {
                let l = self.rebuild_shared(lhs, rebuilt)?;
                let r = self.rebuild_shared(rhs, rebuilt)?;
                let c = match control {
                    Some(c) => Some(self.rebuild_shared(c, rebuilt)?),
                    None => None,
                };
                self.binary(*op, l, r, c)
            }
            Expr::BinaryImm {
                op,
                lhs,
                imm,
                control,
            } => {
                let l = self.rebuild_shared(lhs, rebuilt)?;
                let c = match control {
                    Some(c) => Some(self.rebuild_shared(c, rebuilt)?),
                    None => None,
                };
                self.binary_imm(*op, l, *imm, c)
            }
            Expr::Compare {
                predicate,
                lhs,
                rhs,
            } => {
                let l = self.rebuild_shared(lhs, rebuilt)?;
                let r = self.rebuild_shared(rhs, rebuilt)?;
                self.compare(*predicate, l, r)
            }
            Expr::And(lhs, rhs) => {
                let l = self.rebuild_shared(lhs, rebuilt)?;
                let r = self.rebuild_shared(rhs, rebuilt)?;
                self.and(l, r)
            }
            Expr::Not(operand) => {
                let v = self.rebuild_shared(operand, rebuilt)?;
                self.not(v)
            }
            Expr::Select {
                cond,
                if_true,
                if_false,
            } => {
                let c = self.rebuild_shared(cond, rebuilt)?;
                let t = self.rebuild_shared(if_true, rebuilt)?;
                let f = self.rebuild_shared(if_false, rebuilt)?;
                self.select(c, t, f)
            }
        }
    }
}

/// Count instructions of each kind, for logging.
pub(crate) fn census(ops: &[Operation]) -> (usize, usize) {
    let controlled = ops.iter().filter(|op| op.control().is_some()).count();
    let copies = ops
        .iter()
        .filter(|op| matches!(op.kind(), OpKind::Duplicate { .. }))
        .count();
    (controlled, copies)
}
