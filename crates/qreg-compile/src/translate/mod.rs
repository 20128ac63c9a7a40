//! Quantum-safe translation of classical SSA arithmetic.
//!
//! The translator walks a [`ClassicalFunction`] and emits register-versioned
//! operations:
//!
//! - literals open fresh registers at version 0;
//! - arithmetic always overwrites its left operand's register, after
//!   duplicating the right operand if both sides name the same slot;
//! - operands whose register has been overwritten since they were computed
//!   are regenerated from their defining expression;
//! - both arms of a `cond_br` are emitted in sequence, every arithmetic
//!   operation inside an arm predicated on the conjunction of the enclosing
//!   conditions.

mod control;

use rustc_hash::FxHashMap;
use std::rc::Rc;
use tracing::{debug, info, instrument};

use qreg_ir::{
    ArithOp, BinaryOpcode, BitWidth, BlockId, ClassicalFunction, ClassicalOp, Expr, LogicalOp,
    Predicate, QuantumFunction, RegisterId, SsaValue, Value,
};

pub use control::{ControlStack, Predicated};

use crate::config::check_integer_width;
use crate::emit::{Emitter, census};
use crate::error::{CompileError, CompileResult};

/// Output of translating one function.
#[derive(Debug, Clone)]
pub struct Translation {
    /// The register-versioned function.
    pub function: QuantumFunction,
    /// Register version currently holding each classical value.
    pub bindings: FxHashMap<SsaValue, Value>,
}

impl Translation {
    /// Register version currently holding `value`.
    pub fn binding(&self, value: SsaValue) -> Option<Value> {
        self.bindings.get(&value).copied()
    }
}

/// Lowers classical SSA arithmetic into register-versioned IR.
///
/// # Example
///
/// ```
/// use qreg_compile::QuantumSafeTranslator;
/// use qreg_ir::{ArithOp, BitWidth, FunctionBuilder};
///
/// let mut b = FunctionBuilder::new("square");
/// let x = b.constant(3);
/// let y = b.binary(ArithOp::Mul, x, x);
/// b.ret(Some(y));
///
/// let translator = QuantumSafeTranslator::new(BitWidth::new(6).unwrap());
/// let out = translator.translate(&b.finish()).unwrap();
///
/// // init, dup (no-cloning), mul, return
/// assert_eq!(out.function.len(), 4);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct QuantumSafeTranslator {
    bit_width: BitWidth,
}

impl QuantumSafeTranslator {
    /// Create a translator for the given register width.
    pub fn new(bit_width: BitWidth) -> Self {
        Self { bit_width }
    }

    /// Configured register width.
    pub fn bit_width(&self) -> BitWidth {
        self.bit_width
    }

    /// Translate one function.
    #[instrument(skip(self, function), fields(function = %function.name))]
    pub fn translate(&self, function: &ClassicalFunction) -> CompileResult<Translation> {
        check_integer_width(self.bit_width)?;
        info!(
            "Translating function with {} blocks, {} ops at {}",
            function.blocks.len(),
            function.num_ops(),
            self.bit_width
        );

        let mut state = TranslationState {
            source: function,
            bit_width: self.bit_width,
            emitter: Emitter::new(RegisterId(0)),
            bindings: FxHashMap::default(),
            controls: ControlStack::new(),
            active: Vec::new(),
            returned: false,
        };
        state.translate_block(BlockId::ENTRY)?;

        let ops = state.emitter.into_ops();
        let (controlled, copies) = census(&ops);
        info!(
            "Translation emitted {} ops ({} predicated, {} duplicates)",
            ops.len(),
            controlled,
            copies
        );

        let bindings = state
            .bindings
            .into_iter()
            .map(|(ssa, binding)| (ssa, binding.value))
            .collect();
        Ok(Translation {
            function: QuantumFunction::from_ops(function.name.clone(), self.bit_width, ops),
            bindings,
        })
    }
}

/// A classical value's current register and defining expression.
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    expr: Rc<Expr>,
}

struct TranslationState<'f> {
    source: &'f ClassicalFunction,
    bit_width: BitWidth,
    emitter: Emitter,
    bindings: FxHashMap<SsaValue, Binding>,
    controls: ControlStack,
    active: Vec<BlockId>,
    returned: bool,
}

impl TranslationState<'_> {
    fn translate_block(&mut self, id: BlockId) -> CompileResult<()> {
        if self.active.contains(&id) {
            return Err(CompileError::unsupported(
                "cond_br",
                format!("block {id} re-entered while being translated (unbounded loop)"),
            ));
        }
        let source = self.source;
        let block = source.block(id)?;
        self.active.push(id);
        debug!(
            "Entering {} at control depth {}",
            id,
            self.controls.depth()
        );
        for op in &block.ops {
            if self.returned {
                break;
            }
            self.translate_op(op)?;
        }
        self.active.pop();
        Ok(())
    }

    fn translate_op(&mut self, op: &ClassicalOp) -> CompileResult<()> {
        match op {
            ClassicalOp::Constant { result, value } => {
                let value = self.bit_width.check(*value)?;
                let v = self.emitter.init(value, self.bit_width)?;
                self.bind(*result, v, Expr::constant(value, self.bit_width));
            }
            ClassicalOp::Binary {
                result,
                op,
                lhs,
                rhs,
            } => {
                let opcode = register_opcode(*op)?;
                let l = self.materialize_integer(*lhs, op.name())?;
                let mut r = self.materialize_integer(*rhs, op.name())?;
                if l.value.same_slot(&r.value) {
                    r.value = self.emitter.duplicate(r.value)?;
                }
                let control = self.controls.current().cloned();
                let v = self.emitter.binary(
                    opcode,
                    l.value,
                    r.value,
                    control.as_ref().map(|c| c.value),
                )?;
                let expr = Rc::new(Expr::Binary {
                    op: opcode,
                    lhs: l.expr,
                    rhs: r.expr,
                    control: control.map(|c| c.expr),
                });
                self.bind(*result, v, expr);
            }
            ClassicalOp::BinaryImm {
                result,
                op,
                lhs,
                imm,
            } => {
                let opcode = register_opcode(*op)?;
                if opcode == BinaryOpcode::Div && *imm == 0 {
                    return Err(CompileError::DivisionByZero {
                        op: opcode.imm_name().into(),
                    });
                }
                let imm = self.bit_width.check(*imm)?;
                let l = self.materialize_integer(*lhs, op.name())?;
                let control = self.controls.current().cloned();
                let v = self.emitter.binary_imm(
                    opcode,
                    l.value,
                    imm,
                    control.as_ref().map(|c| c.value),
                )?;
                let expr = Rc::new(Expr::BinaryImm {
                    op: opcode,
                    lhs: l.expr,
                    imm,
                    control: control.map(|c| c.expr),
                });
                self.bind(*result, v, expr);
            }
            ClassicalOp::Compare {
                result,
                predicate,
                lhs,
                rhs,
            } => {
                let l = self.materialize(*lhs)?;
                let mut r = self.materialize(*rhs)?;
                if l.value.width != r.value.width {
                    return Err(CompileError::unsupported(
                        "cmp",
                        format!(
                            "operands {lhs} and {rhs} have different widths ({} vs {})",
                            l.value.width, r.value.width
                        ),
                    ));
                }
                if l.value.same_slot(&r.value) {
                    r.value = self.emitter.duplicate(r.value)?;
                }
                let v = self.emitter.compare(*predicate, l.value, r.value)?;
                let expr = Rc::new(Expr::Compare {
                    predicate: *predicate,
                    lhs: l.expr,
                    rhs: r.expr,
                });
                self.bind(*result, v, expr);
            }
            ClassicalOp::Logical {
                result,
                op,
                lhs,
                rhs,
            } => {
                let l = self.condition(*lhs)?;
                let r = self.condition(*rhs)?;
                let p = match op {
                    LogicalOp::And => self.conjunction(l, r)?,
                    // a || b == !(!a && !b): one predicate, so an arm guarded by
                    // it is emitted once.
                    LogicalOp::Or => {
                        let nl = self.negation(l)?;
                        let nr = self.negation(r)?;
                        let both = self.conjunction(nl, nr)?;
                        self.negation(both)?
                    }
                };
                self.bind(*result, p.value, p.expr);
            }
            ClassicalOp::LogicalNot { result, operand } => {
                let c = self.condition(*operand)?;
                let p = self.negation(c)?;
                self.bind(*result, p.value, p.expr);
            }
            ClassicalOp::Select {
                result,
                cond,
                if_true,
                if_false,
            } => self.translate_select(*result, *cond, *if_true, *if_false)?,
            ClassicalOp::CondBranch {
                cond,
                then_block,
                else_block,
            } => self.translate_branch(*cond, *then_block, *else_block)?,
            ClassicalOp::Return { value } => {
                if !self.controls.is_empty() {
                    return Err(CompileError::unsupported(
                        "return",
                        "return inside a predicated branch arm",
                    ));
                }
                let v = match value {
                    Some(ssa) => Some(self.materialize(*ssa)?.value),
                    None => None,
                };
                self.emitter.ret(v);
                self.returned = true;
            }
        }
        Ok(())
    }

    fn translate_branch(
        &mut self,
        cond: SsaValue,
        then_block: BlockId,
        else_block: BlockId,
    ) -> CompileResult<()> {
        let c = self.condition(cond)?;
        let then_empty = self.source.block(then_block)?.ops.is_empty();
        let else_empty = self.source.block(else_block)?.ops.is_empty();

        if !then_empty {
            self.translate_arm(c.clone(), then_block)?;
        }
        if !else_empty {
            let nc = self.negation(c)?;
            self.translate_arm(nc, else_block)?;
        }
        Ok(())
    }

    fn translate_arm(&mut self, condition: Predicated, block: BlockId) -> CompileResult<()> {
        let conjunction = match self.controls.current().cloned() {
            Some(outer) => self.conjunction(outer, condition)?,
            None => condition,
        };
        self.controls.push(conjunction);
        let outcome = self.translate_block(block);
        self.controls.pop();
        outcome
    }

    fn translate_select(
        &mut self,
        result: SsaValue,
        cond: SsaValue,
        if_true: SsaValue,
        if_false: SsaValue,
    ) -> CompileResult<()> {
        let mut c = self.condition(cond)?;
        let t = self.materialize(if_true)?;
        let f = self.materialize(if_false)?;
        if t.value.width != f.value.width {
            return Err(CompileError::unsupported(
                "select",
                format!(
                    "arms {if_true} and {if_false} have different widths ({} vs {})",
                    t.value.width, f.value.width
                ),
            ));
        }

        let expr = Rc::new(Expr::Select {
            cond: c.expr.clone(),
            if_true: t.expr.clone(),
            if_false: f.expr.clone(),
        });
        let v = if t.value.same_slot(&f.value) {
            self.emitter.duplicate(t.value)?
        } else {
            if c.value.same_slot(&t.value) || c.value.same_slot(&f.value) {
                c.value = self.emitter.duplicate(c.value)?;
            }
            self.emitter.select(c.value, t.value, f.value)?
        };
        self.bind(result, v, expr);
        Ok(())
    }

    // =========================================================================
    // Value resolution
    // =========================================================================

    fn bind(&mut self, ssa: SsaValue, value: Value, expr: Rc<Expr>) {
        self.bindings.insert(ssa, Binding { value, expr });
    }

    /// Current register of `ssa`, regenerated if it has been overwritten.
    fn materialize(&mut self, ssa: SsaValue) -> CompileResult<Predicated> {
        let binding = self
            .bindings
            .get(&ssa)
            .cloned()
            .ok_or(CompileError::UseOfUndefinedValue(ssa))?;
        if self.emitter.is_current(&binding.value) {
            return Ok(Predicated {
                value: binding.value,
                expr: binding.expr,
            });
        }

        debug!(
            "Recomputing {} (register {} overwritten)",
            ssa,
            binding.value.register()
        );
        let value = self.emitter.rematerialize(&binding.expr)?;
        self.bind(ssa, value, binding.expr.clone());
        Ok(Predicated {
            value,
            expr: binding.expr,
        })
    }

    fn materialize_integer(&mut self, ssa: SsaValue, op: &str) -> CompileResult<Predicated> {
        let p = self.materialize(ssa)?;
        if p.value.width != self.bit_width {
            return Err(CompileError::unsupported(
                op,
                format!(
                    "operand {ssa} is a {} value, arithmetic needs {}",
                    p.value.width, self.bit_width
                ),
            ));
        }
        Ok(p)
    }

    /// `ssa` as a boolean, comparing integers against zero.
    fn condition(&mut self, ssa: SsaValue) -> CompileResult<Predicated> {
        let p = self.materialize(ssa)?;
        if p.value.width.is_bool() {
            return Ok(p);
        }
        let zero = self.emitter.init(0, p.value.width)?;
        let value = self.emitter.compare(Predicate::Ne, p.value, zero)?;
        Ok(Predicated {
            value,
            expr: Rc::new(Expr::Compare {
                predicate: Predicate::Ne,
                lhs: p.expr,
                rhs: Expr::constant(0, p.value.width),
            }),
        })
    }

    fn conjunction(&mut self, lhs: Predicated, mut rhs: Predicated) -> CompileResult<Predicated> {
        if lhs.value.same_slot(&rhs.value) {
            rhs.value = self.emitter.duplicate(rhs.value)?;
        }
        let value = self.emitter.and(lhs.value, rhs.value)?;
        Ok(Predicated {
            value,
            expr: Rc::new(Expr::And(lhs.expr, rhs.expr)),
        })
    }

    fn negation(&mut self, operand: Predicated) -> CompileResult<Predicated> {
        let value = self.emitter.not(operand.value)?;
        Ok(Predicated {
            value,
            expr: Rc::new(Expr::Not(operand.expr)),
        })
    }
}

/// Register opcode for a classical opcode, if one exists.
fn register_opcode(op: ArithOp) -> CompileResult<BinaryOpcode> {
    match op {
        ArithOp::Add => Ok(BinaryOpcode::Add),
        ArithOp::Sub => Ok(BinaryOpcode::Sub),
        ArithOp::Mul => Ok(BinaryOpcode::Mul),
        ArithOp::Div => Ok(BinaryOpcode::Div),
        ArithOp::Rem | ArithOp::Shl | ArithOp::Shr | ArithOp::BitAnd | ArithOp::BitOr
        | ArithOp::BitXor => Err(CompileError::unsupported(
            op.name(),
            "no reversible register realisation",
        )),
    }
}
