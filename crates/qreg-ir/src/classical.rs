//! Classical arithmetic IR consumed by the translator.
//!
//! A function is a list of basic blocks, block 0 being the entry. Each
//! operation references earlier results through [`SsaValue`] handles.
//! `CondBranch` is structured: its two successor blocks are bounded arms
//! that rejoin the current block right after the branch.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::operation::Predicate;

/// Handle to a classical SSA value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SsaValue(pub u32);

impl fmt::Display for SsaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Handle to a basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl BlockId {
    /// The entry block.
    pub const ENTRY: BlockId = BlockId(0);
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Classical integer opcodes.
///
/// Only `Add`, `Sub`, `Mul` and `Div` have a register realisation; the rest
/// are rejected by the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Signed division.
    Div,
    /// Signed remainder.
    Rem,
    /// Left shift.
    Shl,
    /// Arithmetic right shift.
    Shr,
    /// Bitwise and.
    BitAnd,
    /// Bitwise or.
    BitOr,
    /// Bitwise xor.
    BitXor,
}

impl ArithOp {
    /// Mnemonic.
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
            ArithOp::Rem => "rem",
            ArithOp::Shl => "shl",
            ArithOp::Shr => "shr",
            ArithOp::BitAnd => "andb",
            ArithOp::BitOr => "orb",
            ArithOp::BitXor => "xorb",
        }
    }
}

/// Short-circuit-free boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
}

/// A classical operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassicalOp {
    /// `result = value`.
    Constant {
        /// Defined value.
        result: SsaValue,
        /// Literal.
        value: i64,
    },
    /// `result = lhs op rhs`.
    Binary {
        /// Defined value.
        result: SsaValue,
        /// Opcode.
        op: ArithOp,
        /// Left operand.
        lhs: SsaValue,
        /// Right operand.
        rhs: SsaValue,
    },
    /// `result = lhs op imm`.
    BinaryImm {
        /// Defined value.
        result: SsaValue,
        /// Opcode.
        op: ArithOp,
        /// Left operand.
        lhs: SsaValue,
        /// Immediate.
        imm: i64,
    },
    /// `result = lhs predicate rhs`.
    Compare {
        /// Defined value.
        result: SsaValue,
        /// Predicate.
        predicate: Predicate,
        /// Left operand.
        lhs: SsaValue,
        /// Right operand.
        rhs: SsaValue,
    },
    /// `result = lhs && rhs` or `lhs || rhs`.
    Logical {
        /// Defined value.
        result: SsaValue,
        /// Connective.
        op: LogicalOp,
        /// Left operand.
        lhs: SsaValue,
        /// Right operand.
        rhs: SsaValue,
    },
    /// `result = !operand`.
    LogicalNot {
        /// Defined value.
        result: SsaValue,
        /// Operand.
        operand: SsaValue,
    },
    /// `result = cond ? if_true : if_false`.
    Select {
        /// Defined value.
        result: SsaValue,
        /// Selector.
        cond: SsaValue,
        /// Value when `cond` holds.
        if_true: SsaValue,
        /// Value otherwise.
        if_false: SsaValue,
    },
    /// Two-way bounded branch.
    CondBranch {
        /// Condition.
        cond: SsaValue,
        /// Arm taken when `cond` holds.
        then_block: BlockId,
        /// Arm taken otherwise.
        else_block: BlockId,
    },
    /// Function exit.
    Return {
        /// Returned value.
        value: Option<SsaValue>,
    },
}

impl ClassicalOp {
    /// The value this operation defines.
    pub fn result(&self) -> Option<SsaValue> {
        match self {
            ClassicalOp::Constant { result, .. }
            | ClassicalOp::Binary { result, .. }
            | ClassicalOp::BinaryImm { result, .. }
            | ClassicalOp::Compare { result, .. }
            | ClassicalOp::Logical { result, .. }
            | ClassicalOp::LogicalNot { result, .. }
            | ClassicalOp::Select { result, .. } => Some(*result),
            ClassicalOp::CondBranch { .. } | ClassicalOp::Return { .. } => None,
        }
    }

    /// Values this operation reads.
    pub fn operands(&self) -> Vec<SsaValue> {
        match self {
            ClassicalOp::Constant { .. } | ClassicalOp::Return { value: None } => vec![],
            ClassicalOp::Binary { lhs, rhs, .. }
            | ClassicalOp::Compare { lhs, rhs, .. }
            | ClassicalOp::Logical { lhs, rhs, .. } => vec![*lhs, *rhs],
            ClassicalOp::BinaryImm { lhs, .. } => vec![*lhs],
            ClassicalOp::LogicalNot { operand, .. } => vec![*operand],
            ClassicalOp::Select {
                cond,
                if_true,
                if_false,
                ..
            } => vec![*cond, *if_true, *if_false],
            ClassicalOp::CondBranch { cond, .. } => vec![*cond],
            ClassicalOp::Return { value: Some(v) } => vec![*v],
        }
    }

    /// Mnemonic used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            ClassicalOp::Constant { .. } => "const",
            ClassicalOp::Binary { op, .. } | ClassicalOp::BinaryImm { op, .. } => op.name(),
            ClassicalOp::Compare { .. } => "cmp",
            ClassicalOp::Logical {
                op: LogicalOp::And, ..
            } => "and",
            ClassicalOp::Logical {
                op: LogicalOp::Or, ..
            } => "or",
            ClassicalOp::LogicalNot { .. } => "not",
            ClassicalOp::Select { .. } => "select",
            ClassicalOp::CondBranch { .. } => "cond_br",
            ClassicalOp::Return { .. } => "return",
        }
    }
}

/// A basic block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassicalBlock {
    /// Operations in order.
    pub ops: Vec<ClassicalOp>,
}

/// A classical function: blocks indexed by [`BlockId`], entry first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalFunction {
    /// Function name.
    pub name: String,
    /// Basic blocks.
    pub blocks: Vec<ClassicalBlock>,
}

impl ClassicalFunction {
    /// Look up a block.
    pub fn block(&self, id: BlockId) -> IrResult<&ClassicalBlock> {
        self.blocks
            .get(id.0 as usize)
            .ok_or(IrError::UnknownBlock(id))
    }

    /// The entry block.
    pub fn entry(&self) -> IrResult<&ClassicalBlock> {
        self.block(BlockId::ENTRY)
    }

    /// Total number of operations across blocks.
    pub fn num_ops(&self) -> usize {
        self.blocks.iter().map(|b| b.ops.len()).sum()
    }
}

/// Builder for classical functions.
///
/// # Example
///
/// ```
/// use qreg_ir::{ArithOp, FunctionBuilder};
///
/// let mut b = FunctionBuilder::new("add");
/// let x = b.constant(3);
/// let y = b.constant(-2);
/// let z = b.binary(ArithOp::Add, x, y);
/// b.ret(Some(z));
/// let func = b.finish();
///
/// assert_eq!(func.blocks.len(), 1);
/// assert_eq!(func.num_ops(), 4);
/// ```
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    blocks: Vec<ClassicalBlock>,
    current: BlockId,
    next_value: u32,
}

impl FunctionBuilder {
    /// Start a function with an empty entry block.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: vec![ClassicalBlock::default()],
            current: BlockId::ENTRY,
            next_value: 0,
        }
    }

    /// Add an empty block without switching to it.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(ClassicalBlock::default());
        id
    }

    /// Direct subsequent operations into `block`.
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    /// The block operations are currently appended to.
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    /// Run `f` with operations directed into `block`, then switch back.
    pub fn in_block<R>(&mut self, block: BlockId, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.current;
        self.current = block;
        let out = f(self);
        self.current = saved;
        out
    }

    fn fresh(&mut self) -> SsaValue {
        let v = SsaValue(self.next_value);
        self.next_value += 1;
        v
    }

    /// Append a raw operation to the current block.
    pub fn push(&mut self, op: ClassicalOp) {
        if let Some(result) = op.result() {
            self.next_value = self.next_value.max(result.0 + 1);
        }
        let index = self.current.0 as usize;
        if let Some(block) = self.blocks.get_mut(index) {
            block.ops.push(op);
        }
    }

    /// `constant value`.
    pub fn constant(&mut self, value: i64) -> SsaValue {
        let result = self.fresh();
        self.push(ClassicalOp::Constant { result, value });
        result
    }

    /// `lhs op rhs`.
    pub fn binary(&mut self, op: ArithOp, lhs: SsaValue, rhs: SsaValue) -> SsaValue {
        let result = self.fresh();
        self.push(ClassicalOp::Binary {
            result,
            op,
            lhs,
            rhs,
        });
        result
    }

    /// `lhs op imm`.
    pub fn binary_imm(&mut self, op: ArithOp, lhs: SsaValue, imm: i64) -> SsaValue {
        let result = self.fresh();
        self.push(ClassicalOp::BinaryImm {
            result,
            op,
            lhs,
            imm,
        });
        result
    }

    /// `lhs predicate rhs`.
    pub fn compare(&mut self, predicate: Predicate, lhs: SsaValue, rhs: SsaValue) -> SsaValue {
        let result = self.fresh();
        self.push(ClassicalOp::Compare {
            result,
            predicate,
            lhs,
            rhs,
        });
        result
    }

    /// `lhs && rhs` / `lhs || rhs`.
    pub fn logical(&mut self, op: LogicalOp, lhs: SsaValue, rhs: SsaValue) -> SsaValue {
        let result = self.fresh();
        self.push(ClassicalOp::Logical {
            result,
            op,
            lhs,
            rhs,
        });
        result
    }

    /// `!operand`.
    pub fn not(&mut self, operand: SsaValue) -> SsaValue {
        let result = self.fresh();
        self.push(ClassicalOp::LogicalNot { result, operand });
        result
    }

    /// `cond ? if_true : if_false`.
    pub fn select(&mut self, cond: SsaValue, if_true: SsaValue, if_false: SsaValue) -> SsaValue {
        let result = self.fresh();
        self.push(ClassicalOp::Select {
            result,
            cond,
            if_true,
            if_false,
        });
        result
    }

    /// Branch into two fresh arm blocks; returns `(then_block, else_block)`.
    ///
    /// Fill the arms with [`in_block`](Self::in_block); operations appended
    /// to the current block afterwards run once both arms are done.
    pub fn cond_br(&mut self, cond: SsaValue) -> (BlockId, BlockId) {
        let then_block = self.new_block();
        let else_block = self.new_block();
        self.push(ClassicalOp::CondBranch {
            cond,
            then_block,
            else_block,
        });
        (then_block, else_block)
    }

    /// `return value`.
    pub fn ret(&mut self, value: Option<SsaValue>) {
        self.push(ClassicalOp::Return { value });
    }

    /// Finish building.
    pub fn finish(self) -> ClassicalFunction {
        ClassicalFunction {
            name: self.name,
            blocks: self.blocks,
        }
    }
}
