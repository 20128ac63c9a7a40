//! Compiled functions lowered to circuits and simulated.

use qreg_arith::{ArithError, CircuitLowering, MAX_SIMULATED_QUBITS, Simulator};
use qreg_compile::{CompileConfig, PassManagerBuilder, compile};
use qreg_ir::{
    ArithOp, BinaryOpcode, BitWidth, ClassicalFunction, FunctionBuilder, LogicalOp, Operation,
    Predicate, QuantumFunction, RegisterId, Slot, Value,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("qreg_arith=debug")
        .with_test_writer()
        .try_init();
}

fn simulate(function: &ClassicalFunction, bits: u32) -> Option<i64> {
    let config = CompileConfig::with_bits(bits).unwrap();
    let translation = compile(function, &config).unwrap();
    let lowered = CircuitLowering::lower(&translation.function).unwrap();
    assert!(lowered.circuit.num_qubits() <= MAX_SIMULATED_QUBITS);
    lowered.run(&Simulator::new()).unwrap()
}

fn val(register: u32, version: u32, width: BitWidth) -> Value {
    Value::new(Slot::new(RegisterId(register), version), width)
}

#[test]
fn branches_select_the_taken_arm() {
    init_tracing();
    for (a, b, expected) in [(5, 3, 2), (1, 4, 5), (-7, 2, -5)] {
        let mut f = FunctionBuilder::new("branch");
        let x = f.constant(a);
        let y = f.constant(b);
        let c = f.compare(Predicate::Lt, x, y);
        let (then_b, else_b) = f.cond_br(c);
        let sum = f.in_block(then_b, |f| f.binary(ArithOp::Add, x, y));
        let diff = f.in_block(else_b, |f| f.binary(ArithOp::Sub, x, y));
        let r = f.select(c, sum, diff);
        f.ret(Some(r));

        assert_eq!(simulate(&f.finish(), 5), Some(expected), "a={a} b={b}");
    }
}

#[test]
fn nested_conditions_guard_updates() {
    for (a, expected) in [(-3, -3), (2, 12), (9, -13)] {
        // if a > 0 { if a < 5 || a == 9 { a += 10 } }; 19 wraps at five bits
        let mut f = FunctionBuilder::new("nested");
        let x = f.constant(a);
        let zero = f.constant(0);
        let five = f.constant(5);
        let nine = f.constant(9);
        let positive = f.compare(Predicate::Gt, x, zero);
        let (outer, _) = f.cond_br(positive);
        let bumped = f.in_block(outer, |f| {
            let small = f.compare(Predicate::Lt, x, five);
            let is_nine = f.compare(Predicate::Eq, x, nine);
            let either = f.logical(LogicalOp::Or, small, is_nine);
            let (inner, _) = f.cond_br(either);
            f.in_block(inner, |f| f.binary_imm(ArithOp::Add, x, 10))
        });
        f.ret(Some(bumped));

        assert_eq!(simulate(&f.finish(), 5), Some(expected), "a={a}");
    }
}

#[test]
fn multiply_then_divide() {
    for (a, b, d, expected) in [(3, -4, 5, -2), (2, 6, 3, 4), (-5, -3, 4, 3)] {
        let mut f = FunctionBuilder::new("muldiv");
        let x = f.constant(a);
        let y = f.constant(b);
        let p = f.binary(ArithOp::Mul, x, y);
        let q = f.binary_imm(ArithOp::Div, p, d);
        f.ret(Some(q));

        assert_eq!(simulate(&f.finish(), 5), Some(expected));
    }
}

#[test]
fn operand_reuse_survives_in_place_updates() {
    // x is read again after x + y overwrote its register.
    let mut f = FunctionBuilder::new("reuse");
    let x = f.constant(3);
    let y = f.constant(2);
    let s = f.binary(ArithOp::Add, x, y);
    let t = f.binary(ArithOp::Mul, x, s);
    f.ret(Some(t));

    assert_eq!(simulate(&f.finish(), 6), Some(15));
}

#[test]
fn boolean_results() {
    let mut f = FunctionBuilder::new("cmp");
    let x = f.constant(-2);
    let y = f.constant(3);
    let lt = f.compare(Predicate::Lt, x, y);
    let ge = f.compare(Predicate::Ge, x, y);
    let both = f.logical(LogicalOp::And, lt, ge);
    let r = f.not(both);
    f.ret(Some(r));

    assert_eq!(simulate(&f.finish(), 4), Some(1));
}

#[test]
fn enforcement_makes_hand_written_ir_lowerable() {
    init_tracing();
    let w = BitWidth::new(5).unwrap();
    let ops = vec![
        Operation::init(val(0, 0, w), 3).unwrap(),
        Operation::init(val(1, 0, w), 4).unwrap(),
        Operation::binary(BinaryOpcode::Add, val(0, 1, w), val(0, 0, w), val(1, 0, w), None)
            .unwrap(),
        Operation::binary_imm(BinaryOpcode::Sub, val(1, 1, w), val(1, 0, w), 1, None).unwrap(),
        Operation::compare(Predicate::Lt, val(2, 0, BitWidth::BOOL), val(0, 1, w), val(1, 0, w))
            .unwrap(),
        Operation::binary(BinaryOpcode::Mul, val(0, 2, w), val(0, 1, w), val(0, 1, w), None)
            .unwrap(),
        Operation::ret(Some(val(0, 2, w))),
    ];
    let mut func = QuantumFunction::from_ops("manual", w, ops);

    // r1.v0 is read after r1 was overwritten.
    assert!(matches!(
        CircuitLowering::lower(&func),
        Err(ArithError::UseOfUndefinedValue(slot)) if slot == Slot::new(RegisterId(1), 0)
    ));

    let (pm, mut props) = PassManagerBuilder::new()
        .with_config(CompileConfig::new(w))
        .build();
    pm.run(&mut func, &mut props).unwrap();

    let lowered = CircuitLowering::lower(&func).unwrap();
    // 7 * 7 wrapped to five bits
    assert_eq!(lowered.run(&Simulator::new()).unwrap(), Some(-15));
}

#[test]
fn function_without_return_measures_nothing() {
    let w = BitWidth::new(3).unwrap();
    let func = QuantumFunction::from_ops("noret", w, vec![Operation::init(val(0, 0, w), 2).unwrap()]);
    let lowered = CircuitLowering::lower(&func).unwrap();
    assert!(lowered.returned.is_none());
    assert_eq!(lowered.circuit.num_clbits(), 0);
    assert_eq!(lowered.run(&Simulator::new()).unwrap(), None);
}

#[test]
fn narrowest_integers_decode_signed() {
    assert!(CompileConfig::with_bits(1).is_err());

    for (a, b, expected) in [(-1, 0, -1), (-2, -1, 1), (1, 0, 1)] {
        let mut f = FunctionBuilder::new("narrow");
        let x = f.constant(a);
        let y = f.constant(b);
        let s = f.binary(ArithOp::Add, x, y);
        f.ret(Some(s));

        assert_eq!(simulate(&f.finish(), 2), Some(expected), "{a} + {b}");
    }
}
