//! End-to-end compilation through the pass manager.

mod common;

use qreg_compile::passes::{EnforcementReport, RegisterTimeline, VerificationReport, Violation};
use qreg_compile::{
    CompileConfig, CompileError, PassManagerBuilder, PropertySet, QuantumSafeTranslator, compile,
};
use qreg_ir::{
    ArithOp, BinaryOpcode, BitWidth, FunctionBuilder, LogicalOp, Operation, Predicate,
    QuantumFunction, RegisterId, Slot, SsaValue, Value,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("qreg_compile=debug")
        .with_test_writer()
        .try_init();
}

fn val(register: u32, version: u32, width: BitWidth) -> Value {
    Value::new(Slot::new(RegisterId(register), version), width)
}

#[test]
fn branch_arms_are_predicated() {
    init_tracing();
    let config = CompileConfig::with_bits(6).unwrap();

    for (a, b, expected) in [(5, 3, 2), (1, 4, 5)] {
        // if a < b { r = a + b } else { r = a - b }; return the chosen value.
        let mut f = FunctionBuilder::new("branch");
        let x = f.constant(a);
        let y = f.constant(b);
        let c = f.compare(Predicate::Lt, x, y);
        let (then_b, else_b) = f.cond_br(c);
        let sum = f.in_block(then_b, |f| f.binary(ArithOp::Add, x, y));
        let diff = f.in_block(else_b, |f| f.binary(ArithOp::Sub, x, y));
        let r = f.select(c, sum, diff);
        f.ret(Some(r));

        let out = compile(&f.finish(), &config).unwrap();
        assert_eq!(common::run_registers(&out.function), Some(expected));
    }
}

#[test]
fn nested_and_or_conditions() {
    init_tracing();
    let config = CompileConfig::with_bits(6).unwrap();

    for (a, expected) in [(-3, -3), (2, 12), (9, 19)] {
        // if a > 0 { if a < 5 || a == 9 { a += 10 } }; return a
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

        let out = compile(&f.finish(), &config).unwrap();
        // Without the guard the unconditional result would be a + 10.
        assert_eq!(common::run_registers(&out.function), Some(expected));
    }
}

#[test]
fn integer_condition_tests_nonzero() {
    let mut f = FunctionBuilder::new("truthy");
    let x = f.constant(0);
    let y = f.constant(7);
    let (then_b, _) = f.cond_br(x);
    let z = f.in_block(then_b, |f| f.binary_imm(ArithOp::Sub, y, 7));
    f.ret(Some(z));

    let out = compile(&f.finish(), &CompileConfig::with_bits(4).unwrap()).unwrap();
    assert_eq!(common::run_registers(&out.function), Some(7));
}

#[test]
fn bindings_follow_relocated_results() {
    let mut f = FunctionBuilder::new("reuse");
    let x = f.constant(3);
    let y = f.constant(2);
    let s = f.binary(ArithOp::Add, x, y);
    let t = f.binary(ArithOp::Mul, x, s);
    f.ret(Some(t));

    let out = compile(&f.finish(), &CompileConfig::with_bits(6).unwrap()).unwrap();
    let returned = out.function.returned_value().unwrap();
    assert!(out.binding(t).unwrap().same_slot(&returned));
    assert_eq!(common::run_registers(&out.function), Some(15));
    assert_eq!(out.binding(SsaValue(99)), None);
}

#[test]
fn enforcement_repairs_hand_written_ir() {
    init_tracing();
    let w = BitWidth::new(5).unwrap();
    // r1 is overwritten at 3 and its old version read again at 4; op 5
    // multiplies r0 by itself.
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
    let intended = common::run_slots(&func);
    // 7 * 7 wrapped to five bits
    assert_eq!(intended, Some(-15));

    let (pm, mut props) = PassManagerBuilder::new()
        .with_config(CompileConfig::new(w))
        .with_timeline()
        .build();
    pm.run(&mut func, &mut props).unwrap();

    let report = props.get::<EnforcementReport>().unwrap();
    assert!(report.recomputed >= 2);
    assert!(props.get::<VerificationReport>().unwrap().passed);
    assert!(props.get::<RegisterTimeline>().is_some());
    assert_eq!(common::run_registers(&func), intended);
}

#[test]
fn verification_without_enforcement_rejects_violations() {
    let w = BitWidth::new(4).unwrap();
    let ops = vec![
        Operation::init(val(0, 0, w), 1).unwrap(),
        Operation::binary(BinaryOpcode::Add, val(0, 1, w), val(0, 0, w), val(0, 0, w), None)
            .unwrap(),
        Operation::ret(Some(val(0, 1, w))),
    ];
    let mut func = QuantumFunction::from_ops("bad", w, ops);
    let (pm, mut props) = PassManagerBuilder::new()
        .with_config(CompileConfig::new(w).without_enforcement())
        .build();
    let err = pm.run(&mut func, &mut props).unwrap_err();
    assert!(matches!(err, CompileError::StructuralViolation { .. }));

    let report = qreg_compile::passes::check_constraints(&func);
    assert!(
        report
            .violations
            .iter()
            .any(|v| matches!(v, Violation::SelfDuplication { position: 1, .. }))
    );
}

#[test]
fn error_taxonomy() {
    let config = CompileConfig::with_bits(4).unwrap();

    let mut f = FunctionBuilder::new("shift");
    let x = f.constant(1);
    f.binary_imm(ArithOp::Shl, x, 1);
    assert!(matches!(
        compile(&f.finish(), &config),
        Err(CompileError::UnsupportedOperation { .. })
    ));

    let mut f = FunctionBuilder::new("big");
    f.constant(-9);
    assert!(matches!(
        compile(&f.finish(), &config),
        Err(CompileError::ValueOutOfRange { value: -9, .. })
    ));

    let mut f = FunctionBuilder::new("div0");
    let x = f.constant(1);
    f.binary_imm(ArithOp::Div, x, 0);
    assert!(matches!(
        compile(&f.finish(), &config),
        Err(CompileError::DivisionByZero { .. })
    ));

    let mut f = FunctionBuilder::new("undef");
    f.binary(ArithOp::Add, SsaValue(7), SsaValue(7));
    assert!(matches!(
        QuantumSafeTranslator::new(config.bit_width).translate(&f.finish()),
        Err(CompileError::UseOfUndefinedValue(SsaValue(7)))
    ));

    assert!(matches!(
        CompileConfig::from_json("{ not json"),
        Err(CompileError::ConfigParse(_))
    ));
}

#[test]
fn property_set_carries_width() {
    let props = PropertySet::from_config(&CompileConfig::with_bits(7).unwrap());
    assert_eq!(props.bit_width, Some(BitWidth::new(7).unwrap()));
}
