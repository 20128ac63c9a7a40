//! Benchmarks for circuit construction, lowering and simulation
//!
//! Run with: cargo bench -p qreg-arith

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qreg_arith::{Circuit, CircuitLowering, Simulator, arith};
use qreg_compile::{CompileConfig, compile};
use qreg_ir::{ArithOp, FunctionBuilder, Predicate};

/// Benchmark building arithmetic circuits
fn bench_circuit_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    for width in &[4usize, 8, 16, 32] {
        group.bench_with_input(BenchmarkId::new("add", width), width, |b, &n| {
            b.iter(|| {
                let mut circuit = Circuit::new("add");
                let x = circuit.allocate_register("x", n);
                let y = circuit.allocate_register("y", n);
                arith::add(&mut circuit, black_box(&x), black_box(&y), &[]).unwrap();
                circuit
            });
        });

        group.bench_with_input(BenchmarkId::new("multiply", width), width, |b, &n| {
            b.iter(|| {
                let mut circuit = Circuit::new("mul");
                let x = circuit.allocate_register("x", n);
                let y = circuit.allocate_register("y", n);
                arith::multiply(&mut circuit, black_box(&x), black_box(&y), &[]).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark simulating arithmetic on basis states
fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    let simulator = Simulator::new();

    for width in &[4usize, 8, 12] {
        let mut circuit = Circuit::new("mul");
        let x = circuit.allocate_register("x", *width);
        let y = circuit.allocate_register("y", *width);
        arith::add_imm(&mut circuit, &x, 3, &[]).unwrap();
        arith::add_imm(&mut circuit, &y, 5, &[]).unwrap();
        let product = arith::multiply(&mut circuit, &x, &y, &[]).unwrap();
        circuit.measure(&product).unwrap();

        group.bench_with_input(BenchmarkId::new("multiply", width), &circuit, |b, circuit| {
            b.iter(|| simulator.run(black_box(circuit)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the full compile, lower and simulate path
fn bench_end_to_end(c: &mut Criterion) {
    let mut f = FunctionBuilder::new("branch");
    let x = f.constant(5);
    let y = f.constant(3);
    let cond = f.compare(Predicate::Lt, x, y);
    let (then_b, else_b) = f.cond_br(cond);
    let sum = f.in_block(then_b, |f| f.binary(ArithOp::Add, x, y));
    let diff = f.in_block(else_b, |f| f.binary(ArithOp::Sub, x, y));
    let r = f.select(cond, sum, diff);
    f.ret(Some(r));
    let function = f.finish();
    let config = CompileConfig::with_bits(6).unwrap();

    c.bench_function("compile_and_lower", |b| {
        b.iter(|| {
            let translation = compile(black_box(&function), &config).unwrap();
            CircuitLowering::lower(&translation.function).unwrap()
        });
    });

    let translation = compile(&function, &config).unwrap();
    let lowered = CircuitLowering::lower(&translation.function).unwrap();
    c.bench_function("simulate_branch", |b| {
        b.iter(|| lowered.run(&Simulator::new()).unwrap());
    });
}

criterion_group!(
    benches,
    bench_circuit_construction,
    bench_simulation,
    bench_end_to_end
);
criterion_main!(benches);
