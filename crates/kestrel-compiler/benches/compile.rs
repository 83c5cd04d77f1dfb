//! Compiler and serializer throughput.
//!
//! Run with:
//!   cargo bench --bench compile

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kestrel_compiler::ast::{BinaryOperator, Expression, Program, Statement};
use kestrel_compiler::{Bytecode, compile};

/// `n` small functions, each calling the previous one, plus a loop driving
/// the last of them.
fn chained_functions(n: usize) -> Program {
    let mut body = Vec::with_capacity(n + 2);
    body.push(Statement::define(
        "f0",
        Expression::function(&["x"], vec![Statement::return_value(Expression::ident("x"))]),
    ));
    for i in 1..n {
        body.push(Statement::define(
            format!("f{}", i),
            Expression::function(
                &["x"],
                vec![Statement::return_value(Expression::call(
                    Expression::ident(format!("f{}", i - 1)),
                    vec![Expression::binary(
                        BinaryOperator::Add,
                        Expression::ident("x"),
                        Expression::int(i as i64),
                    )],
                ))],
            ),
        ));
    }
    body.push(Statement::define("acc", Expression::array(vec![])));
    body.push(Statement::for_loop(
        Some(Statement::define("i", Expression::int(0))),
        Some(Expression::binary(
            BinaryOperator::LessThan,
            Expression::ident("i"),
            Expression::int(100),
        )),
        Some(Statement::increment(Expression::ident("i"))),
        vec![Statement::assign(
            Expression::ident("acc"),
            Expression::call(
                Expression::ident("append"),
                vec![
                    Expression::ident("acc"),
                    Expression::call(
                        Expression::ident(format!("f{}", n - 1)),
                        vec![Expression::ident("i")],
                    ),
                ],
            ),
        )],
    ));
    Program::new(body)
}

fn bench_compile(c: &mut Criterion) {
    let program = chained_functions(200);
    c.bench_function("compile_200_functions", |b| {
        b.iter(|| compile(black_box(&program)))
    });
}

fn bench_encode(c: &mut Criterion) {
    let bytecode = compile(&chained_functions(200)).expect("benchmark program compiles");
    c.bench_function("encode_200_functions", |b| b.iter(|| black_box(&bytecode).encode()));
}

fn bench_decode(c: &mut Criterion) {
    let bytes = compile(&chained_functions(200))
        .and_then(|bytecode| Ok(bytecode.encode()?))
        .expect("benchmark program encodes");
    c.bench_function("decode_200_functions", |b| {
        b.iter(|| Bytecode::decode(black_box(&bytes)))
    });
}

criterion_group!(benches, bench_compile, bench_encode, bench_decode);
criterion_main!(benches);
