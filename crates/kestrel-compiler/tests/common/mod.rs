//! Shared helpers for the integration tests.

#![allow(dead_code)]

use kestrel_compiler::ast::{
    AssignOperator, BinaryOperator, Expression, Program, Statement, UnaryOperator,
};
use tracing_subscriber::EnvFilter;

/// Routes compiler logs through the test harness. Set `RUST_LOG=debug` to
/// see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn id(name: &str) -> Expression {
    Expression::ident(name)
}

pub fn int(n: i64) -> Expression {
    Expression::int(n)
}

pub fn bin(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::binary(operator, left, right)
}

pub fn call(callee: &str, arguments: Vec<Expression>) -> Expression {
    Expression::call(id(callee), arguments)
}

/// A program touching most of the language:
///
/// ```text
/// fib := func(x) {
///     if x == 0 { return 0 } else if x == 1 { return 1 }
///     return fib(x - 1) + fib(x - 2)
/// }
/// counter := func() {
///     n := 0
///     return func() { n += 1; return n }
/// }
/// c := counter()
/// m := {name: "kestrel", tags: ["a", "b"], ratio: 0.5}
/// m.tags[1] = 'z'
/// total := 0
/// for i := 0; i < 10; i++ {
///     if i % 2 == 0 { continue }
///     total += i
///     if total > 20 { break }
/// }
/// for k, v in m { printf("%s=%v\n", k, v) }
/// s := "hello"[1:3]
/// ok := total > 5 && !is_undefined(s) || false
/// ```
pub fn sample_program() -> Program {
    let fib = Expression::function(
        &["x"],
        vec![
            Statement::if_else(
                bin(BinaryOperator::Equal, id("x"), int(0)),
                vec![Statement::return_value(int(0))],
                Some(Statement::if_else(
                    bin(BinaryOperator::Equal, id("x"), int(1)),
                    vec![Statement::return_value(int(1))],
                    None,
                )),
            ),
            Statement::return_value(bin(
                BinaryOperator::Add,
                call("fib", vec![bin(BinaryOperator::Subtract, id("x"), int(1))]),
                call("fib", vec![bin(BinaryOperator::Subtract, id("x"), int(2))]),
            )),
        ],
    );

    let counter = Expression::function(
        &[],
        vec![
            Statement::define("n", int(0)),
            Statement::return_value(Expression::function(
                &[],
                vec![
                    Statement::assign_op(id("n"), AssignOperator::Add, int(1)),
                    Statement::return_value(id("n")),
                ],
            )),
        ],
    );

    let record = Expression::map([
        ("name", Expression::string("kestrel")),
        (
            "tags",
            Expression::array(vec![Expression::string("a"), Expression::string("b")]),
        ),
        ("ratio", Expression::float(0.5)),
    ]);

    let counting_loop = Statement::for_loop(
        Some(Statement::define("i", int(0))),
        Some(bin(BinaryOperator::LessThan, id("i"), int(10))),
        Some(Statement::increment(id("i"))),
        vec![
            Statement::if_else(
                bin(
                    BinaryOperator::Equal,
                    bin(BinaryOperator::Modulo, id("i"), int(2)),
                    int(0),
                ),
                vec![Statement::Continue],
                None,
            ),
            Statement::assign_op(id("total"), AssignOperator::Add, id("i")),
            Statement::if_else(
                bin(BinaryOperator::GreaterThan, id("total"), int(20)),
                vec![Statement::Break],
                None,
            ),
        ],
    );

    let printing_loop = Statement::for_in(
        Some("k"),
        Some("v"),
        id("m"),
        vec![Statement::expression(call(
            "printf",
            vec![Expression::string("%s=%v\n"), id("k"), id("v")],
        ))],
    );

    let ok = bin(
        BinaryOperator::LogicalOr,
        bin(
            BinaryOperator::LogicalAnd,
            bin(BinaryOperator::GreaterThan, id("total"), int(5)),
            Expression::unary(UnaryOperator::LogicalNot, call("is_undefined", vec![id("s")])),
        ),
        Expression::bool(false),
    );

    Program::new(vec![
        Statement::define("fib", fib),
        Statement::define("counter", counter),
        Statement::define("c", call("counter", vec![])),
        Statement::define("m", record),
        Statement::assign(
            Expression::index(Expression::selector(id("m"), "tags"), int(1)),
            Expression::char('z'),
        ),
        Statement::define("total", int(0)),
        counting_loop,
        printing_loop,
        Statement::define(
            "s",
            Expression::slice(Expression::string("hello"), Some(int(1)), Some(int(3))),
        ),
        Statement::define("ok", ok),
    ])
}
