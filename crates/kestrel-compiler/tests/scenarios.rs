//! End-to-end compilation scenarios.

mod common;

use common::{bin, call, id, init_tracing, int, sample_program};
use kestrel_compiler::ast::{BinaryOperator, Expression, Program, Statement};
use kestrel_compiler::runtime::CompiledFunction;
use kestrel_compiler::{Bytecode, Compiler, CompilerConfig, ErrorKind, Instructions, OpCode, Value, compile};

fn ops(instructions: &Instructions) -> Vec<OpCode> {
    instructions
        .iter()
        .map(|i| i.expect("instruction should decode").op)
        .collect()
}

fn functions(bytecode: &Bytecode) -> Vec<&CompiledFunction> {
    bytecode
        .constants()
        .iter()
        .filter_map(|c| c.as_compiled_function().map(|f| f.as_ref()))
        .collect()
}

#[test]
fn test_sample_program_compiles() {
    init_tracing();

    let bytecode = compile(&sample_program()).unwrap();
    bytecode.instructions().validate().unwrap();
    for function in functions(&bytecode) {
        function.instructions.validate().unwrap();
        assert!(
            ops(&function.instructions).last().unwrap().is_return(),
            "every function must end by leaving its frame:\n{}",
            function.instructions
        );
    }

    let top = ops(bytecode.instructions());
    for op in [
        OpCode::Map,
        OpCode::SetSelGlobal,
        OpCode::IteratorInit,
        OpCode::SliceIndex,
        OpCode::AndJump,
        OpCode::OrJump,
        OpCode::GetBuiltin,
    ] {
        assert!(top.contains(&op), "missing {} in:\n{}", op, bytecode.instructions());
    }
    // functions are only ever called at top level
    assert!(!top.contains(&OpCode::Return));
    assert!(!top.contains(&OpCode::ReturnValue));
}

#[test]
fn test_counter_closure_captures_and_updates() {
    let bytecode = compile(&sample_program()).unwrap();

    // the closure returned by `counter` is the only function using free slots
    let inner = functions(&bytecode)
        .into_iter()
        .find(|f| ops(&f.instructions).contains(&OpCode::GetFree))
        .expect("closure body");
    assert_eq!(
        ops(&inner.instructions),
        vec![
            OpCode::GetFree,
            OpCode::Constant,
            OpCode::Add,
            OpCode::SetFree,
            OpCode::GetFree,
            OpCode::ReturnValue,
        ]
    );
}

#[test]
fn test_free_variables_ordered_outermost_first() {
    // func(a) { func(b) { func(c) { a; b; c } } }
    let innermost = Expression::function(
        &["c"],
        vec![
            Statement::expression(id("a")),
            Statement::expression(id("b")),
            Statement::expression(id("c")),
        ],
    );
    let middle = Expression::function(&["b"], vec![Statement::expression(innermost)]);
    let outer = Expression::function(&["a"], vec![Statement::expression(middle)]);
    let bytecode = compile(&Program::new(vec![Statement::expression(outer)])).unwrap();

    let [innermost, middle, outer] = functions(&bytecode)[..] else {
        panic!("expected three functions");
    };

    let loads: Vec<_> = innermost
        .instructions
        .iter()
        .map(Result::unwrap)
        .filter(|i| matches!(i.op, OpCode::GetFree | OpCode::GetLocal))
        .map(|i| (i.op, i.operands[0]))
        .collect();
    assert_eq!(
        loads,
        vec![(OpCode::GetFree, 0), (OpCode::GetFree, 1), (OpCode::GetLocal, 0)]
    );

    let middle_code: Vec<_> = middle.instructions.iter().map(Result::unwrap).collect();
    assert_eq!(middle_code[0].op, OpCode::GetFree);
    assert_eq!(middle_code[0].operands, vec![0]);
    assert_eq!(middle_code[1].op, OpCode::GetLocal);
    assert_eq!(middle_code[1].operands, vec![0]);
    assert_eq!(middle_code[2].op, OpCode::Closure);
    assert_eq!(middle_code[2].operands, vec![0, 2]);

    assert_eq!(
        ops(&outer.instructions),
        vec![OpCode::GetLocal, OpCode::Closure, OpCode::Pop, OpCode::Return]
    );
}

#[test]
fn test_tail_call_in_countdown() {
    // count := func(n) { if n == 0 { return 0 }; return count(n - 1) }
    let program = Program::new(vec![Statement::define(
        "count",
        Expression::function(
            &["n"],
            vec![
                Statement::if_else(
                    bin(BinaryOperator::Equal, id("n"), int(0)),
                    vec![Statement::return_value(int(0))],
                    None,
                ),
                Statement::return_value(call(
                    "count",
                    vec![bin(BinaryOperator::Subtract, id("n"), int(1))],
                )),
            ],
        ),
    )]);

    let bytecode = compile(&program).unwrap();
    let body = ops(&functions(&bytecode)[0].instructions);
    assert_eq!(body.last(), Some(&OpCode::TailCall));
    assert!(!body.contains(&OpCode::Call));

    let bytecode = Compiler::with_config(CompilerConfig::new().with_tail_calls(false))
        .compile(&program)
        .unwrap();
    let body = ops(&functions(&bytecode)[0].instructions);
    assert_eq!(&body[body.len() - 2..], &[OpCode::Call, OpCode::ReturnValue]);
}

#[test]
fn test_block_globals_reuse_slots() {
    // { a := 1 }; b := 2
    let bytecode = compile(&Program::new(vec![
        Statement::block(vec![Statement::define("a", int(1))]),
        Statement::define("b", int(2)),
    ]))
    .unwrap();
    let code: Vec<_> = bytecode.instructions().iter().map(Result::unwrap).collect();
    assert_eq!(code[1].op, OpCode::SetGlobal);
    assert_eq!(code[1].operands, vec![0]);
    assert_eq!(code[3].op, OpCode::SetGlobal);
    assert_eq!(code[3].operands, vec![0]);
}

#[test]
fn test_block_scope_ends_visibility() {
    // { a := 1 }; a
    let err = compile(&Program::new(vec![
        Statement::block(vec![Statement::define("a", int(1))]),
        Statement::expression(id("a")),
    ]))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedIdentifier);
}

#[test]
fn test_disassembly() {
    let bytecode = compile(&Program::new(vec![Statement::define(
        "f",
        Expression::function(&["x"], vec![Statement::return_value(id("x"))]),
    )]))
    .unwrap();
    assert_eq!(
        bytecode.to_string(),
        "0000 Constant 0\n\
         0003 SetGlobal 0\n\
         [  0] compiled-function (params: 1, locals: 1)\n      \
         0000 GetLocal 0\n      \
         0002 ReturnValue\n"
    );
}

#[test]
fn test_compile_is_deterministic() {
    let a = compile(&sample_program()).unwrap();
    let b = compile(&sample_program()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.encode().unwrap(), b.encode().unwrap());
}

#[test]
fn test_first_error_aborts() {
    let err = compile(&Program::new(vec![
        Statement::define("a", int(1)),
        Statement::expression(id("missing")),
        Statement::Break,
    ]))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedIdentifier);
    assert_eq!(err.to_string(), "unresolved reference 'missing'");
}

#[test]
fn test_constants_keep_source_order() {
    let bytecode = compile(&Program::new(vec![
        Statement::expression(Expression::string("x")),
        Statement::expression(Expression::float(1.5)),
        Statement::expression(Expression::char('c')),
    ]))
    .unwrap();
    assert_eq!(
        bytecode.constants(),
        &[Value::string("x"), Value::Float(1.5), Value::Char('c')]
    );
}
