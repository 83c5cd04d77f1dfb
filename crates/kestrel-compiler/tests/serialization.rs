//! Binary encoding of compiled bytecode.

mod common;

use common::{init_tracing, sample_program};
use kestrel_compiler::runtime::{Closure, CompiledFunction};
use kestrel_compiler::{
    Bytecode, CompilerConfig, Error, ErrorKind, Instructions, OpCode, SerializationError, Value,
    compile, make,
};
use std::sync::Arc;

fn concat(parts: Vec<Vec<u8>>) -> Instructions {
    parts.into_iter().collect()
}

fn ins(op: OpCode, operands: &[usize]) -> Vec<u8> {
    make(op, operands).unwrap()
}

fn round_trip(bytecode: &Bytecode) -> Bytecode {
    let bytes = bytecode.encode().unwrap();
    let decoded = Bytecode::decode(&bytes).unwrap();
    assert_eq!(&decoded, bytecode);
    assert_eq!(decoded.encode().unwrap(), bytes, "re-encoding must be byte-identical");
    decoded
}

#[test]
fn test_empty_bytecode() {
    round_trip(&Bytecode::default());
}

#[test]
fn test_heterogeneous_constants() {
    init_tracing();

    let function = CompiledFunction::new(
        concat(vec![
            ins(OpCode::Constant, &[3]),
            ins(OpCode::SetLocal, &[0]),
            ins(OpCode::GetGlobal, &[0]),
            ins(OpCode::GetFree, &[0]),
        ]),
        0,
        1,
    );
    let bytecode = Bytecode::new(
        Instructions::default(),
        vec![
            Value::array(vec![
                Value::Int(12),
                Value::string("foo"),
                Value::Bool(true),
                Value::Float(93.11),
                Value::Char('x'),
            ]),
            Value::Bool(false),
            Value::Char('y'),
            Value::Float(93.11),
            Value::function(function),
            Value::Float(39.2),
            Value::Int(192),
            Value::map([("a", Value::Float(-93.1)), ("b", Value::Bool(false))]),
            Value::string("bar"),
            Value::Undefined,
        ],
    );
    round_trip(&bytecode);
}

#[test]
fn test_edge_scalars() {
    let bytecode = Bytecode::new(
        Instructions::default(),
        vec![
            Value::Int(i64::MIN),
            Value::Int(i64::MAX),
            Value::Float(f64::NAN),
            Value::Float(-0.0),
            Value::Float(f64::INFINITY),
            Value::string(""),
            Value::string("héllo, 世界"),
            Value::Char('🦀'),
            Value::array(vec![]),
            Value::map(Vec::<(String, Value)>::new()),
        ],
    );
    let decoded = round_trip(&bytecode);
    let Value::Float(zero) = decoded.constants()[3] else {
        panic!("expected a float");
    };
    assert!(zero.is_sign_negative());
}

#[test]
fn test_closures_with_captured_values() {
    let inner = Arc::new(CompiledFunction::new(
        concat(vec![
            ins(OpCode::GetFree, &[0]),
            ins(OpCode::GetFree, &[1]),
            ins(OpCode::Add, &[]),
            ins(OpCode::ReturnValue, &[]),
        ]),
        0,
        0,
    ));
    let nested = Closure::new(
        inner.clone(),
        vec![Value::Int(1), Value::array(vec![Value::string("x")])],
    );
    let outer = Closure::new(inner, vec![Value::closure(nested), Value::Undefined]);

    round_trip(&Bytecode::new(
        concat(vec![ins(OpCode::Constant, &[0]), ins(OpCode::Pop, &[])]),
        vec![Value::closure(outer)],
    ));
}

#[test]
fn test_compiled_program_round_trip() {
    init_tracing();
    round_trip(&compile(&sample_program()).unwrap());
}

#[test]
fn test_map_encoding_is_canonical() {
    let forward = Value::map([("a", Value::Int(1)), ("b", Value::Int(2)), ("c", Value::Int(3))]);
    let backward = Value::map([("c", Value::Int(3)), ("b", Value::Int(2)), ("a", Value::Int(1))]);
    let encode = |v: Value| Bytecode::new(Instructions::default(), vec![v]).encode().unwrap();
    assert_eq!(encode(forward), encode(backward));
}

#[test]
fn test_count_prefix_larger_than_payload() {
    let bytes = Bytecode::new(Instructions::default(), vec![Value::Int(1), Value::Int(2)])
        .encode()
        .unwrap();
    // [0 0 0 0] [0 0 0 2] [1 i64] [1 i64]
    assert_eq!(&bytes[4..8], &[0, 0, 0, 2]);

    let mut corrupt = bytes.clone();
    corrupt[7] = 5;
    let err = Bytecode::decode(&corrupt).unwrap_err();
    assert!(matches!(err, SerializationError::Truncated { .. }), "{:?}", err);
    assert_eq!(Error::from(err).kind(), ErrorKind::SerializationCorruption);

    // a count that could never fit in the remaining bytes is rejected up front
    let mut corrupt = bytes;
    corrupt[4] = 0xFF;
    assert!(matches!(
        Bytecode::decode(&corrupt),
        Err(SerializationError::LengthOverflow { offset: 4, .. })
    ));
}

#[test]
fn test_every_truncation_is_rejected() {
    let bytes = compile(&sample_program()).unwrap().encode().unwrap();
    for len in 0..bytes.len() {
        assert!(
            Bytecode::decode(&bytes[..len]).is_err(),
            "prefix of {} bytes decoded",
            len
        );
    }
}

#[test]
fn test_unknown_tag() {
    let bytes = [0, 0, 0, 0, 0, 0, 0, 1, 42];
    assert_eq!(
        Bytecode::decode(&bytes),
        Err(SerializationError::UnknownTag { tag: 42, offset: 8 })
    );
}

#[test]
fn test_decode_depth_is_configurable() {
    let mut value = Value::Int(0);
    for _ in 0..10 {
        value = Value::array(vec![value]);
    }
    let bytes = Bytecode::new(Instructions::default(), vec![value]).encode().unwrap();

    assert!(Bytecode::decode(&bytes).is_ok());

    let shallow = CompilerConfig::new().with_max_decode_depth(5);
    assert_eq!(
        Bytecode::decode_with_config(&bytes, &shallow),
        Err(SerializationError::NestingTooDeep { limit: 5 })
    );
}

#[test]
fn test_encode_depth_is_configurable() {
    let mut value = Value::Int(0);
    for _ in 0..10 {
        value = Value::array(vec![value]);
    }
    let bytecode = Bytecode::new(Instructions::default(), vec![value]);

    let shallow = CompilerConfig::new().with_max_decode_depth(5);
    assert_eq!(
        bytecode.encode_with_config(&shallow),
        Err(SerializationError::NestingTooDeep { limit: 5 })
    );

    let exact = CompilerConfig::new().with_max_decode_depth(10);
    let bytes = bytecode.encode_with_config(&exact).unwrap();
    assert_eq!(Bytecode::decode_with_config(&bytes, &exact).unwrap(), bytecode);
}
