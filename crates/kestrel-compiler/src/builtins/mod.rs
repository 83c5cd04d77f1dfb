//! The builtin function table.
//!
//! The compiler only knows builtins by name; it emits `GetBuiltin` with the
//! name's position in [`BUILTINS`]. The execution engine supplies the
//! behaviour behind each index, so the order here is part of the bytecode
//! contract and new names may only be appended.

/// Builtin names, in index order.
pub const BUILTINS: &[&str] = &[
    "print",
    "printf",
    "sprintf",
    "len",
    "copy",
    "append",
    "string",
    "int",
    "bool",
    "float",
    "char",
    "is_int",
    "is_float",
    "is_string",
    "is_bool",
    "is_char",
    "is_array",
    "is_map",
    "is_undefined",
    "is_function",
    "is_callable",
    "type_name",
];

/// Index of the builtin called `name`.
pub fn builtin_index(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|&builtin| builtin == name)
}

/// Name of the builtin at `index`.
pub fn builtin_name(index: usize) -> Option<&'static str> {
    BUILTINS.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(builtin_index("print"), Some(0));
        assert_eq!(builtin_index("len"), Some(3));
        assert_eq!(builtin_index("append"), Some(5));
        assert_eq!(builtin_index("nope"), None);
        assert_eq!(builtin_name(3), Some("len"));
        assert_eq!(builtin_name(BUILTINS.len()), None);
    }

    #[test]
    fn test_names_fit_operand() {
        // GetBuiltin carries a one-byte index
        assert!(BUILTINS.len() <= 256);
        for (i, name) in BUILTINS.iter().enumerate() {
            assert_eq!(builtin_index(name), Some(i), "duplicate builtin {name}");
        }
    }
}
