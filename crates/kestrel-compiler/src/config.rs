//! Compiler configuration.

use serde::{Deserialize, Serialize};

/// Default limit on value nesting accepted by the bytecode decoder.
pub const DEFAULT_MAX_DECODE_DEPTH: usize = 128;

/// Options controlling code generation and bytecode decoding.
///
/// Missing fields deserialize to their defaults, so a partial configuration
/// file is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Emit `TailCall` for `return f(...)` in tail position.
    pub tail_calls: bool,
    /// Deepest array/map/closure nesting the decoder accepts.
    pub max_decode_depth: usize,
}

impl CompilerConfig {
    /// Configuration with every option at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable tail-call emission.
    pub fn with_tail_calls(mut self, enabled: bool) -> Self {
        self.tail_calls = enabled;
        self
    }

    /// Set the decoder nesting limit.
    pub fn with_max_decode_depth(mut self, depth: usize) -> Self {
        self.max_decode_depth = depth;
        self
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            tail_calls: true,
            max_decode_depth: DEFAULT_MAX_DECODE_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::new();
        assert!(config.tail_calls);
        assert_eq!(config.max_decode_depth, DEFAULT_MAX_DECODE_DEPTH);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CompilerConfig = serde_json::from_str(r#"{"tail_calls": false}"#).unwrap();
        assert!(!config.tail_calls);
        assert_eq!(config.max_decode_depth, DEFAULT_MAX_DECODE_DEPTH);

        let json = serde_json::to_string(&config.clone().with_max_decode_depth(4)).unwrap();
        let back: CompilerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_decode_depth, 4);
        assert!(!back.tail_calls);
    }
}
