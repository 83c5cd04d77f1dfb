//! Operation codes for the VM.
//!
//! Every instruction is one opcode byte followed by zero or more big-endian
//! operands whose widths are fixed per opcode.

use kestrel_macros::opcodes;

opcodes! {
    /// Operation codes for the VM.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum OpCode {
        // Stack operations
        /// Push constant pool entry `index`
        Constant = 0 [2],
        /// Pop the top value
        Pop = 1 [],
        /// Push true
        True = 2 [],
        /// Push false
        False = 3 [],
        /// Push undefined
        Null = 4 [],

        // Arithmetic operations
        /// Add top two values
        Add = 5 [],
        /// Subtract
        Sub = 6 [],
        /// Multiply
        Mul = 7 [],
        /// Divide
        Div = 8 [],
        /// Remainder
        Rem = 9 [],

        // Bitwise operations
        /// Bitwise and
        BAnd = 10 [],
        /// Bitwise or
        BOr = 11 [],
        /// Bitwise xor
        BXor = 12 [],
        /// Bitwise and-not
        BAndNot = 13 [],
        /// Shift left
        BShiftLeft = 14 [],
        /// Arithmetic shift right
        BShiftRight = 15 [],
        /// Bitwise complement
        BComplement = 16 [],

        // Unary operations
        /// Arithmetic negation
        Minus = 17 [],
        /// Logical not
        LNot = 18 [],

        // Comparison operations
        /// Equal
        Equal = 19 [],
        /// Not equal
        NotEqual = 20 [],
        /// Greater than
        GreaterThan = 21 [],
        /// Greater than or equal
        GreaterThanEqual = 22 [],

        // Control flow (absolute byte offsets)
        /// Unconditional jump
        Jump = 23 [2],
        /// Pop; jump if falsy
        JumpFalsy = 24 [2],
        /// Jump keeping the value if falsy, otherwise pop
        AndJump = 25 [2],
        /// Jump keeping the value if truthy, otherwise pop
        OrJump = 26 [2],

        // Collections
        /// Build an array from the top `count` values
        Array = 27 [2],
        /// Build a map from the top `count` values (key/value pairs)
        Map = 28 [2],
        /// Index into a value
        Index = 29 [],
        /// Slice a value with low/high bounds
        SliceIndex = 30 [],

        // Calls
        /// Call with `argc` arguments
        Call = 31 [1],
        /// Call with `argc` arguments, reusing the current frame
        TailCall = 32 [1],
        /// Return undefined
        Return = 33 [],
        /// Return the top value
        ReturnValue = 34 [],

        // Variables
        /// Load global `index`
        GetGlobal = 35 [2],
        /// Store global `index`
        SetGlobal = 36 [2],
        /// Store into global `index` through `depth` selectors
        SetSelGlobal = 37 [2, 1],
        /// Load local `index`
        GetLocal = 38 [1],
        /// Store local `index`
        SetLocal = 39 [1],
        /// Store into local `index` through `depth` selectors
        SetSelLocal = 40 [1, 1],
        /// Load captured variable `index`
        GetFree = 41 [1],
        /// Store captured variable `index`
        SetFree = 42 [1],
        /// Store into captured variable `index` through `depth` selectors
        SetSelFree = 43 [1, 1],
        /// Load builtin `index`
        GetBuiltin = 44 [1],
        /// Build a closure from constant `index` and `count` free values
        Closure = 45 [2, 1],

        // Iteration
        /// Replace the top value with an iterator over it
        IteratorInit = 46 [],
        /// Advance the iterator, push whether it has an element
        IteratorNext = 47 [],
        /// Push the iterator's current key
        IteratorKey = 48 [],
        /// Push the iterator's current value
        IteratorValue = 49 [],
    }
}

impl OpCode {
    /// Total encoded size of an instruction with this opcode.
    pub fn instruction_width(self) -> usize {
        1 + self.operand_widths().iter().sum::<usize>()
    }

    /// Returns true if control never falls through this instruction.
    pub fn is_return(self) -> bool {
        matches!(
            self,
            OpCode::Return | OpCode::ReturnValue | OpCode::TailCall
        )
    }

    /// Returns true if the single operand is an absolute jump target.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            OpCode::Jump | OpCode::JumpFalsy | OpCode::AndJump | OpCode::OrJump
        )
    }
}
