// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type definition macros.
//!
//! Both macros generate closed enums whose discriminants are part of a wire
//! format, so the conversion back from the raw integer is always fallible.

/// Create an enum convertible to and from an integer representation.
///
/// The generated `TryFrom` impl hands the rejected value back as the error,
/// so callers can report exactly which byte was unknown.
///
/// # Example
///
/// ```
/// use kestrel_macros::int_enum;
///
/// int_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq)]
///     pub enum Color: u8 {
///         Red = 0,
///         Green = 1,
///         Blue = 2,
///     }
/// }
///
/// assert_eq!(Color::Green as u8, 1);
/// assert_eq!(Color::try_from(2u8).unwrap(), Color::Blue);
/// assert_eq!(Color::try_from(7u8), Err(7));
/// ```
#[macro_export]
macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr($repr)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl ::core::convert::TryFrom<$repr> for $name {
            type Error = $repr;

            fn try_from(value: $repr) -> ::core::result::Result<Self, $repr> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(other),
                }
            }
        }
    };
}

/// Define an opcode enum together with its static operand layout.
///
/// Each variant lists the byte width of every operand it carries. The macro
/// generates:
///
/// - the `#[repr(u8)]` enum itself,
/// - `ALL`, every opcode in declaration order,
/// - `name()`, the mnemonic (the variant name),
/// - `operand_widths()`, the per-operand byte widths,
/// - `TryFrom<u8>` returning the unknown byte on failure,
/// - `Display`, printing the mnemonic.
///
/// # Example
///
/// ```
/// use kestrel_macros::opcodes;
///
/// opcodes! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub enum Op {
///         /// Push a constant.
///         Constant = 0 [2],
///         /// Build a closure.
///         Closure = 1 [2, 1],
///         Pop = 2 [],
///     }
/// }
///
/// assert_eq!(Op::Closure.operand_widths(), &[2, 1]);
/// assert_eq!(Op::ALL.len(), 3);
/// assert_eq!(Op::try_from(9u8), Err(9));
/// ```
#[macro_export]
macro_rules! opcodes {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal [$($width:literal),* $(,)?]),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(u8)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $name {
            /// Every opcode, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The mnemonic used in disassembly.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }

            /// Byte width of each operand, in encoding order.
            pub const fn operand_widths(self) -> &'static [usize] {
                match self {
                    $($name::$variant => &[$($width),*],)+
                }
            }
        }

        impl ::core::convert::TryFrom<u8> for $name {
            type Error = u8;

            fn try_from(byte: u8) -> ::core::result::Result<Self, u8> {
                match byte {
                    $($value => Ok($name::$variant),)+
                    other => Err(other),
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_int_enum() {
        int_enum! {
            #[derive(Debug, Clone, Copy, PartialEq)]
            enum Status: u8 {
                Success = 0,
                Failed = 1,
                Pending = 2,
            }
        }

        assert_eq!(Status::Success as u8, 0);
        assert_eq!(Status::try_from(1u8).unwrap(), Status::Failed);
        assert_eq!(Status::try_from(2u8).unwrap(), Status::Pending);
        assert_eq!(Status::try_from(99u8), Err(99));
    }

    #[test]
    fn test_opcodes_table() {
        opcodes! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            enum Op {
                Nop = 0 [],
                Load = 1 [2],
                Pair = 2 [2, 1],
            }
        }

        assert_eq!(Op::ALL, &[Op::Nop, Op::Load, Op::Pair]);
        assert!(Op::Nop.operand_widths().is_empty());
        assert_eq!(Op::Load.operand_widths(), &[2]);
        assert_eq!(Op::Pair.operand_widths(), &[2, 1]);
        assert_eq!(Op::Pair.name(), "Pair");
        assert_eq!(format!("{}", Op::Load), "Load");
        for op in Op::ALL {
            assert_eq!(Op::try_from(*op as u8), Ok(*op));
        }
        assert_eq!(Op::try_from(3u8), Err(3));
    }
}
