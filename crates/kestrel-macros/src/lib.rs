// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Declarative macros shared across the Kestrel workspace.
//!
//! # Macros Overview
//!
//! ## Tables
//! - [`int_enum!`] - Closed `#[repr]` enums convertible to/from integers
//! - [`opcodes!`] - Opcode enum plus its mnemonic and operand-width table
//!
//! ## Error Handling
//! - [`ensure!`] - Assertion that returns an error instead of panicking
//!
//! ## Testing
//! - [`assert_matches!`] - Assert that an expression matches a pattern
//!
//! # Examples
//!
//! ```
//! use kestrel_macros::*;
//!
//! opcodes! {
//!     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//!     pub enum Op {
//!         Push = 0 [2],
//!         Pop = 1 [],
//!     }
//! }
//!
//! assert_eq!(Op::Push.operand_widths(), &[2]);
//! assert_eq!(Op::try_from(1u8), Ok(Op::Pop));
//! assert_eq!(Op::Pop.to_string(), "Pop");
//! ```

#![warn(missing_docs)]

mod error;
mod testing;
mod types;
