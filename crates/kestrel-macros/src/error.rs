// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error handling macros.

/// Ensure a condition is true, or return an error.
///
/// The error may be a string literal, a format string, or any expression
/// convertible into the function's error type.
///
/// # Example
///
/// ```
/// use kestrel_macros::ensure;
///
/// fn divide(a: i32, b: i32) -> Result<i32, String> {
///     ensure!(b != 0, "division by zero");
///     Ok(a / b)
/// }
///
/// fn index(len: usize, i: usize) -> Result<usize, String> {
///     ensure!(i < len, "index {} out of range for length {}", i, len);
///     Ok(i)
/// }
///
/// assert!(divide(10, 0).is_err());
/// assert_eq!(divide(10, 2).unwrap(), 5);
/// assert_eq!(index(2, 5).unwrap_err(), "index 5 out of range for length 2");
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            return Err($msg.into());
        }
    };
    ($cond:expr, $fmt:literal, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($fmt, $($arg)*).into());
        }
    };
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    #[derive(Debug, PartialEq)]
    enum Failure {
        Negative(i32),
    }

    fn non_negative(x: i32) -> Result<i32, Failure> {
        ensure!(x >= 0, Failure::Negative(x));
        Ok(x)
    }

    #[test]
    fn test_ensure_with_error_value() {
        assert_eq!(non_negative(3), Ok(3));
        assert_eq!(non_negative(-2), Err(Failure::Negative(-2)));
    }

    #[test]
    fn test_ensure_with_message() {
        fn check(flag: bool) -> Result<(), String> {
            ensure!(flag, "flag was not set");
            Ok(())
        }

        assert!(check(true).is_ok());
        assert_eq!(check(false).unwrap_err(), "flag was not set");
    }
}
