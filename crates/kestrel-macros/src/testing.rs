// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Testing helper macros.

/// Assert that an expression matches a pattern.
///
/// # Example
///
/// ```
/// use kestrel_macros::assert_matches;
///
/// #[derive(Debug)]
/// enum Outcome { Ok(i32), Err(String) }
///
/// let outcome = Outcome::Ok(42);
/// assert_matches!(outcome, Outcome::Ok(n) if n > 0);
/// ```
#[macro_export]
macro_rules! assert_matches {
    ($expr:expr, $pat:pat) => {
        match $expr {
            $pat => {}
            ref e => panic!(
                "assertion failed: `{}` does not match pattern `{}`\n  value: {:?}",
                stringify!($expr),
                stringify!($pat),
                e
            ),
        }
    };
    ($expr:expr, $pat:pat if $guard:expr) => {
        match $expr {
            $pat if $guard => {}
            ref e => panic!(
                "assertion failed: `{}` does not match pattern `{} if {}`\n  value: {:?}",
                stringify!($expr),
                stringify!($pat),
                stringify!($guard),
                e
            ),
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_matches_guard() {
        let value: Result<u8, &str> = Ok(7);
        assert_matches!(value, Ok(n) if n == 7);
        assert_matches!(Some('x'), Some(_));
    }

    #[test]
    #[should_panic(expected = "does not match pattern")]
    fn test_assert_matches_reports_mismatch() {
        let value: Option<u8> = None;
        assert_matches!(value, Some(_));
    }
}
