//! Assertion utilities for testing

#[doc(hidden)]
pub use hma_types::error::ErrorCode;

/// Assert that a result is OK and unwrap it
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => panic!("Expected Ok, got Err: {:?}", err),
        }
    };
}

/// Assert that a result is Err and unwrap the error
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(err) => err,
        }
    };
}

/// Assert that an error carries the given `ErrorCode` code
#[macro_export]
macro_rules! assert_error_code {
    ($err:expr, $code:expr) => {{
        use $crate::assertions::ErrorCode as _;
        let err = &$err;
        assert_eq!(err.code(), $code, "unexpected error: {}", err);
    }};
}

/// Panics unless every cursor is greater than or equal to the one before it.
pub fn assert_monotonic(cursors: &[hma_types::app::Cursor]) {
    for pair in cursors.windows(2) {
        if let [a, b] = pair {
            assert!(a <= b, "cursor moved backwards: {} -> {} in {:?}", a, b, cursors);
        }
    }
}
