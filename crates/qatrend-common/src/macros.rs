//! Convenience macros for early returns and attaching context to errors

/// Return early with a [`QaTrendError::Generic`](crate::QaTrendError::Generic)
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::QaTrendError::new($msg))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::QaTrendError::new(format!($fmt, $($arg)*)))
    };
}

/// Equivalent to `anyhow::ensure!` but for `QaTrendError`
///
/// # Examples
///
/// ```rust
/// use qatrend_common::{ensure, Result};
///
/// fn check_window(window: usize) -> Result<()> {
///     ensure!(window > 0, "window must be positive, got {}", window);
///     Ok(())
/// }
///
/// assert!(check_window(7).is_ok());
/// assert!(check_window(0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            $crate::bail!($msg);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::bail!($fmt, $($arg)*);
        }
    };
}

/// Add context to an error while preserving the error chain
///
/// # Examples
///
/// ```rust
/// use qatrend_common::{with_context, Result};
///
/// fn read_records() -> Result<String> {
///     std::fs::read_to_string("records.json")
///         .map_err(|e| with_context!(e, "Failed to read records file"))
/// }
/// ```
#[macro_export]
macro_rules! with_context {
    ($err:expr, $msg:literal $(,)?) => {
        $crate::QaTrendError::with_source($msg, $err)
    };
    ($err:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::QaTrendError::with_source(format!($fmt, $($arg)*), $err)
    };
}

/// Map the error side of a `Result` through [`with_context!`]
///
/// # Examples
///
/// ```rust
/// use qatrend_common::{result_with_context, Result};
///
/// fn load_file(path: &str) -> Result<String> {
///     result_with_context!(std::fs::read_to_string(path), "Failed to read {}", path)
/// }
/// ```
#[macro_export]
macro_rules! result_with_context {
    ($expr:expr, $msg:literal $(,)?) => {
        $expr.map_err(|e| $crate::with_context!(e, $msg))
    };
    ($expr:expr, $fmt:expr, $($arg:tt)*) => {
        $expr.map_err(|e| $crate::with_context!(e, $fmt, $($arg)*))
    };
}
