//! # Utility Functions Module
//!
//! Helpers that keep external command construction readable.

use std::ffi::{OsStr, OsString};

/// Converts any path-like or string-like value into an owned command argument.
///
/// Paths stay `OsString` all the way to the child process, so file names that
/// are not valid UTF-8 are passed through untouched.
pub fn os_arg<S: AsRef<OsStr> + ?Sized>(item: &S) -> OsString {
    item.as_ref().to_os_string()
}

/// Macro for building a `Vec<OsString>` argument list from mixed items.
///
/// Every item must implement `AsRef<OsStr>` (`&str`, `String`, `&Path`, `PathBuf`).
///
/// # Example
/// ```rust
/// use epub_shrinker::args;
///
/// let quality = 85;
/// let args = args!["-quality", quality.to_string(), std::path::Path::new("out.jpg")];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$($crate::utils::os_arg(&$item)),*]
    };
}
