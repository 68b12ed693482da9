//! # Utility Functions Module
//!
//! Helpers for building external command lines. Arguments are kept as
//! `OsString` so that non UTF-8 paths reach ffmpeg untouched.

use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Conversion of a single command-line argument
pub trait ToArg {
    fn to_arg(&self) -> OsString;
}

impl ToArg for str {
    fn to_arg(&self) -> OsString {
        OsString::from(self)
    }
}

impl ToArg for OsStr {
    fn to_arg(&self) -> OsString {
        self.to_os_string()
    }
}

impl ToArg for Path {
    fn to_arg(&self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

macro_rules! numeric_args {
    ($($t:ty),*) => {
        $(impl ToArg for $t {
            fn to_arg(&self) -> OsString {
                OsString::from(self.to_string())
            }
        })*
    };
}

numeric_args!(u8, u16, u32, u64, usize, i32, i64, f32, f64);

/// Build an argument vector from strings, paths and numbers.
///
/// ```rust,ignore
/// let args = args!["-crf", crf, "-i", input_path];
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        {
            use $crate::utils::ToArg as _;
            vec![$(($item).to_arg()),*]
        }
    };
}
