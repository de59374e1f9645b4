//! Provides the crate error type and the 32-bit status code every native call returns.
//!
//! # Examples
//! ```
//! use clrhost::{Error, StatusCode};
//!
//! let err = Error::NativeFactoryError { code: StatusCode::E_FAIL };
//! assert_eq!(
//!     err.to_string(),
//!     "the native factory returned a non-zero HRESULT: 0x80004005"
//! );
//! ```

use std::fmt;

use thiserror::Error;
use windows_core::{GUID, HRESULT};

/// Result type for binding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a raw `HRESULT` as returned across the vtable boundary.
///
/// Zero is success; every other value is passed through verbatim and rendered
/// in hexadecimal so it can be looked up in the native documentation.
///
/// # Examples
/// ```
/// use clrhost::StatusCode;
///
/// let code = StatusCode::from_raw(0x80131700u32 as i32);
/// assert!(!code.is_success());
/// assert_eq!(code.to_string(), "0x80131700");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct StatusCode(pub i32);

impl StatusCode {
    /// `S_OK`.
    pub const S_OK: Self = Self(0);
    /// `S_FALSE`, used by enumerators to signal the end of the sequence.
    pub const S_FALSE: Self = Self(1);
    /// `E_NOTIMPL`.
    pub const E_NOTIMPL: Self = Self(0x80004001u32 as i32);
    /// `E_NOINTERFACE`.
    pub const E_NOINTERFACE: Self = Self(0x80004002u32 as i32);
    /// `E_POINTER`.
    pub const E_POINTER: Self = Self(0x80004003u32 as i32);
    /// `E_FAIL`.
    pub const E_FAIL: Self = Self(0x80004005u32 as i32);
    /// `E_INVALIDARG`.
    pub const E_INVALIDARG: Self = Self(0x80070057u32 as i32);
    /// `CLASS_E_CLASSNOTAVAILABLE`.
    pub const CLASS_E_CLASSNOTAVAILABLE: Self = Self(0x80040111u32 as i32);
    /// `HRESULT_FROM_WIN32(ERROR_INSUFFICIENT_BUFFER)`.
    pub const INSUFFICIENT_BUFFER: Self = Self(0x8007007Au32 as i32);

    /// Wraps a raw status value.
    pub const fn from_raw(code: i32) -> Self {
        Self(code)
    }

    /// Truncates a word-sized call result to the 32-bit status it carries.
    ///
    /// Callees returning `HRESULT` only define the low 32 bits of the result
    /// register.
    pub const fn from_word(word: usize) -> Self {
        Self(word as u32 as i32)
    }

    /// Returns the raw status value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns `true` only for a zero status.
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Converts a zero status to `Ok(())` and anything else to `Err(self)`.
    pub fn ok(self) -> std::result::Result<(), StatusCode> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusCode({:#010x})", self.0 as u32)
    }
}

impl From<HRESULT> for StatusCode {
    fn from(hr: HRESULT) -> Self {
        Self(hr.0)
    }
}

impl From<StatusCode> for HRESULT {
    fn from(code: StatusCode) -> Self {
        HRESULT(code.0)
    }
}

/// Errors surfaced by the binding layer.
///
/// Nothing here is retried automatically; native status codes are carried
/// unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The shared library could not be loaded.
    #[error("failed to load library {library}: {detail}")]
    LibraryNotFound { library: String, detail: String },

    /// The library loaded but does not export the requested symbol.
    #[error("symbol {symbol} not found in {library}")]
    SymbolNotFound { library: String, symbol: String },

    /// The class ID was rejected before any native call was made.
    #[error("the input class ID (CLSID) is not supported: {0:?}")]
    UnsupportedClass(GUID),

    /// The native factory export returned a non-zero status.
    #[error("the native factory returned a non-zero HRESULT: {code}")]
    NativeFactoryError { code: StatusCode },

    /// A vtable method returned a non-zero status.
    #[error("{interface}::{method} returned a non-zero HRESULT: {code}")]
    NativeMethodError {
        interface: &'static str,
        method: &'static str,
        code: StatusCode,
    },

    /// A call reported success but left its out-handle null.
    #[error("{interface}::{method} succeeded but produced a null object")]
    NullObject {
        interface: &'static str,
        method: &'static str,
    },
}

impl Error {
    /// Returns the native status code carried by this error, if any.
    ///
    /// # Examples
    /// ```
    /// use clrhost::{Error, StatusCode};
    ///
    /// let err = Error::NativeMethodError {
    ///     interface: "ICLRMetaHost",
    ///     method: "GetRuntime",
    ///     code: StatusCode::from_raw(1),
    /// };
    /// assert_eq!(err.status(), Some(StatusCode::from_raw(1)));
    /// ```
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::NativeFactoryError { code } | Error::NativeMethodError { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}
