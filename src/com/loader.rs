//! Provides shared-library symbol resolution.
//!
//! [`SymbolLoader`] is the seam between the factory and the operating system:
//! [`SystemLoader`] resolves real exports, and tests substitute a loader that
//! hands back the addresses of in-process stub functions.
//!
//! # Examples
//! ```
//! use clrhost::com::loader::{SymbolLoader, SystemLoader};
//!
//! let result = SystemLoader.resolve("definitely-not-a-library.dll", "Nothing");
//! assert!(result.is_err());
//! ```

use crate::com::ffi::RawAddress;
use crate::error::{Error, Result};

/// Resolves an exported function to a callable address.
pub trait SymbolLoader {
    /// Loads `library` and looks up `symbol` in it.
    ///
    /// # Errors
    /// Returns [`Error::LibraryNotFound`] if the library cannot be loaded and
    /// [`Error::SymbolNotFound`] if it does not export `symbol`.
    fn resolve(&self, library: &str, symbol: &str) -> Result<RawAddress>;
}

impl<L: SymbolLoader + ?Sized> SymbolLoader for &L {
    fn resolve(&self, library: &str, symbol: &str) -> Result<RawAddress> {
        (**self).resolve(library, symbol)
    }
}

/// Resolves symbols with `LoadLibraryW` and `GetProcAddress`.
///
/// Modules are never unloaded: objects created from a module keep pointing
/// into its code long after the loader is gone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoader;

#[cfg(windows)]
impl SymbolLoader for SystemLoader {
    fn resolve(&self, library: &str, symbol: &str) -> Result<RawAddress> {
        use std::ffi::CString;

        use windows::core::{PCSTR, PCWSTR};
        use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

        use crate::com::helpers::to_wide;

        tracing::debug!(library, symbol, "resolving native symbol");

        let library_wide = to_wide(library);
        let module = unsafe { LoadLibraryW(PCWSTR::from_raw(library_wide.as_ptr())) }.map_err(
            |e| Error::LibraryNotFound {
                library: library.to_owned(),
                detail: e.message(),
            },
        )?;

        if module.is_invalid() {
            return Err(Error::LibraryNotFound {
                library: library.to_owned(),
                detail: "invalid module handle".to_owned(),
            });
        }

        let not_found = || Error::SymbolNotFound {
            library: library.to_owned(),
            symbol: symbol.to_owned(),
        };

        let symbol_name = CString::new(symbol).map_err(|_| not_found())?;
        let proc = unsafe { GetProcAddress(module, PCSTR::from_raw(symbol_name.as_ptr() as *const u8)) }
            .ok_or_else(not_found)?;

        Ok(proc as RawAddress)
    }
}

#[cfg(not(windows))]
impl SymbolLoader for SystemLoader {
    fn resolve(&self, library: &str, symbol: &str) -> Result<RawAddress> {
        tracing::debug!(library, symbol, "native symbol resolution unavailable on this platform");
        Err(Error::LibraryNotFound {
            library: library.to_owned(),
            detail: "loading COM servers requires Windows".to_owned(),
        })
    }
}
