//! Implements the factory that turns `CLRCreateInstance` into owned interface pointers.
//!
//! The native export has the signature
//! `HRESULT CLRCreateInstance(REFCLSID clsid, REFIID riid, LPVOID *ppInterface)`.
//! The class ID is checked against [`guids::SUPPORTED_CLASSES`] before the
//! library is even loaded, so a rejected request leaves no native state behind.
//!
//! # Examples
//! ```
//! use clrhost::guids::{CLSID_CLR_DEBUGGING, IID_ICLR_DEBUGGING};
//! use clrhost::{ClrFactory, Error};
//!
//! let err = ClrFactory::new()
//!     .create_instance(&CLSID_CLR_DEBUGGING, &IID_ICLR_DEBUGGING)
//!     .unwrap_err();
//! assert_eq!(err, Error::UnsupportedClass(CLSID_CLR_DEBUGGING));
//! ```

use std::ffi::c_void;

use windows_core::GUID;

use crate::com::ffi::invoke;
use crate::com::{IUnknown, Interface, SymbolLoader, SystemLoader};
use crate::config::FactoryConfig;
use crate::error::{Error, Result};
use crate::guids::{self, CLSID_CLR_META_HOST};
use crate::interfaces::ICLRMetaHost;

/// Creates CLR hosting objects through a resolved factory export.
#[derive(Debug, Clone)]
pub struct ClrFactory<L = SystemLoader> {
    loader: L,
    config: FactoryConfig,
}

impl ClrFactory<SystemLoader> {
    /// Creates a factory for `mscoree.dll!CLRCreateInstance`.
    pub fn new() -> Self {
        Self::with_loader(SystemLoader, FactoryConfig::default())
    }
}

impl Default for ClrFactory<SystemLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: SymbolLoader> ClrFactory<L> {
    /// Creates a factory that resolves `config` through `loader`.
    pub fn with_loader(loader: L, config: FactoryConfig) -> Self {
        Self { loader, config }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Creates the object of class `clsid` and returns it as interface `iid`.
    ///
    /// # Errors
    /// - [`Error::UnsupportedClass`] if `clsid` is not supported (checked
    ///   before anything is loaded or called)
    /// - [`Error::LibraryNotFound`] / [`Error::SymbolNotFound`] if the export
    ///   cannot be resolved
    /// - [`Error::NativeFactoryError`] if the export returns a non-zero status
    /// - [`Error::NullObject`] if it succeeds without producing an object
    pub fn create_instance(&self, clsid: &GUID, iid: &GUID) -> Result<IUnknown> {
        tracing::debug!(?clsid, ?iid, "creating instance");

        if !guids::is_supported_class(clsid) {
            return Err(Error::UnsupportedClass(*clsid));
        }

        let entry_point = self
            .loader
            .resolve(&self.config.library, &self.config.entry_point)?;

        let mut object: *mut c_void = std::ptr::null_mut();
        let call = unsafe {
            invoke(
                entry_point,
                [
                    clsid as *const GUID as usize,
                    iid as *const GUID as usize,
                    &mut object as *mut *mut c_void as usize,
                ],
            )
        };

        let code = call.status();
        if !code.is_success() {
            tracing::warn!(
                entry_point = %self.config.entry_point,
                %code,
                "native factory failed"
            );
            return Err(Error::NativeFactoryError { code });
        }

        let unknown = unsafe { IUnknown::from_raw(object) }.ok_or(Error::NullObject {
            interface: "IUnknown",
            method: "CLRCreateInstance",
        })?;
        tracing::debug!(object = ?unknown, "instance created");
        Ok(unknown)
    }

    /// Creates the object of class `clsid` as interface `T`.
    ///
    /// # Errors
    /// Same as [`create_instance`](Self::create_instance).
    pub fn create<T: Interface>(&self, clsid: &GUID) -> Result<T> {
        let unknown = self.create_instance(clsid, &T::IID)?;
        Ok(unsafe { T::from_unknown(unknown) })
    }

    /// Creates the metahost.
    pub fn meta_host(&self) -> Result<ICLRMetaHost> {
        self.create(&CLSID_CLR_META_HOST)
    }
}

/// Calls `mscoree.dll!CLRCreateInstance` with the system loader.
///
/// # Errors
/// Same as [`ClrFactory::create_instance`].
pub fn clr_create_instance(clsid: &GUID, iid: &GUID) -> Result<IUnknown> {
    ClrFactory::new().create_instance(clsid, iid)
}

/// Creates the metahost with the system loader.
///
/// # Examples
/// ```no_run
/// let host = clrhost::meta_host()?;
/// let runtime = host.get_runtime("v4.0.30319")?;
/// assert!(runtime.is_loadable()?);
/// # Ok::<(), clrhost::Error>(())
/// ```
pub fn meta_host() -> Result<ICLRMetaHost> {
    ClrFactory::new().meta_host()
}
