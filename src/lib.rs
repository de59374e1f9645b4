//! Provides vtable-level bindings for the CLR hosting COM server (`mscoree.dll`).
//!
//! The crate resolves `CLRCreateInstance` at run time, creates the metahost,
//! and drives it and the objects it hands out purely through their virtual
//! tables. No import library, IDL compiler or COM runtime initialization is
//! involved.
//!
//! Layers, bottom up:
//! - [`com::ffi`] performs the raw `extern "system"` calls and vtable reads
//! - [`com::ObjectHandle`] is an untyped object address
//! - [`com::IUnknown`] owns one native reference and releases it on drop
//! - [`interfaces`] wraps individual vtable slots with typed methods
//! - [`ClrFactory`] validates the class ID and calls the native factory
//!
//! # Examples
//! ```no_run
//! use clrhost::guids::CLSID_CLR_META_HOST;
//! use clrhost::{ClrFactory, ICLRMetaHost};
//!
//! let host: ICLRMetaHost = ClrFactory::new().create(&CLSID_CLR_META_HOST)?;
//! let runtime = host.get_runtime("v4.0.30319")?;
//! println!("{}", runtime.runtime_directory()?);
//! # Ok::<(), clrhost::Error>(())
//! ```
//!
//! # Threading
//! Interface pointers are neither `Send` nor `Sync`. The binding adds no
//! locking of its own; sharing a pointer across threads is only sound if the
//! native object allows it, and callers must supply their own synchronization.

// COM abstraction layer - must be declared first for macro availability
#[macro_use]
pub mod com;

pub mod config;
pub mod error;
pub mod factory;
pub mod guids;
pub mod interfaces;

pub use windows_core::{GUID, HRESULT};

pub use config::FactoryConfig;
pub use error::{Error, Result, StatusCode};
pub use factory::{clr_create_instance, meta_host, ClrFactory};
pub use interfaces::{ICLRMetaHost, ICLRRuntimeInfo, IEnumUnknown, Runtimes};
