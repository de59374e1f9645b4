//! Provides the typed interface bindings for the CLR hosting API.
//!
//! Each binding declares its vtable with [`define_vtable!`](crate::define_vtable)
//! and its owning pointer type with [`com_interface!`](crate::com_interface),
//! then wraps the slots it needs.
//!
//! # Examples
//! ```
//! use clrhost::com::Interface;
//! use clrhost::interfaces::{ICLRMetaHost, ICLRRuntimeInfo, IEnumUnknown};
//!
//! assert_eq!(ICLRMetaHost::NAME, "ICLRMetaHost");
//! assert_ne!(ICLRRuntimeInfo::IID, IEnumUnknown::IID);
//! ```

pub mod enum_unknown;
pub mod metahost;
pub mod runtime_info;

pub use enum_unknown::{IEnumUnknown, IEnumUnknownVtbl, Runtimes};
pub use metahost::{CallbackThreadFn, ICLRMetaHost, ICLRMetaHostVtbl, RuntimeLoadedCallback};
pub use runtime_info::{ICLRRuntimeInfo, ICLRRuntimeInfoVtbl, StartupState};
