//! Provides the COM client layer: raw calls, handles and owned interface pointers.
//!
//! # Overview
//!
//! - [`ffi`] - the foreign-call primitive and vtable reads (all unchecked
//!   memory interpretation lives here)
//! - [`loader::SymbolLoader`] - shared-library export resolution
//! - [`ObjectHandle`] - untyped, non-owning object address
//! - [`IUnknown`] / [`Interface`] - owned, reference-counted interface pointers
//! - [`define_vtable!`], [`com_interface!`], [`vtable_slot!`] - binding macros
//!
//! # Examples
//! ```
//! use clrhost::com::{IUnknownVtbl, ObjectHandle};
//!
//! assert_eq!(clrhost::vtable_slot!(IUnknownVtbl, Release), 2);
//! assert!(ObjectHandle::null().is_null());
//! ```

#[macro_use]
pub mod macros;

pub mod ffi;
pub mod handle;
pub mod helpers;
pub mod loader;
pub mod unknown;

// Re-export commonly used items
pub use handle::ObjectHandle;
pub use loader::{SymbolLoader, SystemLoader};
pub use unknown::{IUnknown, IUnknownVtbl, Interface};
