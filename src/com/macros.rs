//! Provides macros for declaring COM interface bindings.
//!
//! - [`define_vtable!`] declares a `#[repr(C)]` vtable layout with the
//!   `IUnknown` slots first.
//! - [`vtable_slot!`] turns a vtable field into its slot index.
//! - [`com_interface!`] declares the owning wrapper type for an interface.
//!
//! The vtable struct is the only place slot order is written down; wrappers
//! look their slots up with `vtable_slot!` instead of hard-coding indices.
//!
//! # Examples
//! ```
//! use std::ffi::c_void;
//!
//! use clrhost::{com_interface, define_vtable, vtable_slot, GUID, HRESULT};
//!
//! define_vtable! {
//!     pub struct IExampleVtbl {
//!         First: unsafe extern "system" fn(*mut c_void) -> HRESULT,
//!         Second: unsafe extern "system" fn(*mut c_void, u32) -> HRESULT,
//!     }
//! }
//!
//! com_interface! {
//!     pub struct IExample: IExampleVtbl = GUID::from_u128(0x1234);
//! }
//!
//! assert_eq!(vtable_slot!(IExampleVtbl, First), 3);
//! assert_eq!(vtable_slot!(IExampleVtbl, Second), 4);
//! ```

/// Returns the slot index of `method` in `vtbl`.
///
/// Usable in `const` items.
#[macro_export]
macro_rules! vtable_slot {
    ($vtbl:ty, $method:ident) => {
        ::core::mem::offset_of!($vtbl, $method) / ::core::mem::size_of::<usize>()
    };
}

/// Defines a COM vtable structure with the `IUnknown` base slots.
///
/// # Examples
///
/// ```ignore
/// define_vtable! {
///     pub struct ICLRMetaHostVtbl {
///         GetRuntime: unsafe extern "system" fn(
///             *mut c_void, *const u16, *const GUID, *mut *mut c_void
///         ) -> HRESULT,
///     }
/// }
/// ```
#[macro_export]
macro_rules! define_vtable {
    (
        $(#[$meta:meta])*
        $vis:vis struct $vtbl_name:ident {
            $(
                $(#[$method_meta:meta])*
                $method_name:ident : $method_sig:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(C)]
        #[allow(non_snake_case)]
        $vis struct $vtbl_name {
            pub base: $crate::com::IUnknownVtbl,
            $(
                $(#[$method_meta])*
                pub $method_name: $method_sig,
            )*
        }
    };
}

/// Declares an owning wrapper type for a COM interface.
///
/// The generated type is a transparent newtype over
/// [`IUnknown`](crate::com::IUnknown), implements
/// [`Interface`](crate::com::Interface), derefs to `IUnknown`, and releases its
/// reference on drop.
#[macro_export]
macro_rules! com_interface {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $vtbl:ty = $iid:expr;
    ) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Debug, PartialEq, Eq)]
        $vis struct $name($crate::com::IUnknown);

        unsafe impl $crate::com::Interface for $name {
            type Vtbl = $vtbl;
            const IID: $crate::GUID = $iid;
            const NAME: &'static str = stringify!($name);

            unsafe fn from_unknown(unknown: $crate::com::IUnknown) -> Self {
                Self(unknown)
            }

            fn as_unknown(&self) -> &$crate::com::IUnknown {
                &self.0
            }

            fn into_unknown(self) -> $crate::com::IUnknown {
                self.0
            }
        }

        impl $name {
            /// Releases this reference and returns the remaining count.
            pub fn release(self) -> u32 {
                self.0.release()
            }
        }

        impl ::core::ops::Deref for $name {
            type Target = $crate::com::IUnknown;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::core::convert::From<$name> for $crate::com::IUnknown {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Re-export macros at crate root
pub use crate::com_interface;
pub use crate::define_vtable;
pub use crate::vtable_slot;
