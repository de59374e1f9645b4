//! Provides [`ObjectHandle`], the raw non-owning view of a COM object.
//!
//! An object handle is the address of a vtable pointer. It carries no type and
//! no ownership; every method that touches the native object is `unsafe` and
//! documents the slot layout it assumes. Owned, reference-counted access goes
//! through [`IUnknown`](super::IUnknown) instead.
//!
//! Layout assumed for every handle:
//! ```text
//! handle -> +0: vtbl pointer -> [QueryInterface, AddRef, Release, ...]
//!           +8: instance data (opaque)
//! ```

use std::ffi::c_void;
use std::fmt;

use windows_core::GUID;

use crate::com::ffi::{self, RawAddress, RawCall, MAX_ARGS};
use crate::com::unknown::{ADD_REF_SLOT, QUERY_INTERFACE_SLOT, RELEASE_SLOT};
use crate::error::StatusCode;

/// An untyped, non-owning reference to a native COM object.
///
/// # Examples
/// ```
/// use clrhost::com::ObjectHandle;
///
/// let handle = ObjectHandle::from_address(0x1000);
/// assert_eq!(handle.address(), 0x1000);
/// assert!(!handle.is_null());
/// assert!(ObjectHandle::null().is_null());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjectHandle(*mut c_void);

impl ObjectHandle {
    /// Wraps `raw` without validation.
    pub const fn from_raw(raw: *mut c_void) -> Self {
        Self(raw)
    }

    /// Wraps a word-sized address without validation.
    pub fn from_address(address: RawAddress) -> Self {
        Self(address as *mut c_void)
    }

    /// The null handle, as written into out-parameters before a call.
    pub const fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    pub const fn as_raw(self) -> *mut c_void {
        self.0
    }

    pub fn address(self) -> RawAddress {
        self.0 as RawAddress
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }

    /// Reads vtable entry `index`.
    ///
    /// # Safety
    ///
    /// The handle must be live (acquired and not yet released) and must have
    /// been obtained as an interface whose vtable has more than `index` slots.
    pub unsafe fn vtable_slot(self, index: usize) -> RawAddress {
        ffi::read_slot(self.0, index)
    }

    /// Calls vtable slot `slot` with `self` as the implicit first argument.
    ///
    /// At most `MAX_ARGS - 1` explicit arguments fit; more is rejected at
    /// compile time.
    ///
    /// # Safety
    ///
    /// Same as [`vtable_slot`](Self::vtable_slot), and `args` must match the
    /// slot's native signature in count, width and meaning.
    pub unsafe fn call<const N: usize>(self, slot: usize, args: [usize; N]) -> RawCall {
        const { assert!(N < MAX_ARGS, "too many arguments for a vtable call") };

        let mut words = [0usize; MAX_ARGS];
        words[0] = self.address();
        words[1..=N].copy_from_slice(&args);

        let function = self.vtable_slot(slot);
        tracing::trace!(object = self.address(), slot, argc = N, "vtable call");
        ffi::invoke_words(function, &words[..=N])
    }

    /// Calls `QueryInterface` (slot 0).
    ///
    /// On success the returned handle holds a new reference the caller must
    /// release.
    ///
    /// # Safety
    ///
    /// The handle must be live.
    pub unsafe fn query_interface(self, iid: &GUID) -> Result<ObjectHandle, StatusCode> {
        let mut out: *mut c_void = std::ptr::null_mut();
        let call = self.call(
            QUERY_INTERFACE_SLOT,
            [
                iid as *const GUID as usize,
                &mut out as *mut *mut c_void as usize,
            ],
        );
        call.status().ok()?;
        Ok(ObjectHandle(out))
    }

    /// Calls `AddRef` (slot 1) and returns the new count.
    ///
    /// The count is informational only.
    ///
    /// # Safety
    ///
    /// The handle must be live.
    pub unsafe fn add_ref(self) -> u32 {
        self.call(ADD_REF_SLOT, []).count()
    }

    /// Calls `Release` (slot 2) and returns the remaining count.
    ///
    /// # Safety
    ///
    /// The handle must be live. Once the count reaches zero the object may be
    /// freed and the handle must not be used again.
    pub unsafe fn release(self) -> u32 {
        self.call(RELEASE_SLOT, []).count()
    }
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHandle({:p})", self.0)
    }
}
