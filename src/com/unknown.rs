//! Provides the owning [`IUnknown`] pointer and the [`Interface`] trait.
//!
//! `IUnknown` holds exactly one native reference. Cloning calls `AddRef`,
//! dropping calls `Release`, and [`IUnknown::release`] consumes the pointer so
//! a released object cannot be called again without going through `unsafe`.
//!
//! ```compile_fail
//! use clrhost::com::IUnknown;
//! use clrhost::guids::IID_IUNKNOWN;
//!
//! fn use_after_release(object: IUnknown) {
//!     object.release();
//!     let _ = object.query(&IID_IUNKNOWN);
//! }
//! ```

use std::ffi::c_void;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

use windows_core::{GUID, HRESULT};

use crate::com::ffi::RawCall;
use crate::com::handle::ObjectHandle;
use crate::error::{Error, Result, StatusCode};
use crate::guids::IID_IUNKNOWN;

/// The three slots every COM vtable starts with.
#[repr(C)]
#[allow(non_snake_case)]
pub struct IUnknownVtbl {
    pub QueryInterface:
        unsafe extern "system" fn(this: *mut c_void, riid: *const GUID, ppv: *mut *mut c_void) -> HRESULT,
    pub AddRef: unsafe extern "system" fn(this: *mut c_void) -> u32,
    pub Release: unsafe extern "system" fn(this: *mut c_void) -> u32,
}

pub(crate) const QUERY_INTERFACE_SLOT: usize = vtable_slot!(IUnknownVtbl, QueryInterface);
pub(crate) const ADD_REF_SLOT: usize = vtable_slot!(IUnknownVtbl, AddRef);
pub(crate) const RELEASE_SLOT: usize = vtable_slot!(IUnknownVtbl, Release);

/// Implemented by every typed interface pointer.
///
/// # Safety
///
/// `Vtbl` must describe the native slot layout of the interface named by
/// `IID`, base slots included, and the implementing type must be a
/// transparent wrapper around [`IUnknown`].
pub unsafe trait Interface: Sized {
    /// The `#[repr(C)]` vtable layout, base slots first.
    type Vtbl;
    /// The interface identifier passed to `QueryInterface` and factories.
    const IID: GUID;
    /// Used in error messages and logs.
    const NAME: &'static str;

    /// Reinterprets an owned pointer as this interface.
    ///
    /// # Safety
    ///
    /// `unknown` must have been obtained as `Self::IID`.
    unsafe fn from_unknown(unknown: IUnknown) -> Self;

    fn as_unknown(&self) -> &IUnknown;

    fn into_unknown(self) -> IUnknown;
}

/// An owned reference to a native COM object.
///
/// Not `Send` or `Sync`: the binding adds no synchronization, and whether a
/// native object tolerates calls from several threads is up to that object.
#[repr(transparent)]
pub struct IUnknown(NonNull<c_void>);

impl IUnknown {
    /// Takes ownership of one reference held by `raw`.
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `raw` must be a live COM interface pointer whose reference the caller
    /// owns and gives up.
    pub unsafe fn from_raw(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    /// Takes ownership of the reference held by `handle`.
    ///
    /// # Safety
    ///
    /// Same as [`from_raw`](Self::from_raw).
    pub unsafe fn from_handle(handle: ObjectHandle) -> Option<Self> {
        Self::from_raw(handle.as_raw())
    }

    /// Returns the raw handle without affecting the reference count.
    pub fn handle(&self) -> ObjectHandle {
        ObjectHandle::from_raw(self.0.as_ptr())
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// Gives up ownership without calling `Release`.
    pub fn into_raw(self) -> *mut c_void {
        ManuallyDrop::new(self).0.as_ptr()
    }

    /// Calls `QueryInterface` for `iid`.
    ///
    /// # Errors
    /// Returns [`Error::NativeMethodError`] with the native status (usually
    /// `E_NOINTERFACE`) if the object does not implement `iid`.
    pub fn query(&self, iid: &GUID) -> Result<IUnknown> {
        let handle = unsafe { self.handle().query_interface(iid) }
            .map_err(|code| method_error("IUnknown", "QueryInterface", code))?;
        unsafe { adopt("IUnknown", "QueryInterface", handle.as_raw()) }
    }

    /// Queries for `T` and wraps the result.
    ///
    /// # Errors
    /// Same as [`query`](Self::query).
    pub fn cast<T: Interface>(&self) -> Result<T> {
        let unknown = self.query(&T::IID)?;
        Ok(unsafe { T::from_unknown(unknown) })
    }

    /// Releases this reference and returns the remaining count.
    ///
    /// The count is informational; zero means the native side freed the
    /// object.
    pub fn release(self) -> u32 {
        let handle = ObjectHandle::from_raw(self.into_raw());
        let count = unsafe { handle.release() };
        tracing::trace!(object = handle.address(), count, "released");
        count
    }

    /// Calls vtable slot `slot` on this object.
    ///
    /// # Safety
    ///
    /// `slot` must exist in the vtable of the interface this pointer was
    /// obtained as, and `args` must match its native signature.
    pub unsafe fn call<const N: usize>(&self, slot: usize, args: [usize; N]) -> RawCall {
        self.handle().call(slot, args)
    }
}

impl Clone for IUnknown {
    fn clone(&self) -> Self {
        unsafe { self.handle().add_ref() };
        Self(self.0)
    }
}

impl Drop for IUnknown {
    fn drop(&mut self) {
        let handle = self.handle();
        let count = unsafe { handle.release() };
        tracing::trace!(object = handle.address(), count, "released on drop");
    }
}

impl PartialEq for IUnknown {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for IUnknown {}

impl fmt::Debug for IUnknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IUnknown({:p})", self.0)
    }
}

unsafe impl Interface for IUnknown {
    type Vtbl = IUnknownVtbl;
    const IID: GUID = IID_IUNKNOWN;
    const NAME: &'static str = "IUnknown";

    unsafe fn from_unknown(unknown: IUnknown) -> Self {
        unknown
    }

    fn as_unknown(&self) -> &IUnknown {
        self
    }

    fn into_unknown(self) -> IUnknown {
        self
    }
}

/// Maps a non-zero status from `interface::method` to an error.
pub(crate) fn method_error(interface: &'static str, method: &'static str, code: StatusCode) -> Error {
    Error::NativeMethodError {
        interface,
        method,
        code,
    }
}

/// Checks the status word of a completed method call.
pub(crate) fn check(interface: &'static str, method: &'static str, call: RawCall) -> Result<()> {
    call.status()
        .ok()
        .map_err(|code| method_error(interface, method, code))
}

/// Takes ownership of an out-handle written by a successful call.
///
/// # Safety
///
/// `raw` must be null or a live interface pointer whose reference the call
/// transferred to the caller.
pub(crate) unsafe fn adopt(interface: &'static str, method: &'static str, raw: *mut c_void) -> Result<IUnknown> {
    IUnknown::from_raw(raw).ok_or(Error::NullObject { interface, method })
}
