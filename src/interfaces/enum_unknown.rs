//! Implements the standard `IEnumUnknown` enumerator and an iterator over runtimes.
//!
//! `Next` reports the end of the sequence with `S_FALSE`, which is the one
//! non-zero status this binding treats as success.

use std::ffi::c_void;

use windows_core::HRESULT;

use crate::com::unknown::{adopt, check, method_error};
use crate::com::{IUnknown, Interface};
use crate::error::{Result, StatusCode};
use crate::guids::IID_IENUM_UNKNOWN;
use crate::interfaces::runtime_info::ICLRRuntimeInfo;

define_vtable! {
    /// Slot layout of `IEnumUnknown` (`objidl.h`).
    pub struct IEnumUnknownVtbl {
        Next: unsafe extern "system" fn(
            this: *mut c_void, celt: u32, rgelt: *mut *mut c_void, fetched: *mut u32
        ) -> HRESULT,
        Skip: unsafe extern "system" fn(this: *mut c_void, celt: u32) -> HRESULT,
        Reset: unsafe extern "system" fn(this: *mut c_void) -> HRESULT,
        Clone: unsafe extern "system" fn(this: *mut c_void, enumerator: *mut *mut c_void) -> HRESULT,
    }
}

const NEXT: usize = vtable_slot!(IEnumUnknownVtbl, Next);
const SKIP: usize = vtable_slot!(IEnumUnknownVtbl, Skip);
const RESET: usize = vtable_slot!(IEnumUnknownVtbl, Reset);
const CLONE: usize = vtable_slot!(IEnumUnknownVtbl, Clone);

com_interface! {
    /// An owned `IEnumUnknown` pointer.
    pub struct IEnumUnknown: IEnumUnknownVtbl = IID_IENUM_UNKNOWN;
}

impl IEnumUnknown {
    /// Fetches the next element, or `None` at the end of the sequence.
    pub fn next_object(&self) -> Result<Option<IUnknown>> {
        let mut element: *mut c_void = std::ptr::null_mut();
        let mut fetched: u32 = 0;
        let call = unsafe {
            self.call(
                NEXT,
                [
                    1,
                    &mut element as *mut *mut c_void as usize,
                    &mut fetched as *mut u32 as usize,
                ],
            )
        };

        match call.status() {
            StatusCode::S_OK | StatusCode::S_FALSE if fetched == 0 => Ok(None),
            StatusCode::S_OK | StatusCode::S_FALSE => {
                unsafe { adopt(Self::NAME, "Next", element) }.map(Some)
            }
            code => Err(method_error(Self::NAME, "Next", code)),
        }
    }

    /// Skips `count` elements. Returns `false` if the sequence ended first.
    pub fn skip(&self, count: u32) -> Result<bool> {
        let call = unsafe { self.call(SKIP, [count as usize]) };
        match call.status() {
            StatusCode::S_OK => Ok(true),
            StatusCode::S_FALSE => Ok(false),
            code => Err(method_error(Self::NAME, "Skip", code)),
        }
    }

    /// Rewinds to the start of the sequence.
    pub fn reset(&self) -> Result<()> {
        let call = unsafe { self.call(RESET, []) };
        check(Self::NAME, "Reset", call)
    }

    /// Returns an independent enumerator positioned at the same element.
    ///
    /// Named to avoid clashing with [`Clone::clone`], which only adds a
    /// reference to this enumerator.
    pub fn clone_enum(&self) -> Result<IEnumUnknown> {
        let mut enumerator: *mut c_void = std::ptr::null_mut();
        let call = unsafe { self.call(CLONE, [&mut enumerator as *mut *mut c_void as usize]) };
        check(Self::NAME, "Clone", call)?;
        let unknown = unsafe { adopt(Self::NAME, "Clone", enumerator)? };
        Ok(unsafe { IEnumUnknown::from_unknown(unknown) })
    }
}

/// Iterates an `IEnumUnknown` of runtimes, querying each element for
/// [`ICLRRuntimeInfo`].
///
/// Stops after the first error.
#[derive(Debug)]
pub struct Runtimes {
    inner: IEnumUnknown,
    done: bool,
}

impl Runtimes {
    pub fn new(inner: IEnumUnknown) -> Self {
        Self { inner, done: false }
    }

    /// Returns the underlying enumerator.
    pub fn into_inner(self) -> IEnumUnknown {
        self.inner
    }
}

impl Iterator for Runtimes {
    type Item = Result<ICLRRuntimeInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = match self.inner.next_object() {
            Ok(Some(unknown)) => unknown.cast::<ICLRRuntimeInfo>(),
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };

        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl From<IEnumUnknown> for Runtimes {
    fn from(inner: IEnumUnknown) -> Self {
        Self::new(inner)
    }
}
