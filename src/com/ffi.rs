//! Provides the raw foreign-call primitive and vtable reads.
//!
//! Everything in the crate that interprets an untyped native address goes
//! through this module. Callers above this layer deal in
//! [`ObjectHandle`](super::ObjectHandle) and typed interface wrappers.
//!
//! # Examples
//! ```
//! use clrhost::com::ffi::{invoke, RawAddress};
//!
//! type Add = unsafe extern "system" fn(usize, usize) -> usize;
//!
//! unsafe extern "system" fn add(a: usize, b: usize) -> usize {
//!     a + b
//! }
//!
//! let f = add as Add as RawAddress;
//! let call = unsafe { invoke(f, [2, 3]) };
//! assert_eq!(call.value, 5);
//! ```

use std::ffi::c_void;

use crate::error::StatusCode;

/// An untyped machine-word address (function entry point or object).
pub type RawAddress = usize;

/// Maximum number of word arguments [`invoke`] forwards.
pub const MAX_ARGS: usize = 6;

/// The registers a foreign call hands back.
///
/// `aux` mirrors the two secondary result words of the generic call primitive.
/// Nothing in the hosting protocol reads them and the typed call used here does
/// not observe them, so they are always zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawCall {
    /// The primary result register.
    pub value: usize,
    /// Secondary result words, always zero.
    pub aux: [usize; 2],
}

impl RawCall {
    /// Interprets the result as a 32-bit `HRESULT`.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_word(self.value)
    }

    /// Interprets the result as a `ULONG` reference count.
    pub fn count(&self) -> u32 {
        self.value as u32
    }
}

type Fn0 = unsafe extern "system" fn() -> usize;
type Fn1 = unsafe extern "system" fn(usize) -> usize;
type Fn2 = unsafe extern "system" fn(usize, usize) -> usize;
type Fn3 = unsafe extern "system" fn(usize, usize, usize) -> usize;
type Fn4 = unsafe extern "system" fn(usize, usize, usize, usize) -> usize;
type Fn5 = unsafe extern "system" fn(usize, usize, usize, usize, usize) -> usize;
type Fn6 = unsafe extern "system" fn(usize, usize, usize, usize, usize, usize) -> usize;

/// Calls `function` with `args` in the platform's `extern "system"` convention.
///
/// Pointers and small integers are widened to a word by the caller. Callees
/// that return 32-bit values only define the low half of the result; use
/// [`RawCall::status`] or [`RawCall::count`] to read them.
///
/// More than [`MAX_ARGS`] arguments is rejected at compile time.
///
/// # Safety
///
/// `function` must be the non-null address of a function that takes exactly
/// `N` word-sized (or narrower integer/pointer) arguments in the
/// `extern "system"` convention, and every argument must satisfy that
/// function's own contract. A mismatch corrupts the caller's stack or
/// registers; it cannot be detected here.
pub unsafe fn invoke<const N: usize>(function: RawAddress, args: [usize; N]) -> RawCall {
    const { assert!(N <= MAX_ARGS, "too many arguments for a native call") };
    invoke_words(function, &args)
}

/// Slice form of [`invoke`] for callers that assemble the argument list
/// themselves. `args.len()` must not exceed [`MAX_ARGS`].
pub(crate) unsafe fn invoke_words(function: RawAddress, args: &[usize]) -> RawCall {
    let value = match args {
        &[] => std::mem::transmute::<RawAddress, Fn0>(function)(),
        &[a0] => std::mem::transmute::<RawAddress, Fn1>(function)(a0),
        &[a0, a1] => std::mem::transmute::<RawAddress, Fn2>(function)(a0, a1),
        &[a0, a1, a2] => std::mem::transmute::<RawAddress, Fn3>(function)(a0, a1, a2),
        &[a0, a1, a2, a3] => std::mem::transmute::<RawAddress, Fn4>(function)(a0, a1, a2, a3),
        &[a0, a1, a2, a3, a4] => {
            std::mem::transmute::<RawAddress, Fn5>(function)(a0, a1, a2, a3, a4)
        }
        &[a0, a1, a2, a3, a4, a5] => {
            std::mem::transmute::<RawAddress, Fn6>(function)(a0, a1, a2, a3, a4, a5)
        }
        _ => unreachable!("at most {MAX_ARGS} arguments, got {}", args.len()),
    };

    RawCall { value, aux: [0, 0] }
}

/// Reads entry `index` of the vtable `object` points at.
///
/// # Safety
///
/// `object` must point at a live COM object whose vtable has more than
/// `index` entries for the interface the pointer was obtained as.
pub unsafe fn read_slot(object: *mut c_void, index: usize) -> RawAddress {
    let vtbl = *(object as *const *const RawAddress);
    *vtbl.add(index)
}
