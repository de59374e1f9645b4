//! Implements the `ICLRMetaHost` binding, the object `CLRCreateInstance` hands out.
//!
//! The metahost is the entry point of the v4 hosting API: it enumerates the
//! runtimes installed on the machine or loaded in a process, and returns an
//! [`ICLRRuntimeInfo`] for a specific version.
//!
//! # Examples
//! ```no_run
//! use clrhost::guids::CLSID_CLR_META_HOST;
//! use clrhost::{ClrFactory, ICLRMetaHost};
//!
//! let host: ICLRMetaHost = ClrFactory::new().create(&CLSID_CLR_META_HOST)?;
//! for runtime in host.installed_runtimes()? {
//!     println!("{}", runtime?.version_string()?);
//! }
//! # Ok::<(), clrhost::Error>(())
//! ```

use std::ffi::c_void;
use std::path::Path;

use windows_core::{GUID, HRESULT};

use crate::com::helpers::{read_wide_string, to_wide};
use crate::com::unknown::{adopt, check, method_error};
use crate::com::{IUnknown, Interface};
use crate::error::Result;
use crate::guids::IID_ICLR_META_HOST;
use crate::interfaces::enum_unknown::{IEnumUnknown, Runtimes};
use crate::interfaces::runtime_info::ICLRRuntimeInfo;

/// Called by the CLR on the thread that loaded a runtime, to mark (or unmark)
/// that thread as the notification thread.
pub type CallbackThreadFn = unsafe extern "system" fn() -> HRESULT;

/// Receives runtime-loaded notifications registered with
/// [`ICLRMetaHost::request_runtime_loaded_notification`].
///
/// The first argument is a borrowed `ICLRRuntimeInfo` pointer.
pub type RuntimeLoadedCallback =
    unsafe extern "system" fn(runtime_info: *mut c_void, thread_set: CallbackThreadFn, thread_unset: CallbackThreadFn);

define_vtable! {
    /// Slot layout of `ICLRMetaHost` (`metahost.h`).
    pub struct ICLRMetaHostVtbl {
        GetRuntime: unsafe extern "system" fn(
            this: *mut c_void, version: *const u16, riid: *const GUID, runtime: *mut *mut c_void
        ) -> HRESULT,
        GetVersionFromFile: unsafe extern "system" fn(
            this: *mut c_void, file_path: *const u16, buffer: *mut u16, buffer_len: *mut u32
        ) -> HRESULT,
        EnumerateInstalledRuntimes: unsafe extern "system" fn(
            this: *mut c_void, enumerator: *mut *mut c_void
        ) -> HRESULT,
        EnumerateLoadedRuntimes: unsafe extern "system" fn(
            this: *mut c_void, process: *mut c_void, enumerator: *mut *mut c_void
        ) -> HRESULT,
        RequestRuntimeLoadedNotification: unsafe extern "system" fn(
            this: *mut c_void, callback: RuntimeLoadedCallback
        ) -> HRESULT,
        QueryLegacyV2RuntimeBinding: unsafe extern "system" fn(
            this: *mut c_void, riid: *const GUID, unknown: *mut *mut c_void
        ) -> HRESULT,
        ExitProcess: unsafe extern "system" fn(this: *mut c_void, exit_code: i32) -> HRESULT,
    }
}

const GET_RUNTIME: usize = vtable_slot!(ICLRMetaHostVtbl, GetRuntime);
const GET_VERSION_FROM_FILE: usize = vtable_slot!(ICLRMetaHostVtbl, GetVersionFromFile);
const ENUMERATE_INSTALLED_RUNTIMES: usize = vtable_slot!(ICLRMetaHostVtbl, EnumerateInstalledRuntimes);
const ENUMERATE_LOADED_RUNTIMES: usize = vtable_slot!(ICLRMetaHostVtbl, EnumerateLoadedRuntimes);
const REQUEST_RUNTIME_LOADED_NOTIFICATION: usize =
    vtable_slot!(ICLRMetaHostVtbl, RequestRuntimeLoadedNotification);
const QUERY_LEGACY_V2_RUNTIME_BINDING: usize = vtable_slot!(ICLRMetaHostVtbl, QueryLegacyV2RuntimeBinding);
const EXIT_PROCESS: usize = vtable_slot!(ICLRMetaHostVtbl, ExitProcess);

com_interface! {
    /// An owned `ICLRMetaHost` pointer.
    pub struct ICLRMetaHost: ICLRMetaHostVtbl = IID_ICLR_META_HOST;
}

impl ICLRMetaHost {
    /// Returns the runtime with the given version string (e.g. `"v4.0.30319"`).
    ///
    /// # Errors
    /// [`Error::NativeMethodError`](crate::Error::NativeMethodError) if the
    /// version is not installed or the call fails.
    pub fn get_runtime(&self, version: &str) -> Result<ICLRRuntimeInfo> {
        let unknown = self.get_runtime_as(version, &ICLRRuntimeInfo::IID)?;
        Ok(unsafe { ICLRRuntimeInfo::from_unknown(unknown) })
    }

    /// Calls `GetRuntime` with a caller-chosen interface ID.
    ///
    /// The ID is forwarded verbatim; the metahost itself decides whether it is
    /// acceptable. The returned pointer is typed as `iid`.
    ///
    /// # Errors
    /// [`Error::NativeMethodError`](crate::Error::NativeMethodError) with the
    /// native status. No object is returned or released in that case.
    pub fn get_runtime_as(&self, version: &str, iid: &GUID) -> Result<IUnknown> {
        let version = to_wide(version);
        let mut runtime: *mut c_void = std::ptr::null_mut();
        let call = unsafe {
            self.call(
                GET_RUNTIME,
                [
                    version.as_ptr() as usize,
                    iid as *const GUID as usize,
                    &mut runtime as *mut *mut c_void as usize,
                ],
            )
        };
        check(Self::NAME, "GetRuntime", call)?;
        unsafe { adopt(Self::NAME, "GetRuntime", runtime) }
    }

    /// Returns the runtime version an assembly was built against.
    pub fn get_version_from_file(&self, path: &Path) -> Result<String> {
        let path = to_wide(&path.to_string_lossy());
        read_wide_string(|buffer, len| {
            let call = unsafe {
                self.call(
                    GET_VERSION_FROM_FILE,
                    [path.as_ptr() as usize, buffer as usize, len as usize],
                )
            };
            call.status()
        })
        .map_err(|code| method_error(Self::NAME, "GetVersionFromFile", code))
    }

    /// Returns an enumerator over the runtimes installed on this machine.
    pub fn enumerate_installed_runtimes(&self) -> Result<IEnumUnknown> {
        let mut enumerator: *mut c_void = std::ptr::null_mut();
        let call = unsafe {
            self.call(
                ENUMERATE_INSTALLED_RUNTIMES,
                [&mut enumerator as *mut *mut c_void as usize],
            )
        };
        check(Self::NAME, "EnumerateInstalledRuntimes", call)?;
        let unknown = unsafe { adopt(Self::NAME, "EnumerateInstalledRuntimes", enumerator)? };
        Ok(unsafe { IEnumUnknown::from_unknown(unknown) })
    }

    /// Iterates the installed runtimes as [`ICLRRuntimeInfo`] pointers.
    pub fn installed_runtimes(&self) -> Result<Runtimes> {
        Ok(Runtimes::new(self.enumerate_installed_runtimes()?))
    }

    /// Returns an enumerator over the runtimes loaded in `process`.
    ///
    /// `process` is a Win32 process handle with `PROCESS_QUERY_INFORMATION`
    /// access; the metahost validates it.
    pub fn enumerate_loaded_runtimes(&self, process: *mut c_void) -> Result<IEnumUnknown> {
        let mut enumerator: *mut c_void = std::ptr::null_mut();
        let call = unsafe {
            self.call(
                ENUMERATE_LOADED_RUNTIMES,
                [process as usize, &mut enumerator as *mut *mut c_void as usize],
            )
        };
        check(Self::NAME, "EnumerateLoadedRuntimes", call)?;
        let unknown = unsafe { adopt(Self::NAME, "EnumerateLoadedRuntimes", enumerator)? };
        Ok(unsafe { IEnumUnknown::from_unknown(unknown) })
    }

    /// Iterates the runtimes loaded in `process`.
    pub fn loaded_runtimes(&self, process: *mut c_void) -> Result<Runtimes> {
        Ok(Runtimes::new(self.enumerate_loaded_runtimes(process)?))
    }

    /// Registers `callback` to run whenever a runtime is first loaded.
    ///
    /// # Safety
    ///
    /// `callback` is called from native code on arbitrary threads for the rest
    /// of the process lifetime. It must not unwind.
    pub unsafe fn request_runtime_loaded_notification(&self, callback: RuntimeLoadedCallback) -> Result<()> {
        let call = self.call(REQUEST_RUNTIME_LOADED_NOTIFICATION, [callback as usize]);
        check(Self::NAME, "RequestRuntimeLoadedNotification", call)
    }

    /// Returns the interface `iid` of the runtime that legacy v2 activation is
    /// bound to.
    pub fn query_legacy_v2_runtime_binding(&self, iid: &GUID) -> Result<IUnknown> {
        let mut unknown: *mut c_void = std::ptr::null_mut();
        let call = unsafe {
            self.call(
                QUERY_LEGACY_V2_RUNTIME_BINDING,
                [
                    iid as *const GUID as usize,
                    &mut unknown as *mut *mut c_void as usize,
                ],
            )
        };
        check(Self::NAME, "QueryLegacyV2RuntimeBinding", call)?;
        unsafe { adopt(Self::NAME, "QueryLegacyV2RuntimeBinding", unknown) }
    }

    /// Asks the CLR to shut down all loaded runtimes and exit the process.
    ///
    /// Only returns if the request fails.
    pub fn exit_process(&self, exit_code: i32) -> Result<()> {
        tracing::debug!(exit_code, "ICLRMetaHost::ExitProcess");
        let call = unsafe { self.call(EXIT_PROCESS, [exit_code as u32 as usize]) };
        check(Self::NAME, "ExitProcess", call)
    }
}
