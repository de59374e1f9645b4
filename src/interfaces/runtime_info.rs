//! Implements the `ICLRRuntimeInfo` binding for a single installed runtime version.

use std::ffi::c_void;

use windows_core::{GUID, HRESULT};

use crate::com::helpers::read_wide_string;
use crate::com::unknown::{adopt, check, method_error};
use crate::com::{IUnknown, Interface};
use crate::error::Result;
use crate::guids::IID_ICLR_RUNTIME_INFO;

define_vtable! {
    /// Slot layout of `ICLRRuntimeInfo` (`metahost.h`).
    pub struct ICLRRuntimeInfoVtbl {
        GetVersionString: unsafe extern "system" fn(
            this: *mut c_void, buffer: *mut u16, buffer_len: *mut u32
        ) -> HRESULT,
        GetRuntimeDirectory: unsafe extern "system" fn(
            this: *mut c_void, buffer: *mut u16, buffer_len: *mut u32
        ) -> HRESULT,
        IsLoaded: unsafe extern "system" fn(
            this: *mut c_void, process: *mut c_void, loaded: *mut i32
        ) -> HRESULT,
        LoadErrorString: unsafe extern "system" fn(
            this: *mut c_void, resource_id: u32, buffer: *mut u16, buffer_len: *mut u32, locale_id: i32
        ) -> HRESULT,
        LoadLibrary: unsafe extern "system" fn(
            this: *mut c_void, dll_name: *const u16, module: *mut *mut c_void
        ) -> HRESULT,
        GetProcAddress: unsafe extern "system" fn(
            this: *mut c_void, proc_name: *const u8, proc: *mut *mut c_void
        ) -> HRESULT,
        GetInterface: unsafe extern "system" fn(
            this: *mut c_void, rclsid: *const GUID, riid: *const GUID, unknown: *mut *mut c_void
        ) -> HRESULT,
        IsLoadable: unsafe extern "system" fn(this: *mut c_void, loadable: *mut i32) -> HRESULT,
        SetDefaultStartupFlags: unsafe extern "system" fn(
            this: *mut c_void, startup_flags: u32, host_config_file: *const u16
        ) -> HRESULT,
        GetDefaultStartupFlags: unsafe extern "system" fn(
            this: *mut c_void, startup_flags: *mut u32, host_config_file: *mut u16, buffer_len: *mut u32
        ) -> HRESULT,
        BindAsLegacyV2Runtime: unsafe extern "system" fn(this: *mut c_void) -> HRESULT,
        IsStarted: unsafe extern "system" fn(
            this: *mut c_void, started: *mut i32, startup_flags: *mut u32
        ) -> HRESULT,
    }
}

const GET_VERSION_STRING: usize = vtable_slot!(ICLRRuntimeInfoVtbl, GetVersionString);
const GET_RUNTIME_DIRECTORY: usize = vtable_slot!(ICLRRuntimeInfoVtbl, GetRuntimeDirectory);
const IS_LOADED: usize = vtable_slot!(ICLRRuntimeInfoVtbl, IsLoaded);
const GET_INTERFACE: usize = vtable_slot!(ICLRRuntimeInfoVtbl, GetInterface);
const IS_LOADABLE: usize = vtable_slot!(ICLRRuntimeInfoVtbl, IsLoadable);
const BIND_AS_LEGACY_V2_RUNTIME: usize = vtable_slot!(ICLRRuntimeInfoVtbl, BindAsLegacyV2Runtime);
const IS_STARTED: usize = vtable_slot!(ICLRRuntimeInfoVtbl, IsStarted);

com_interface! {
    /// An owned `ICLRRuntimeInfo` pointer.
    pub struct ICLRRuntimeInfo: ICLRRuntimeInfoVtbl = IID_ICLR_RUNTIME_INFO;
}

/// Whether a runtime has been started, and with which flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupState {
    pub started: bool,
    /// `STARTUP_FLAGS` the runtime was started with; zero if not started.
    pub startup_flags: u32,
}

impl ICLRRuntimeInfo {
    /// Returns the version string, e.g. `"v4.0.30319"`.
    pub fn version_string(&self) -> Result<String> {
        self.read_string(GET_VERSION_STRING, "GetVersionString")
    }

    /// Returns the directory the runtime is installed in.
    pub fn runtime_directory(&self) -> Result<String> {
        self.read_string(GET_RUNTIME_DIRECTORY, "GetRuntimeDirectory")
    }

    /// Returns whether this runtime is loaded in `process`.
    pub fn is_loaded(&self, process: *mut c_void) -> Result<bool> {
        let mut loaded: i32 = 0;
        let call = unsafe {
            self.call(
                IS_LOADED,
                [process as usize, &mut loaded as *mut i32 as usize],
            )
        };
        check(Self::NAME, "IsLoaded", call)?;
        Ok(loaded != 0)
    }

    /// Returns whether this runtime can be loaded into the current process.
    pub fn is_loadable(&self) -> Result<bool> {
        let mut loadable: i32 = 0;
        let call = unsafe { self.call(IS_LOADABLE, [&mut loadable as *mut i32 as usize]) };
        check(Self::NAME, "IsLoadable", call)?;
        Ok(loadable != 0)
    }

    /// Loads the runtime (if needed) and returns the object of class `clsid`
    /// as interface `iid`, e.g. `CLSID_CLR_RUNTIME_HOST` /
    /// `IID_ICLR_RUNTIME_HOST`.
    pub fn get_interface(&self, clsid: &GUID, iid: &GUID) -> Result<IUnknown> {
        let mut unknown: *mut c_void = std::ptr::null_mut();
        let call = unsafe {
            self.call(
                GET_INTERFACE,
                [
                    clsid as *const GUID as usize,
                    iid as *const GUID as usize,
                    &mut unknown as *mut *mut c_void as usize,
                ],
            )
        };
        check(Self::NAME, "GetInterface", call)?;
        unsafe { adopt(Self::NAME, "GetInterface", unknown) }
    }

    /// Typed form of [`get_interface`](Self::get_interface).
    pub fn get_interface_as<T: Interface>(&self, clsid: &GUID) -> Result<T> {
        let unknown = self.get_interface(clsid, &T::IID)?;
        Ok(unsafe { T::from_unknown(unknown) })
    }

    /// Binds this runtime for all legacy v2 activation in the process.
    pub fn bind_as_legacy_v2_runtime(&self) -> Result<()> {
        let call = unsafe { self.call(BIND_AS_LEGACY_V2_RUNTIME, []) };
        check(Self::NAME, "BindAsLegacyV2Runtime", call)
    }

    pub fn is_started(&self) -> Result<StartupState> {
        let mut started: i32 = 0;
        let mut startup_flags: u32 = 0;
        let call = unsafe {
            self.call(
                IS_STARTED,
                [
                    &mut started as *mut i32 as usize,
                    &mut startup_flags as *mut u32 as usize,
                ],
            )
        };
        check(Self::NAME, "IsStarted", call)?;
        Ok(StartupState {
            started: started != 0,
            startup_flags,
        })
    }

    fn read_string(&self, slot: usize, method: &'static str) -> Result<String> {
        read_wide_string(|buffer, len| {
            let call = unsafe { self.call(slot, [buffer as usize, len as usize]) };
            call.status()
        })
        .map_err(|code| method_error(Self::NAME, method, code))
    }
}
