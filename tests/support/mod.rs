//! In-process stand-ins for the native CLR objects.
//!
//! Every stub starts with a [`StubHeader`] (vtable pointer, interface ID,
//! reference count), so the shared `IUnknown` slots can serve all of them.
//! Stubs never free themselves: the test owns the allocation, which lets it
//! inspect the count after it reaches zero. Any call made after that is
//! recorded as misuse instead of touching freed memory.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::sync::atomic::{AtomicU32, Ordering};

use clrhost::com::ffi::RawAddress;
use clrhost::com::{IUnknown, IUnknownVtbl, Interface, SymbolLoader};
use clrhost::guids::{IID_ICLR_META_HOST, IID_ICLR_RUNTIME_INFO, IID_IENUM_UNKNOWN, IID_IUNKNOWN};
use clrhost::interfaces::{
    CallbackThreadFn, ICLRMetaHostVtbl, ICLRRuntimeInfoVtbl, IEnumUnknownVtbl, RuntimeLoadedCallback,
};
use clrhost::{Error, FactoryConfig, Result, StatusCode, GUID, HRESULT};

const S_OK: HRESULT = HRESULT(0);
const S_FALSE: HRESULT = HRESULT(1);
const E_FAIL: HRESULT = HRESULT(0x80004005u32 as i32);
const E_NOTIMPL: HRESULT = HRESULT(0x80004001u32 as i32);
const E_NOINTERFACE: HRESULT = HRESULT(0x80004002u32 as i32);
const E_INSUFFICIENT_BUFFER: HRESULT = HRESULT(0x8007007Au32 as i32);

// ---------------------------------------------------------------------------
// Shared header and IUnknown slots
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct StubHeader {
    vtbl: *const c_void,
    iid: GUID,
    refs: AtomicU32,
    misuse: AtomicU32,
}

impl StubHeader {
    fn new<V>(vtbl: &'static V, iid: GUID) -> Self {
        Self {
            vtbl: vtbl as *const V as *const c_void,
            iid,
            refs: AtomicU32::new(1),
            misuse: AtomicU32::new(0),
        }
    }

    /// Current reference count.
    pub fn refs(&self) -> u32 {
        self.refs.load(Ordering::SeqCst)
    }

    /// Number of calls made after the count reached zero.
    pub fn misuse(&self) -> u32 {
        self.misuse.load(Ordering::SeqCst)
    }

    /// Records a call; returns `false` if the object is already dead.
    fn enter(&self) -> bool {
        if self.refs() == 0 {
            self.misuse.fetch_add(1, Ordering::SeqCst);
            false
        } else {
            true
        }
    }
}

unsafe fn header<'a>(this: *mut c_void) -> &'a StubHeader {
    &*(this as *const StubHeader)
}

unsafe fn stub<'a, T>(this: *mut c_void) -> &'a T {
    &*(this as *const T)
}

/// Adds a reference on behalf of a callee handing `object` out.
unsafe fn hand_out(object: *mut c_void) -> *mut c_void {
    if !object.is_null() {
        header(object).refs.fetch_add(1, Ordering::SeqCst);
    }
    object
}

unsafe fn write_wide(text: &str, buffer: *mut u16, len: *mut u32) -> HRESULT {
    let wide: Vec<u16> = text.encode_utf16().chain(Some(0)).collect();
    if buffer.is_null() || (*len as usize) < wide.len() {
        *len = wide.len() as u32;
        return E_INSUFFICIENT_BUFFER;
    }
    std::ptr::copy_nonoverlapping(wide.as_ptr(), buffer, wide.len());
    *len = wide.len() as u32;
    S_OK
}

unsafe fn read_wide(mut text: *const u16) -> String {
    let mut units = Vec::new();
    while *text != 0 {
        units.push(*text);
        text = text.add(1);
    }
    String::from_utf16_lossy(&units)
}

unsafe extern "system" fn query_interface(this: *mut c_void, riid: *const GUID, ppv: *mut *mut c_void) -> HRESULT {
    *ppv = std::ptr::null_mut();
    let header = header(this);
    if !header.enter() {
        return E_FAIL;
    }
    if *riid == header.iid || *riid == IID_IUNKNOWN {
        header.refs.fetch_add(1, Ordering::SeqCst);
        *ppv = this;
        S_OK
    } else {
        E_NOINTERFACE
    }
}

unsafe extern "system" fn add_ref(this: *mut c_void) -> u32 {
    let header = header(this);
    if !header.enter() {
        return 0;
    }
    header.refs.fetch_add(1, Ordering::SeqCst) + 1
}

unsafe extern "system" fn release(this: *mut c_void) -> u32 {
    let header = header(this);
    if !header.enter() {
        return 0;
    }
    header.refs.fetch_sub(1, Ordering::SeqCst) - 1
}

const UNKNOWN_BASE: IUnknownVtbl = IUnknownVtbl {
    QueryInterface: query_interface,
    AddRef: add_ref,
    Release: release,
};

/// Takes ownership of the stub's initial reference as interface `T`.
pub fn adopt<T: Interface>(object: *mut c_void) -> T {
    let unknown = unsafe { IUnknown::from_raw(object) }.expect("stub pointer is never null");
    unsafe { T::from_unknown(unknown) }
}

// ---------------------------------------------------------------------------
// Plain IUnknown
// ---------------------------------------------------------------------------

static UNKNOWN_VTBL: IUnknownVtbl = UNKNOWN_BASE;

#[repr(C)]
pub struct StubUnknown {
    pub header: StubHeader,
}

impl StubUnknown {
    /// Creates an object that answers `QueryInterface` for `iid` and `IUnknown`.
    pub fn new(iid: GUID) -> Box<Self> {
        Box::new(Self {
            header: StubHeader::new(&UNKNOWN_VTBL, iid),
        })
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }
}

// ---------------------------------------------------------------------------
// ICLRRuntimeInfo
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct StubRuntimeInfo {
    pub header: StubHeader,
    pub version: String,
    pub directory: String,
    pub loadable: bool,
    pub started_flags: Option<u32>,
    pub interface: Cell<*mut c_void>,
    pub requested: Cell<Option<(GUID, GUID)>>,
    pub bound_as_legacy: Cell<bool>,
}

impl StubRuntimeInfo {
    pub fn new(version: &str) -> Box<Self> {
        Box::new(Self {
            header: StubHeader::new(&RUNTIME_INFO_VTBL, IID_ICLR_RUNTIME_INFO),
            version: version.to_owned(),
            directory: format!("C:\\Windows\\Microsoft.NET\\Framework64\\{version}\\"),
            loadable: true,
            started_flags: None,
            interface: Cell::new(std::ptr::null_mut()),
            requested: Cell::new(None),
            bound_as_legacy: Cell::new(false),
        })
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }
}

unsafe extern "system" fn runtime_get_version_string(this: *mut c_void, buffer: *mut u16, len: *mut u32) -> HRESULT {
    let stub = stub::<StubRuntimeInfo>(this);
    if !stub.header.enter() {
        return E_FAIL;
    }
    write_wide(&stub.version, buffer, len)
}

unsafe extern "system" fn runtime_get_runtime_directory(
    this: *mut c_void,
    buffer: *mut u16,
    len: *mut u32,
) -> HRESULT {
    let stub = stub::<StubRuntimeInfo>(this);
    if !stub.header.enter() {
        return E_FAIL;
    }
    write_wide(&stub.directory, buffer, len)
}

unsafe extern "system" fn runtime_is_loaded(this: *mut c_void, _process: *mut c_void, loaded: *mut i32) -> HRESULT {
    let stub = stub::<StubRuntimeInfo>(this);
    *loaded = stub.started_flags.is_some() as i32;
    S_OK
}

unsafe extern "system" fn runtime_load_error_string(
    _this: *mut c_void,
    _resource_id: u32,
    _buffer: *mut u16,
    _len: *mut u32,
    _locale_id: i32,
) -> HRESULT {
    E_NOTIMPL
}

unsafe extern "system" fn runtime_load_library(
    _this: *mut c_void,
    _dll_name: *const u16,
    _module: *mut *mut c_void,
) -> HRESULT {
    E_NOTIMPL
}

unsafe extern "system" fn runtime_get_proc_address(
    _this: *mut c_void,
    _proc_name: *const u8,
    _proc: *mut *mut c_void,
) -> HRESULT {
    E_NOTIMPL
}

unsafe extern "system" fn runtime_get_interface(
    this: *mut c_void,
    rclsid: *const GUID,
    riid: *const GUID,
    out: *mut *mut c_void,
) -> HRESULT {
    let stub = stub::<StubRuntimeInfo>(this);
    stub.requested.set(Some((*rclsid, *riid)));
    let interface = stub.interface.get();
    if interface.is_null() {
        *out = std::ptr::null_mut();
        return E_NOINTERFACE;
    }
    *out = hand_out(interface);
    S_OK
}

unsafe extern "system" fn runtime_is_loadable(this: *mut c_void, loadable: *mut i32) -> HRESULT {
    *loadable = stub::<StubRuntimeInfo>(this).loadable as i32;
    S_OK
}

unsafe extern "system" fn runtime_set_default_startup_flags(
    _this: *mut c_void,
    _flags: u32,
    _config: *const u16,
) -> HRESULT {
    E_NOTIMPL
}

unsafe extern "system" fn runtime_get_default_startup_flags(
    _this: *mut c_void,
    _flags: *mut u32,
    _config: *mut u16,
    _len: *mut u32,
) -> HRESULT {
    E_NOTIMPL
}

unsafe extern "system" fn runtime_bind_as_legacy_v2_runtime(this: *mut c_void) -> HRESULT {
    stub::<StubRuntimeInfo>(this).bound_as_legacy.set(true);
    S_OK
}

unsafe extern "system" fn runtime_is_started(this: *mut c_void, started: *mut i32, flags: *mut u32) -> HRESULT {
    let stub = stub::<StubRuntimeInfo>(this);
    *started = stub.started_flags.is_some() as i32;
    *flags = stub.started_flags.unwrap_or(0);
    S_OK
}

static RUNTIME_INFO_VTBL: ICLRRuntimeInfoVtbl = ICLRRuntimeInfoVtbl {
    base: UNKNOWN_BASE,
    GetVersionString: runtime_get_version_string,
    GetRuntimeDirectory: runtime_get_runtime_directory,
    IsLoaded: runtime_is_loaded,
    LoadErrorString: runtime_load_error_string,
    LoadLibrary: runtime_load_library,
    GetProcAddress: runtime_get_proc_address,
    GetInterface: runtime_get_interface,
    IsLoadable: runtime_is_loadable,
    SetDefaultStartupFlags: runtime_set_default_startup_flags,
    GetDefaultStartupFlags: runtime_get_default_startup_flags,
    BindAsLegacyV2Runtime: runtime_bind_as_legacy_v2_runtime,
    IsStarted: runtime_is_started,
};

// ---------------------------------------------------------------------------
// IEnumUnknown
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct StubEnum {
    pub header: StubHeader,
    pub items: Vec<*mut c_void>,
    pub position: Cell<usize>,
    pub fail_next: Cell<Option<HRESULT>>,
}

impl StubEnum {
    pub fn new(items: Vec<*mut c_void>) -> Box<Self> {
        Box::new(Self {
            header: StubHeader::new(&ENUM_VTBL, IID_IENUM_UNKNOWN),
            items,
            position: Cell::new(0),
            fail_next: Cell::new(None),
        })
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }
}

unsafe extern "system" fn enum_next(this: *mut c_void, celt: u32, rgelt: *mut *mut c_void, fetched: *mut u32) -> HRESULT {
    let stub = stub::<StubEnum>(this);
    assert_eq!(celt, 1, "bindings fetch one element at a time");
    *fetched = 0;
    if let Some(hr) = stub.fail_next.get() {
        return hr;
    }
    let position = stub.position.get();
    match stub.items.get(position) {
        Some(&item) => {
            *rgelt = hand_out(item);
            *fetched = 1;
            stub.position.set(position + 1);
            S_OK
        }
        None => S_FALSE,
    }
}

unsafe extern "system" fn enum_skip(this: *mut c_void, celt: u32) -> HRESULT {
    let stub = stub::<StubEnum>(this);
    let target = stub.position.get() + celt as usize;
    if target > stub.items.len() {
        stub.position.set(stub.items.len());
        S_FALSE
    } else {
        stub.position.set(target);
        S_OK
    }
}

unsafe extern "system" fn enum_reset(this: *mut c_void) -> HRESULT {
    stub::<StubEnum>(this).position.set(0);
    S_OK
}

unsafe extern "system" fn enum_clone(_this: *mut c_void, out: *mut *mut c_void) -> HRESULT {
    *out = std::ptr::null_mut();
    E_NOTIMPL
}

static ENUM_VTBL: IEnumUnknownVtbl = IEnumUnknownVtbl {
    base: UNKNOWN_BASE,
    Next: enum_next,
    Skip: enum_skip,
    Reset: enum_reset,
    Clone: enum_clone,
};

// ---------------------------------------------------------------------------
// ICLRMetaHost
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct StubMetaHost {
    pub header: StubHeader,
    /// Status `GetRuntime` returns.
    pub get_runtime_status: Cell<HRESULT>,
    /// Written to the out-parameter of `GetRuntime`, even when it fails.
    pub runtime: Cell<*mut c_void>,
    pub requested_version: RefCell<Option<String>>,
    pub requested_iid: Cell<Option<GUID>>,
    pub file_version: String,
    pub requested_file: RefCell<Option<String>>,
    pub enumerator: Cell<*mut c_void>,
    pub loaded_process: Cell<usize>,
    pub callback: Cell<Option<RuntimeLoadedCallback>>,
    pub legacy_status: Cell<HRESULT>,
    pub exit_code: Cell<Option<i32>>,
}

impl StubMetaHost {
    pub fn new() -> Box<Self> {
        Box::new(Self {
            header: StubHeader::new(&META_HOST_VTBL, IID_ICLR_META_HOST),
            get_runtime_status: Cell::new(S_OK),
            runtime: Cell::new(std::ptr::null_mut()),
            requested_version: RefCell::new(None),
            requested_iid: Cell::new(None),
            file_version: "v2.0.50727".to_owned(),
            requested_file: RefCell::new(None),
            enumerator: Cell::new(std::ptr::null_mut()),
            loaded_process: Cell::new(0),
            callback: Cell::new(None),
            legacy_status: Cell::new(S_OK),
            exit_code: Cell::new(None),
        })
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }
}

unsafe extern "system" fn host_get_runtime(
    this: *mut c_void,
    version: *const u16,
    riid: *const GUID,
    out: *mut *mut c_void,
) -> HRESULT {
    let stub = stub::<StubMetaHost>(this);
    if !stub.header.enter() {
        return E_FAIL;
    }
    *stub.requested_version.borrow_mut() = Some(read_wide(version));
    stub.requested_iid.set(Some(*riid));

    let status = stub.get_runtime_status.get();
    if status.0 != 0 {
        // Leave garbage behind on failure; the binding must not adopt it.
        *out = stub.runtime.get();
        return status;
    }
    if *riid != IID_ICLR_RUNTIME_INFO {
        *out = std::ptr::null_mut();
        return E_NOINTERFACE;
    }
    *out = hand_out(stub.runtime.get());
    S_OK
}

unsafe extern "system" fn host_get_version_from_file(
    this: *mut c_void,
    path: *const u16,
    buffer: *mut u16,
    len: *mut u32,
) -> HRESULT {
    let stub = stub::<StubMetaHost>(this);
    *stub.requested_file.borrow_mut() = Some(read_wide(path));
    write_wide(&stub.file_version, buffer, len)
}

unsafe extern "system" fn host_enumerate_installed_runtimes(this: *mut c_void, out: *mut *mut c_void) -> HRESULT {
    let stub = stub::<StubMetaHost>(this);
    *out = hand_out(stub.enumerator.get());
    S_OK
}

unsafe extern "system" fn host_enumerate_loaded_runtimes(
    this: *mut c_void,
    process: *mut c_void,
    out: *mut *mut c_void,
) -> HRESULT {
    let stub = stub::<StubMetaHost>(this);
    stub.loaded_process.set(process as usize);
    if process.is_null() {
        *out = std::ptr::null_mut();
        return HRESULT(0x80070006u32 as i32); // E_HANDLE
    }
    *out = hand_out(stub.enumerator.get());
    S_OK
}

unsafe extern "system" fn host_request_runtime_loaded_notification(
    this: *mut c_void,
    callback: RuntimeLoadedCallback,
) -> HRESULT {
    stub::<StubMetaHost>(this).callback.set(Some(callback));
    S_OK
}

unsafe extern "system" fn host_query_legacy_v2_runtime_binding(
    this: *mut c_void,
    _riid: *const GUID,
    out: *mut *mut c_void,
) -> HRESULT {
    *out = std::ptr::null_mut();
    stub::<StubMetaHost>(this).legacy_status.get()
}

unsafe extern "system" fn host_exit_process(this: *mut c_void, exit_code: i32) -> HRESULT {
    stub::<StubMetaHost>(this).exit_code.set(Some(exit_code));
    E_FAIL
}

static META_HOST_VTBL: ICLRMetaHostVtbl = ICLRMetaHostVtbl {
    base: UNKNOWN_BASE,
    GetRuntime: host_get_runtime,
    GetVersionFromFile: host_get_version_from_file,
    EnumerateInstalledRuntimes: host_enumerate_installed_runtimes,
    EnumerateLoadedRuntimes: host_enumerate_loaded_runtimes,
    RequestRuntimeLoadedNotification: host_request_runtime_loaded_notification,
    QueryLegacyV2RuntimeBinding: host_query_legacy_v2_runtime_binding,
    ExitProcess: host_exit_process,
};

/// A notification callback that does nothing.
pub unsafe extern "system" fn ignore_runtime_loaded(
    _runtime_info: *mut c_void,
    _thread_set: CallbackThreadFn,
    _thread_unset: CallbackThreadFn,
) {
}

// ---------------------------------------------------------------------------
// Factory export and loader
// ---------------------------------------------------------------------------

thread_local! {
    static FACTORY_STATUS: Cell<i32> = const { Cell::new(0) };
    static FACTORY_OUTPUT: Cell<usize> = const { Cell::new(0) };
    static FACTORY_CALLS: Cell<u32> = const { Cell::new(0) };
    static FACTORY_ARGS: Cell<Option<(GUID, GUID)>> = const { Cell::new(None) };
}

type CreateInstanceFn = unsafe extern "system" fn(*const GUID, *const GUID, *mut *mut c_void) -> HRESULT;

/// Stands in for `CLRCreateInstance`.
///
/// Writes the armed output into the out-parameter (whatever the status) and
/// returns the armed status. State is per test thread.
unsafe extern "system" fn stub_create_instance(
    clsid: *const GUID,
    riid: *const GUID,
    out: *mut *mut c_void,
) -> HRESULT {
    FACTORY_CALLS.with(|calls| calls.set(calls.get() + 1));
    FACTORY_ARGS.with(|args| args.set(Some((*clsid, *riid))));
    *out = FACTORY_OUTPUT.with(Cell::get) as *mut c_void;
    HRESULT(FACTORY_STATUS.with(Cell::get))
}

/// Controls [`stub_create_instance`] for the current thread.
pub struct StubFactory;

impl StubFactory {
    pub fn arm(status: StatusCode, output: *mut c_void) {
        FACTORY_STATUS.with(|s| s.set(status.raw()));
        FACTORY_OUTPUT.with(|o| o.set(output as usize));
    }

    pub fn calls() -> u32 {
        FACTORY_CALLS.with(Cell::get)
    }

    pub fn last_args() -> Option<(GUID, GUID)> {
        FACTORY_ARGS.with(Cell::get)
    }
}

/// Resolves exactly one library/symbol pair to [`stub_create_instance`].
pub struct FakeLoader {
    library: String,
    symbol: String,
    resolves: Cell<u32>,
}

impl FakeLoader {
    /// Serves the default `mscoree.dll!CLRCreateInstance` pair.
    pub fn new() -> Self {
        let config = FactoryConfig::default();
        Self {
            library: config.library,
            symbol: config.entry_point,
            resolves: Cell::new(0),
        }
    }

    pub fn resolves(&self) -> u32 {
        self.resolves.get()
    }
}

impl SymbolLoader for FakeLoader {
    fn resolve(&self, library: &str, symbol: &str) -> Result<RawAddress> {
        self.resolves.set(self.resolves.get() + 1);
        if library != self.library {
            return Err(Error::LibraryNotFound {
                library: library.to_owned(),
                detail: "not served by the fake loader".to_owned(),
            });
        }
        if symbol != self.symbol {
            return Err(Error::SymbolNotFound {
                library: library.to_owned(),
                symbol: symbol.to_owned(),
            });
        }
        Ok(stub_create_instance as CreateInstanceFn as RawAddress)
    }
}
