//! Provides the class and interface identifiers understood by the CLR hosting API.
//!
//! Values are copied from `metahost.h` and `mscoree.h`. Only the classes listed
//! in [`SUPPORTED_CLASSES`] can be created through [`crate::ClrFactory`]; the
//! remaining constants are used as interface IDs for calls on existing objects
//! or passed through on behalf of the caller.
//!
//! # Examples
//! ```
//! use clrhost::guids::{is_supported_class, CLSID_CLR_DEBUGGING, CLSID_CLR_META_HOST};
//!
//! assert!(is_supported_class(&CLSID_CLR_META_HOST));
//! assert!(!is_supported_class(&CLSID_CLR_DEBUGGING));
//! ```

use windows_core::GUID;

// ---------------------------------------------------------------------------
// Class IDs
// ---------------------------------------------------------------------------

/// CLSID of the metahost object returned by `CLRCreateInstance`.
// {9280188D-0E8E-4867-B30C-7FA83884E8DE}
pub const CLSID_CLR_META_HOST: GUID = GUID {
    data1: 0x9280188D,
    data2: 0x0E8E,
    data3: 0x4867,
    data4: [0xB3, 0x0C, 0x7F, 0xA8, 0x38, 0x84, 0xE8, 0xDE],
};

/// CLSID of the metahost policy object.
pub const CLSID_CLR_META_HOST_POLICY: GUID = GUID::from_u128(0x2ebcd49a_1b47_4a61_b13a_4a03701e594b);

/// CLSID of the debugging object.
pub const CLSID_CLR_DEBUGGING: GUID = GUID::from_u128(0xbacc578d_fbdd_48a4_969f_02d932b74634);

/// CLSID of the v4 runtime host, passed to `ICLRRuntimeInfo::GetInterface`.
pub const CLSID_CLR_RUNTIME_HOST: GUID = GUID::from_u128(0x90f1a06e_7712_4762_86b5_7a5eba6bdb02);

/// CLSID of the legacy v2 runtime host, passed to `ICLRRuntimeInfo::GetInterface`.
pub const CLSID_COR_RUNTIME_HOST: GUID = GUID::from_u128(0xcb2f6723_ab3a_11d2_9c40_00c04fa3d7a7);

// ---------------------------------------------------------------------------
// Interface IDs
// ---------------------------------------------------------------------------

pub const IID_IUNKNOWN: GUID = GUID::from_u128(0x00000000_0000_0000_c000_000000000046);
pub const IID_IENUM_UNKNOWN: GUID = GUID::from_u128(0x00000100_0000_0000_c000_000000000046);
pub const IID_ICLR_META_HOST: GUID = GUID::from_u128(0xd332db9e_b9b3_4125_8207_a14884f53216);
pub const IID_ICLR_META_HOST_POLICY: GUID = GUID::from_u128(0xe2190695_77b2_492e_8e14_c4b3a7fdd593);
pub const IID_ICLR_DEBUGGING: GUID = GUID::from_u128(0xd28f3c5a_9634_4206_a509_477552eefb10);
pub const IID_ICLR_RUNTIME_INFO: GUID = GUID::from_u128(0xbd39d1d2_ba2f_486a_89b0_b4b0cb466891);
pub const IID_ICLR_RUNTIME_HOST: GUID = GUID::from_u128(0x90f1a06c_7712_4762_86b5_7a5eba6bdb02);
pub const IID_ICOR_RUNTIME_HOST: GUID = GUID::from_u128(0xcb2f6722_ab3a_11d2_9c40_00c04fa3d7a7);

/// Classes the factory is willing to create.
///
/// `CLRCreateInstance` also serves the policy and debugging classes, but no
/// bindings exist for their interfaces, so they are rejected up front.
pub const SUPPORTED_CLASSES: &[GUID] = &[CLSID_CLR_META_HOST];

/// Returns `true` if `clsid` is in [`SUPPORTED_CLASSES`].
pub fn is_supported_class(clsid: &GUID) -> bool {
    SUPPORTED_CLASSES.contains(clsid)
}
