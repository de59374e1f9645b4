//! Provides marshaling helpers shared by the interface bindings.
//!
//! # Examples
//! ```
//! use clrhost::com::helpers::{from_wide, to_wide};
//!
//! let wide = to_wide("v4.0.30319");
//! assert_eq!(wide.last(), Some(&0));
//! assert_eq!(from_wide(&wide), "v4.0.30319");
//! ```

use crate::error::StatusCode;

/// Initial buffer size for string out-parameters, in UTF-16 units.
///
/// Runtime version strings ("v4.0.30319") fit easily; directories may not, in
/// which case the callee reports the required size.
pub const INITIAL_WIDE_BUFFER: usize = 64;

/// Encodes `s` as a NUL-terminated UTF-16 string.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

/// Decodes UTF-16 up to the first NUL (or the end of the slice).
pub fn from_wide(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

/// Runs the `(LPWSTR buffer, DWORD *pcchBuffer)` out-string protocol.
///
/// `fill` receives a buffer pointer and a pointer to its capacity in UTF-16
/// units. If it reports `INSUFFICIENT_BUFFER` with a larger capacity written
/// back, the call is retried once with a buffer of that size.
///
/// # Errors
/// Returns the first non-zero status that is not a resolvable size mismatch.
///
/// # Examples
/// ```
/// use clrhost::com::helpers::read_wide_string;
/// use clrhost::StatusCode;
///
/// let text = read_wide_string(|buf, len| unsafe {
///     let src: Vec<u16> = "abc\0".encode_utf16().collect();
///     std::ptr::copy_nonoverlapping(src.as_ptr(), buf, src.len());
///     *len = src.len() as u32;
///     StatusCode::S_OK
/// });
/// assert_eq!(text.unwrap(), "abc");
/// ```
pub fn read_wide_string<F>(mut fill: F) -> Result<String, StatusCode>
where
    F: FnMut(*mut u16, *mut u32) -> StatusCode,
{
    let mut buffer = vec![0u16; INITIAL_WIDE_BUFFER];
    let mut len = buffer.len() as u32;

    let mut status = fill(buffer.as_mut_ptr(), &mut len as *mut u32);
    if status == StatusCode::INSUFFICIENT_BUFFER && len as usize > buffer.len() {
        buffer = vec![0u16; len as usize];
        status = fill(buffer.as_mut_ptr(), &mut len as *mut u32);
    }
    status.ok()?;

    let used = (len as usize).min(buffer.len());
    Ok(from_wide(&buffer[..used]))
}
