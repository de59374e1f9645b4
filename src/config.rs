//! Provides the factory configuration.
//!
//! The defaults name the real CLR shim. Hosts that ship the settings in their
//! own configuration file can deserialize a [`FactoryConfig`] directly; missing
//! fields fall back to the defaults.
//!
//! # Examples
//! ```
//! use clrhost::FactoryConfig;
//!
//! let config = FactoryConfig::default();
//! assert_eq!(config.library, "mscoree.dll");
//! assert_eq!(config.entry_point, "CLRCreateInstance");
//! ```

use serde::Deserialize;

/// Library and export the factory resolves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Shared library exporting the factory function.
    pub library: String,
    /// Name of the `(REFCLSID, REFIID, LPVOID*) -> HRESULT` export.
    pub entry_point: String,
}

impl FactoryConfig {
    /// Library name used when none is configured.
    pub const DEFAULT_LIBRARY: &'static str = "mscoree.dll";
    /// Export name used when none is configured.
    pub const DEFAULT_ENTRY_POINT: &'static str = "CLRCreateInstance";
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            library: Self::DEFAULT_LIBRARY.to_owned(),
            entry_point: Self::DEFAULT_ENTRY_POINT.to_owned(),
        }
    }
}
