// FILE: src/storage/reference.rs
//! Reference sample catalogs.
//!
//! Static display baseline used when neither the native tool nor simulated
//! state has anything to say. Never mutated.

use crate::storage::ItemState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub name: &'static str,
    pub state: ItemState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverEntry {
    pub name: &'static str,
    pub version: &'static str,
    pub provider: &'static str,
}

pub const SAMPLE_FEATURES: &[ReferenceEntry] = &[
    ReferenceEntry { name: "IIS-WebServerRole", state: ItemState::Disabled },
    ReferenceEntry { name: "IIS-WebServer", state: ItemState::Disabled },
    ReferenceEntry { name: "IIS-CommonHttpFeatures", state: ItemState::Disabled },
    ReferenceEntry { name: "IIS-ApplicationDevelopment", state: ItemState::Disabled },
    ReferenceEntry { name: "Microsoft-Windows-Subsystem-Linux", state: ItemState::Disabled },
    ReferenceEntry { name: "VirtualMachinePlatform", state: ItemState::Enabled },
    ReferenceEntry { name: "Microsoft-Hyper-V-All", state: ItemState::Disabled },
];

pub const SAMPLE_PACKAGES: &[ReferenceEntry] = &[
    ReferenceEntry { name: "Microsoft-Windows-Client-Features-Package", state: ItemState::Installed },
    ReferenceEntry { name: "Microsoft-Windows-NetFx3-OnDemand-Package", state: ItemState::Installed },
    ReferenceEntry { name: "Microsoft-Windows-PowerShell-ISE-Package", state: ItemState::Installed },
];

pub const SAMPLE_DRIVERS: &[DriverEntry] = &[
    DriverEntry { name: "Audio Device Driver", version: "10.0.1.2", provider: "Microsoft" },
    DriverEntry { name: "Network Adapter Driver", version: "1.2.3.4", provider: "Intel" },
    DriverEntry { name: "Graphics Driver", version: "2.1.0.0", provider: "NVIDIA" },
];

/// Case-insensitive lookup, matching how the native tool treats names.
pub fn find(catalog: &'static [ReferenceEntry], name: &str) -> Option<&'static ReferenceEntry> {
    catalog.iter().find(|entry| entry.name.eq_ignore_ascii_case(name))
}
