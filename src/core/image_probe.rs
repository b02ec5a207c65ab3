// FILE: src/core/image_probe.rs
//! Image Probe: best-effort identification of an image file without parsing it.
//!
//! Only the leading magic bytes are inspected. Anything deeper (WIM resource
//! tables, VHD footers) is out of scope.

use std::fs::File;
use std::io::Read;
use std::path::Path;

const HEADER_LEN: usize = 16;

const SIGNATURES: &[(&[u8], ImageKind)] = &[
    (b"MSWIM\x00\x00\x00", ImageKind::Wim),
    (b"conectix", ImageKind::Vhd),
    (b"vhdxfile", ImageKind::Vhdx),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Wim,
    Vhd,
    Vhdx,
    Unknown,
}

impl ImageKind {
    pub fn description(&self) -> &'static str {
        match self {
            ImageKind::Wim => "Windows Imaging Format (WIM)",
            ImageKind::Vhd => "Virtual Hard Disk (VHD)",
            ImageKind::Vhdx => "Virtual Hard Disk v2 (VHDX)",
            ImageKind::Unknown => "Unknown or corrupted",
        }
    }
}

/// Classify a header by its magic prefix.
pub fn classify_header(header: &[u8]) -> ImageKind {
    SIGNATURES
        .iter()
        .find(|(magic, _)| header.starts_with(magic))
        .map(|(_, kind)| *kind)
        .unwrap_or(ImageKind::Unknown)
}

/// Read the first bytes of `path` and classify them.
pub fn probe(path: &Path) -> std::io::Result<ImageKind> {
    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.by_ref().take(HEADER_LEN as u64).read_to_end(&mut header)?;
    Ok(classify_header(&header))
}

/// Upper-cased extension with its dot (".WIM"), or empty when there is none.
pub fn extension_label(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_uppercase()))
        .unwrap_or_default()
}
