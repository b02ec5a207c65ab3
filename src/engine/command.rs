// FILE: src/engine/command.rs
//! Argument vectors in the native tool's `/Flag:value` syntax.

use std::path::Path;
use crate::core::{PackageRef, Target};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCommand<'a> {
    CommitImage { mount_dir: &'a Path },
    GetImageInfo { image_file: &'a Path, index: Option<u32> },
    GetFeatures { target: &'a Target },
    GetFeatureInfo { target: &'a Target, name: &'a str },
    EnableFeature { target: &'a Target, name: &'a str, all: bool },
    DisableFeature { target: &'a Target, name: &'a str, remove: bool },
    GetPackages { target: &'a Target },
    GetPackageInfo { target: &'a Target, package: &'a PackageRef },
    AddPackage { target: &'a Target, path: &'a str, ignore_check: bool, prevent_pending: bool },
    RemovePackage { target: &'a Target, package: &'a PackageRef },
    GetDrivers { target: &'a Target },
}

impl NativeCommand<'_> {
    pub fn args(&self) -> Vec<String> {
        match self {
            NativeCommand::CommitImage { mount_dir } => vec![
                "/Commit-Image".to_string(),
                format!("/MountDir:{}", mount_dir.display()),
            ],
            NativeCommand::GetImageInfo { image_file, index } => {
                let mut args = vec![
                    "/Get-ImageInfo".to_string(),
                    format!("/ImageFile:{}", image_file.display()),
                ];
                if let Some(index) = index {
                    args.push(format!("/Index:{}", index));
                }
                args
            }
            NativeCommand::GetFeatures { target } => {
                vec![target.native_arg(), "/Get-Features".to_string()]
            }
            NativeCommand::GetFeatureInfo { target, name } => vec![
                target.native_arg(),
                "/Get-FeatureInfo".to_string(),
                format!("/FeatureName:{}", name),
            ],
            NativeCommand::EnableFeature { target, name, all } => {
                let mut args = vec![
                    target.native_arg(),
                    "/Enable-Feature".to_string(),
                    format!("/FeatureName:{}", name),
                ];
                if *all {
                    args.push("/All".to_string());
                }
                args
            }
            NativeCommand::DisableFeature { target, name, remove } => {
                let mut args = vec![
                    target.native_arg(),
                    "/Disable-Feature".to_string(),
                    format!("/FeatureName:{}", name),
                ];
                if *remove {
                    args.push("/Remove".to_string());
                }
                args
            }
            NativeCommand::GetPackages { target } => {
                vec![target.native_arg(), "/Get-Packages".to_string()]
            }
            NativeCommand::GetPackageInfo { target, package } => vec![
                target.native_arg(),
                "/Get-PackageInfo".to_string(),
                package.native_arg(),
            ],
            NativeCommand::AddPackage { target, path, ignore_check, prevent_pending } => {
                let mut args = vec![
                    target.native_arg(),
                    "/Add-Package".to_string(),
                    format!("/PackagePath:{}", path),
                ];
                if *ignore_check {
                    args.push("/IgnoreCheck".to_string());
                }
                if *prevent_pending {
                    args.push("/PreventPending".to_string());
                }
                args
            }
            NativeCommand::RemovePackage { target, package } => vec![
                target.native_arg(),
                "/Remove-Package".to_string(),
                package.native_arg(),
            ],
            NativeCommand::GetDrivers { target } => {
                vec![target.native_arg(), "/Get-Drivers".to_string()]
            }
        }
    }

    /// Short verb phrase used in logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            NativeCommand::CommitImage { .. } => "commit image changes".to_string(),
            NativeCommand::GetImageInfo { .. } => "get image info".to_string(),
            NativeCommand::GetFeatures { .. } => "get features".to_string(),
            NativeCommand::GetFeatureInfo { name, .. } => format!("get feature info for {}", name),
            NativeCommand::EnableFeature { name, target, .. } => {
                format!("enable feature {}{}", name, offline_suffix(target))
            }
            NativeCommand::DisableFeature { name, target, .. } => {
                format!("disable feature {}{}", name, offline_suffix(target))
            }
            NativeCommand::GetPackages { .. } => "get packages".to_string(),
            NativeCommand::GetPackageInfo { package, .. } => format!("get package info for {}", package),
            NativeCommand::AddPackage { path, target, .. } => {
                format!("add package {}{}", path, offline_suffix(target))
            }
            NativeCommand::RemovePackage { package, target } => {
                format!("remove package {}{}", package, offline_suffix(target))
            }
            NativeCommand::GetDrivers { .. } => "get drivers".to_string(),
        }
    }
}

fn offline_suffix(target: &Target) -> &'static str {
    if target.is_online() { "" } else { " in offline image" }
}
