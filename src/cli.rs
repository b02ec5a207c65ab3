// FILE: src/cli.rs
//! DISM-style argument tokenizer.
//!
//! Accepts `/Key:value`, `/Key value` (value-taking keys only) and bare
//! `/Flag` tokens. Keys are case-insensitive and ignore `-`/`_`, so
//! `/Mount-Image`, `/mount_image` and `-MOUNTIMAGE` are the same switch.
//! Values keep their case.

use std::collections::HashMap;
use std::path::PathBuf;
use crate::config::LogLevel;
use crate::core::{PackageRef, Target};
use crate::error::{Result, ServicingError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TOKENS: &[&str] = &["/?", "-?", "/help", "-h", "--help"];

/// Keys that consume the following token when no `:value` is attached.
const VALUE_KEYS: &[&str] = &[
    "image", "imagefile", "mountdir", "index", "featurename",
    "packagename", "packagepath", "scratchdir", "loglevel",
];

const FLAG_KEYS: &[&str] = &[
    "online", "readonly", "commit", "discard", "all", "remove",
    "preventpending", "ignorecheck",
];

/// Commands in resolution priority order.
const COMMAND_KEYS: &[&str] = &[
    "mountimage", "unmountimage", "getmountedimageinfo", "getimageinfo",
    "getfeatures", "getfeatureinfo", "enablefeature", "disablefeature",
    "getpackages", "getpackageinfo", "addpackage", "removepackage", "getdrivers",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServicingCommand {
    MountImage { image_file: PathBuf, mount_dir: PathBuf, index: u32, read_only: bool },
    UnmountImage { mount_dir: PathBuf, commit: bool, discard: bool },
    GetMountedImageInfo,
    GetImageInfo { image_file: PathBuf, index: Option<u32> },
    GetFeatures,
    GetFeatureInfo { name: String },
    EnableFeature { name: String, all: bool },
    DisableFeature { name: String, remove: bool },
    GetPackages,
    GetPackageInfo { package: PackageRef },
    AddPackage { path: String, ignore_check: bool, prevent_pending: bool },
    RemovePackage { package: PackageRef },
    GetDrivers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: ServicingCommand,
    pub target: Target,
    pub scratch_dir: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    /// Tokens that were not recognised; logged once logging is up.
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedArgs {
    Help,
    Run(Invocation),
}

/// Parse the arguments after the program name.
pub fn parse_args<I, S>(args: I) -> Result<ParsedArgs>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    if args.is_empty() || args.iter().any(|a| HELP_TOKENS.iter().any(|h| a.eq_ignore_ascii_case(h))) {
        return Ok(ParsedArgs::Help);
    }

    let tokens = Tokens::scan(&args);

    let target = if !tokens.has("online") && tokens.has("image") {
        Target::Image(tokens.require("image", "/Image requires a path")?)
    } else {
        Target::Online
    };

    let scratch_dir = tokens.value("scratchdir").map(PathBuf::from);
    let log_level = match tokens.value("loglevel") {
        Some(raw) => Some(
            raw.trim()
                .parse::<u8>()
                .ok()
                .and_then(LogLevel::from_dism)
                .ok_or_else(|| invalid(format!("Invalid /LogLevel: {} (expected 1-4)", raw)))?,
        ),
        None => None,
    };

    let command = resolve_command(&tokens)?;

    Ok(ParsedArgs::Run(Invocation {
        command,
        target,
        scratch_dir,
        log_level,
        ignored: tokens.ignored,
    }))
}

fn resolve_command(tokens: &Tokens) -> Result<ServicingCommand> {
    let Some(command) = COMMAND_KEYS.iter().find(|c| tokens.has(c)) else {
        return Err(invalid("No valid command specified. Use /? for help."));
    };

    let command = match *command {
        "mountimage" => {
            let (Some(image_file), Some(mount_dir)) = (tokens.value("imagefile"), tokens.value("mountdir")) else {
                return Err(invalid("/ImageFile and /MountDir are required for /Mount-Image"));
            };
            ServicingCommand::MountImage {
                image_file: PathBuf::from(image_file),
                mount_dir: PathBuf::from(mount_dir),
                index: parse_index(tokens)?.unwrap_or(1),
                read_only: tokens.has("readonly"),
            }
        }
        "unmountimage" => ServicingCommand::UnmountImage {
            mount_dir: PathBuf::from(tokens.require("mountdir", "/MountDir is required for /Unmount-Image")?),
            commit: tokens.has("commit"),
            discard: tokens.has("discard"),
        },
        "getmountedimageinfo" => ServicingCommand::GetMountedImageInfo,
        "getimageinfo" => ServicingCommand::GetImageInfo {
            image_file: PathBuf::from(tokens.require("imagefile", "/ImageFile is required for /Get-ImageInfo")?),
            index: parse_index(tokens)?,
        },
        "getfeatures" => ServicingCommand::GetFeatures,
        "getfeatureinfo" => ServicingCommand::GetFeatureInfo {
            name: tokens.require("featurename", "/FeatureName is required for /Get-FeatureInfo")?,
        },
        "enablefeature" => ServicingCommand::EnableFeature {
            name: tokens.require("featurename", "/FeatureName is required for /Enable-Feature")?,
            all: tokens.has("all"),
        },
        "disablefeature" => ServicingCommand::DisableFeature {
            name: tokens.require("featurename", "/FeatureName is required for /Disable-Feature")?,
            remove: tokens.has("remove"),
        },
        "getpackages" => ServicingCommand::GetPackages,
        "getpackageinfo" => ServicingCommand::GetPackageInfo {
            package: package_ref(tokens, "/PackageName or /PackagePath is required for /Get-PackageInfo")?,
        },
        "addpackage" => ServicingCommand::AddPackage {
            path: tokens.require("packagepath", "/PackagePath is required for /Add-Package")?,
            ignore_check: tokens.has("ignorecheck"),
            prevent_pending: tokens.has("preventpending"),
        },
        "removepackage" => ServicingCommand::RemovePackage {
            package: package_ref(tokens, "/PackageName or /PackagePath is required for /Remove-Package")?,
        },
        _ => ServicingCommand::GetDrivers,
    };

    Ok(command)
}

fn parse_index(tokens: &Tokens) -> Result<Option<u32>> {
    match tokens.value("index") {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(index) if index >= 1 => Ok(Some(index)),
            _ => Err(invalid(format!("Invalid /Index: {} (expected a positive integer)", raw))),
        },
    }
}

/// `/PackageName` wins when both forms are given.
fn package_ref(tokens: &Tokens, message: &str) -> Result<PackageRef> {
    match (tokens.value("packagename"), tokens.value("packagepath")) {
        (Some(name), _) => Ok(PackageRef::Name(name)),
        (None, Some(path)) => Ok(PackageRef::Path(path)),
        (None, None) => Err(invalid(message)),
    }
}

fn invalid(message: impl Into<String>) -> ServicingError {
    ServicingError::InputValidation(message.into())
}

/// Normalize a switch name: strip prefix, lowercase, drop `-` and `_`.
fn normalize_key(raw: &str) -> String {
    raw.trim_start_matches(&['/', '-'][..])
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_known_key(key: &str) -> bool {
    VALUE_KEYS.contains(&key) || FLAG_KEYS.contains(&key) || COMMAND_KEYS.contains(&key)
}

struct Tokens {
    /// `None` for bare flags.
    entries: HashMap<String, Option<String>>,
    ignored: Vec<String>,
}

impl Tokens {
    fn scan(args: &[String]) -> Self {
        let mut entries = HashMap::new();
        let mut ignored = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            i += 1;

            if !(arg.starts_with('/') || arg.starts_with('-')) {
                ignored.push(arg.clone());
                continue;
            }

            let (raw_key, inline_value) = match arg.split_once(':') {
                Some((k, v)) => (k, Some(v.to_string())),
                None => (arg.as_str(), None),
            };
            let key = normalize_key(raw_key);
            if !is_known_key(&key) {
                ignored.push(arg.clone());
                continue;
            }

            let value = match inline_value {
                Some(v) => Some(v),
                None if VALUE_KEYS.contains(&key.as_str()) => match args.get(i) {
                    Some(next) if !is_known_key(&normalize_key(next.split(':').next().unwrap_or(next))) => {
                        i += 1;
                        Some(next.clone())
                    }
                    _ => None,
                },
                None => None,
            };

            entries.insert(key, value);
        }

        Self { entries, ignored }
    }

    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn value(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .cloned()
            .flatten()
            .filter(|v| !v.trim().is_empty())
    }

    fn require(&self, key: &str, message: &str) -> Result<String> {
        self.value(key).ok_or_else(|| invalid(message))
    }
}

pub fn help_text() -> String {
    format!(
        r#"
Deployment Image Servicing and Management Tool v{version}

DISM.exe [/Image:<path_to_image_directory>] [dism_options] {{/Enable-Feature | /Disable-Feature}} /FeatureName:<feature_name>
DISM.exe [/Online] [dism_options] {{/Add-Package | /Remove-Package}} [package_options]

IMAGE COMMANDS:
  /Mount-Image          - Mounts an image from a WIM or VHD file
                          /ImageFile:<path> /MountDir:<path> [/Index:<n>] [/ReadOnly]
  /Unmount-Image        - Unmounts a mounted WIM or VHD image
                          /MountDir:<path> {{/Commit | /Discard}}
  /Get-MountedImageInfo - Displays information about mounted WIM and VHD images
  /Get-ImageInfo        - Displays information about images in a WIM or VHD file
                          /ImageFile:<path> [/Index:<n>]

FEATURE COMMANDS:
  /Get-Features         - Displays all features in the image
  /Get-FeatureInfo      - Displays information about a specific feature
  /Enable-Feature       - Enables a specific feature in the image [/All]
  /Disable-Feature      - Disables a specific feature in the image [/Remove]

PACKAGE COMMANDS:
  /Get-Packages         - Displays information about all packages in the image
  /Get-PackageInfo      - Displays information about a specific package
                          {{/PackageName:<name> | /PackagePath:<path>}}
  /Add-Package          - Adds packages to the image
                          /PackagePath:<path> [/IgnoreCheck] [/PreventPending]
  /Remove-Package       - Removes packages from the image
                          {{/PackageName:<name> | /PackagePath:<path>}}

DRIVER COMMANDS:
  /Get-Drivers          - Displays information about all drivers in the image

DISM OPTIONS:
  /Online               - Targets the running operating system (default)
  /Image:<path>         - Targets an offline Windows image directory
  /ScratchDir:<path>    - Directory for simulated servicing state
  /LogLevel:<1-4>       - 1 = errors, 2 = warnings, 3 = information, 4 = debug

When the native DISM tool is unavailable, changes are simulated and kept under
the scratch directory so that later queries reflect them.

Examples:
  DISM.exe /Mount-Image /ImageFile:C:\test\images\install.wim /Index:1 /MountDir:C:\test\offline
  DISM.exe /Image:C:\test\offline /Get-Features
  DISM.exe /Online /Enable-Feature /FeatureName:Microsoft-Windows-Subsystem-Linux
  DISM.exe /Online /Get-Drivers
"#,
        version = VERSION
    )
}
