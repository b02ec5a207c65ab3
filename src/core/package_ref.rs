// FILE: src/core/package_ref.rs
use std::fmt;

/// How a package was named on the command line.
///
/// The native tool gets back exactly the form the user gave. The simulated
/// store only knows identities, so a path is reduced to its file stem there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageRef {
    Name(String),
    Path(String),
}

impl PackageRef {
    /// Key under which the package lives in the simulated store.
    pub fn identity(&self) -> String {
        match self {
            PackageRef::Name(name) => name.clone(),
            PackageRef::Path(path) => package_name(path),
        }
    }

    /// Selector argument in native tool syntax.
    pub fn native_arg(&self) -> String {
        match self {
            PackageRef::Name(name) => format!("/PackageName:{}", name),
            PackageRef::Path(path) => format!("/PackagePath:{}", path),
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageRef::Name(name) => write!(f, "{}", name),
            PackageRef::Path(path) => write!(f, "{}", path),
        }
    }
}

/// Package identity derived from a package file path: the file stem.
pub fn package_name(path: &str) -> String {
    let file = path
        .trim()
        .trim_end_matches(&['/', '\\'][..])
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or_default();
    match file.rfind('.') {
        Some(idx) if idx > 0 => file[..idx].to_string(),
        _ => file.to_string(),
    }
}
