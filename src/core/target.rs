// FILE: src/core/target.rs
use std::fmt;

/// What a servicing command operates on: the running system or an offline image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Target {
    #[default]
    Online,
    Image(String),
}

impl Target {
    pub fn is_online(&self) -> bool {
        matches!(self, Target::Online)
    }

    /// Offline image path, if any.
    pub fn image_path(&self) -> Option<&str> {
        match self {
            Target::Online => None,
            Target::Image(path) => Some(path),
        }
    }

    /// Selector argument in native tool syntax.
    pub fn native_arg(&self) -> String {
        match self {
            Target::Online => "/Online".to_string(),
            Target::Image(path) => format!("/Image:{}", path),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Online => write!(f, "/Online"),
            Target::Image(path) => write!(f, "{}", path),
        }
    }
}
