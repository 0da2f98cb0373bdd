//! Output path resolution against a build's destination directory.

use core::fmt;
use std::error::Error;
use std::path::{Component, Path, PathBuf};

/// The directory a build writes its artifacts into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    root: PathBuf,
}

impl Destination {
    /// Create a destination rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an artifact path against the destination directory.
    ///
    /// A leading `/` refers to the destination root, not the filesystem
    /// root. The path is normalized lexically and must name a file strictly
    /// inside the destination.
    ///
    /// # Errors
    /// Returns [`DestinationError::EscapesRoot`] when `..` components climb
    /// above the destination, and [`DestinationError::NotAFile`] when nothing
    /// but the root itself remains.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, DestinationError> {
        let requested = path.as_ref();
        let mut relative = PathBuf::new();
        for component in requested.components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return Err(DestinationError::EscapesRoot(requested.to_path_buf()));
                    }
                }
                Component::Normal(part) => relative.push(part),
            }
        }
        if relative.as_os_str().is_empty() {
            return Err(DestinationError::NotAFile(requested.to_path_buf()));
        }
        Ok(self.root.join(relative))
    }
}

impl Default for Destination {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Why an artifact path was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationError {
    /// The path climbs out of the destination directory.
    EscapesRoot(PathBuf),
    /// The path resolves to the destination directory itself.
    NotAFile(PathBuf),
}

impl fmt::Display for DestinationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EscapesRoot(path) => {
                write!(formatter, "access denied: {} escapes the destination directory", path.display())
            }
            Self::NotAFile(path) => write!(formatter, "{} does not name a file", path.display()),
        }
    }
}

impl Error for DestinationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_slash_is_destination_relative() {
        let dest = Destination::new("/build/out");
        assert_eq!(dest.resolve("/pos.json").unwrap(), PathBuf::from("/build/out/pos.json"));
        assert_eq!(dest.resolve("data/pos.json").unwrap(), PathBuf::from("/build/out/data/pos.json"));
        assert_eq!(dest.resolve("./a/../pos.json").unwrap(), PathBuf::from("/build/out/pos.json"));
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let dest = Destination::new("out");
        assert_eq!(
            dest.resolve("/../pos.json"),
            Err(DestinationError::EscapesRoot(PathBuf::from("/../pos.json")))
        );
        assert!(matches!(dest.resolve("a/../../pos.json"), Err(DestinationError::EscapesRoot(_))));
    }

    #[test]
    fn root_itself_is_not_a_file() {
        let dest = Destination::new("out");
        assert!(matches!(dest.resolve("/"), Err(DestinationError::NotAFile(_))));
        assert!(matches!(dest.resolve("a/.."), Err(DestinationError::NotAFile(_))));
    }
}
