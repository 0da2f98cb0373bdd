//! Configuration for a marker build.
//!
//! Controls where the registry is written, the unit it is expressed in, the
//! default marker size and how an existing registry file is treated. Values
//! can be loaded from environment variables or constructed programmatically.

use std::env;
use std::path::PathBuf;

use pagemark_registry::FlushMode;
use pagemark_units::{Length, PhysicalUnit};

/// Default marker edge length in points.
pub const DEFAULT_SIZE_PT: f64 = 10.0;

/// Default registry path, relative to the destination directory.
pub const DEFAULT_REGISTRY_PATH: &str = "/pos.json";

/// Runtime configuration for a marker build.
#[derive(Clone, Debug, PartialEq)]
pub struct RecorderConfig {
    /// Directory build artifacts are written into
    pub dest_dir: PathBuf,
    /// Registry path; a leading `/` is relative to `dest_dir`
    pub registry_path: PathBuf,
    /// Edge length used when a marker does not specify one
    pub default_size: Length,
    /// Physical unit the registry is expressed in
    pub unit: PhysicalUnit,
    /// Whether a previous registry file is replaced or merged into
    pub flush_mode: FlushMode,
}

impl RecorderConfig {
    /// Construct a new `RecorderConfig` with explicit values.
    ///
    /// A `default_size` that is negative or not finite falls back to
    /// [`DEFAULT_SIZE_PT`].
    #[inline]
    #[must_use]
    pub fn new(
        dest_dir: impl Into<PathBuf>,
        registry_path: impl Into<PathBuf>,
        default_size: Length,
        unit: PhysicalUnit,
        flush_mode: FlushMode,
    ) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            registry_path: registry_path.into(),
            default_size: sanitize_size(default_size),
            unit,
            flush_mode,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `PAGEMARK_DEST_DIR`: destination directory (default: `.`)
    /// - `PAGEMARK_REGISTRY_PATH`: registry path (default: `/pos.json`)
    /// - `PAGEMARK_DEFAULT_SIZE_PT`: default marker size in points (default: 10)
    /// - `PAGEMARK_UNIT`: `cm`, `mm` or `in` (default: `cm`)
    /// - `PAGEMARK_MERGE`: set to "1" to merge into an existing registry
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Unset or unparsable values keep their defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let dest_dir = lookup("PAGEMARK_DEST_DIR")
            .filter(|val| !val.is_empty())
            .map_or(defaults.dest_dir, PathBuf::from);
        let registry_path = lookup("PAGEMARK_REGISTRY_PATH")
            .filter(|val| !val.is_empty())
            .map_or(defaults.registry_path, PathBuf::from);
        let default_size = lookup("PAGEMARK_DEFAULT_SIZE_PT")
            .and_then(|val| val.trim().parse::<f64>().ok())
            .map_or(defaults.default_size, |points| sanitize_size(Length::pt(points)));
        let unit = lookup("PAGEMARK_UNIT")
            .and_then(|val| PhysicalUnit::parse(&val))
            .unwrap_or(defaults.unit);
        let flush_mode = if lookup("PAGEMARK_MERGE").as_deref() == Some("1") {
            FlushMode::Merge
        } else {
            FlushMode::Replace
        };
        Self {
            dest_dir,
            registry_path,
            default_size,
            unit,
            flush_mode,
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            dest_dir: PathBuf::from("."),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
            default_size: Length::pt(DEFAULT_SIZE_PT),
            unit: PhysicalUnit::Centimeters,
            flush_mode: FlushMode::Replace,
        }
    }
}

fn sanitize_size(size: Length) -> Length {
    if size.is_finite() && !size.is_negative() {
        size
    } else {
        Length::pt(DEFAULT_SIZE_PT)
    }
}
