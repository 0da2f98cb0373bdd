//! In-memory accumulation of marker positions and the JSON flush.

use std::collections::BTreeMap;
use std::collections::btree_map::Iter;
use std::fs::{create_dir_all, read, write};
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context as _, Result};
use log::{debug, trace};
use serde_json::{Map, Value, from_slice, to_value, to_vec_pretty};

use crate::{BoundingBox, MarkerId};

/// How a flush treats a registry file that already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlushMode {
    /// Write this build's entries only, replacing any previous file.
    #[default]
    Replace,
    /// Keep entries of the previous file and overlay this build's entries.
    Merge,
}

/// Outcome of a flush.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushSummary {
    /// Entries contributed by this build.
    pub written: usize,
    /// Entries carried over from a previous file (merge mode only).
    pub retained: usize,
}

/// Marker positions collected during one build, keyed by identifier.
///
/// Inserting an identifier that is already present replaces the previous
/// box: last write wins.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: BTreeMap<MarkerId, BoundingBox>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `bbox` under `id`, returning the box it replaced, if any.
    pub fn insert(&mut self, id: MarkerId, bbox: BoundingBox) -> Option<BoundingBox> {
        trace!("registry insert {id}: {bbox:?}");
        let previous = self.entries.insert(id, bbox);
        if let Some(replaced) = &previous {
            debug!("registry entry replaced: {replaced:?} -> {bbox:?}");
        }
        previous
    }

    /// Look up the box recorded for `id`.
    pub fn get(&self, id: &str) -> Option<&BoundingBox> {
        self.entries.get(id)
    }

    /// Whether `id` has been recorded.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> Iter<'_, MarkerId, BoundingBox> {
        self.entries.iter()
    }

    /// The registry as a JSON object, keys sorted.
    ///
    /// # Errors
    /// Returns an error if a box fails to serialize.
    pub fn to_json(&self) -> Result<Map<String, Value>> {
        let mut object = Map::new();
        self.overlay(&mut object)?;
        Ok(object)
    }

    /// Write the registry to `path`, creating missing parent directories.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created, the file
    /// cannot be written, or (merge mode) an existing file is not a JSON
    /// object. An existing file that is empty or blank counts as an empty
    /// registry.
    #[tracing::instrument(skip_all)]
    pub fn flush(&self, path: &Path, mode: FlushMode) -> Result<FlushSummary> {
        let mut object = match mode {
            FlushMode::Replace => Map::new(),
            FlushMode::Merge => load_existing(path)?,
        };
        let retained = object
            .keys()
            .filter(|key| !self.entries.contains_key(key.as_str()))
            .count();
        self.overlay(&mut object)?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let data = to_vec_pretty(&Value::Object(object))?;
        write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(
            "flushed {} marker(s) to {} ({} retained)",
            self.entries.len(),
            path.display(),
            retained
        );
        Ok(FlushSummary {
            written: self.entries.len(),
            retained,
        })
    }

    fn overlay(&self, object: &mut Map<String, Value>) -> Result<()> {
        for (id, bbox) in &self.entries {
            let value = to_value(bbox).with_context(|| format!("marker {id} is not serializable"))?;
            object.insert(id.as_str().to_owned(), value);
        }
        Ok(())
    }
}

fn load_existing(path: &Path) -> Result<Map<String, Value>> {
    match read(path) {
        Ok(data) if data.iter().all(u8::is_ascii_whitespace) => {
            debug!("{} is empty, starting a fresh registry", path.display());
            Ok(Map::new())
        }
        Ok(data) => from_slice(&data)
            .with_context(|| format!("{} is not a JSON object", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Map::new()),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}
