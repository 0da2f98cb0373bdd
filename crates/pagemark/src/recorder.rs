use core::fmt;
use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use log::{debug, trace, warn};
use pagemark_registry::{BoundingBox, Destination, FlushSummary, MarkerId, Registry};
use pagemark_units::{Length, PhysicalUnit, to_physical};

use crate::{ElementKey, LayoutHost, MarkerElement, Position, RecorderConfig, Resolution};

/// Callback run once the engine has fixed an element's position.
type ResolveCallback = Box<dyn FnOnce(Position, &mut Registry)>;

/// Lifecycle of a single marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerState {
    /// The element has been emitted into the document.
    Declared,
    /// Waiting for the engine's layout pass to reach the element.
    LayoutPending,
    /// The engine reported the element's final page and anchor.
    Resolved,
    /// The bounding box is in the registry. Terminal.
    Recorded,
}

/// Handle to a marker declared in a [`BuildContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerHandle(usize);

/// Size and outset of a marker. A missing size uses the build's default.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MarkerOptions {
    pub size: Option<Length>,
    pub outset: Length,
}

impl MarkerOptions {
    /// A marker of edge `size` without outset.
    pub fn sized(size: Length) -> Self {
        Self {
            size: Some(size),
            outset: Length::ZERO,
        }
    }

    /// Expand the painted square by `outset` on every side.
    #[must_use]
    pub fn with_outset(mut self, outset: Length) -> Self {
        self.outset = outset;
        self
    }
}

/// The engine reported a resolution the build cannot accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// No marker was declared under this key.
    UnknownElement(ElementKey),
    /// The marker under this key was already resolved.
    AlreadyResolved(ElementKey),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownElement(key) => write!(formatter, "no marker declared for element {key}"),
            Self::AlreadyResolved(key) => write!(formatter, "element {key} was resolved twice"),
        }
    }
}

impl Error for ResolveError {}

/// Outcome of applying one layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Resolutions that recorded a marker.
    pub applied: usize,
    /// Reports for markers an earlier pass already recorded. Ignored.
    pub repeated: usize,
}

/// A layout pass reported elements no marker was declared for.
///
/// Every other resolution of the pass was still applied; `summary` counts
/// them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassError {
    pub summary: PassSummary,
    pub errors: Vec<ResolveError>,
}

impl fmt::Display for PassError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} rejected resolution(s)", self.errors.len())?;
        for err in &self.errors {
            write!(formatter, "; {err}")?;
        }
        Ok(())
    }
}

impl Error for PassError {}

/// Summary of a finished build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildReport {
    /// Where the registry was written.
    pub path: PathBuf,
    /// Markers declared during the build.
    pub declared: usize,
    /// Markers whose position was recorded.
    pub recorded: usize,
    /// Markers the engine never resolved; they have no registry entry.
    pub omitted: usize,
    /// What the registry flush wrote.
    pub flush: FlushSummary,
}

struct MarkerRecord {
    id: MarkerId,
    key: ElementKey,
    state: MarkerState,
}

/// Bounding box of a square of edge `size` anchored at `position`, with
/// every coordinate converted into `unit`.
pub fn bounding_box(position: Position, size: Length, unit: PhysicalUnit) -> BoundingBox {
    BoundingBox {
        page: position.page,
        x: (to_physical(position.x, unit), to_physical(position.x + size, unit)),
        y: (to_physical(position.y, unit), to_physical(position.y + size, unit)),
    }
}

/// State shared by every marker of one document build.
///
/// Owns the registry and the table of pending resolution callbacks. Markers
/// are declared with [`BuildContext::place_marker`]; the engine's post-layout
/// pass feeds positions back through [`BuildContext::resolve`], and
/// [`BuildContext::finish`] writes the registry once.
pub struct BuildContext {
    config: RecorderConfig,
    registry: Registry,
    callbacks: HashMap<ElementKey, ResolveCallback>,
    markers: Vec<MarkerRecord>,
    by_key: HashMap<ElementKey, MarkerHandle>,
}

impl BuildContext {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
            callbacks: HashMap::new(),
            markers: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Entries recorded so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Place a marker inline at the host's current flow position.
    ///
    /// The element is emitted immediately. Its position is recorded later,
    /// when the engine reports the resolution for the returned key; nothing
    /// is written to the registry by this call.
    pub fn place_marker<H>(&mut self, host: &mut H, id: impl Into<MarkerId>, options: MarkerOptions) -> MarkerHandle
    where
        H: LayoutHost + ?Sized,
    {
        let id = id.into();
        let size = options.size.unwrap_or(self.config.default_size);
        if size.is_negative() {
            debug!("marker {id} declared with negative size {size:?}");
        }

        let key = host.push_inline(MarkerElement::new(size, options.outset));
        let handle = MarkerHandle(self.markers.len());
        trace!("marker {id} declared as element {key}");
        self.markers.push(MarkerRecord {
            id: id.clone(),
            key,
            state: MarkerState::Declared,
        });
        // A reused key stays bound to its first marker; this one can never resolve.
        if let Some(&owner) = self.by_key.get(&key) {
            warn!("element {key} already belongs to marker {owner:?}, {id} will not be recorded");
            return handle;
        }
        self.by_key.insert(key, handle);

        let unit = self.config.unit;
        trace!("marker {id} will be recorded in {unit}");
        let callback: ResolveCallback = Box::new(move |position: Position, registry: &mut Registry| {
            registry.insert(id, bounding_box(position, size, unit));
        });
        self.callbacks.insert(key, callback);
        self.set_state(handle, MarkerState::LayoutPending);
        handle
    }

    /// Accept the engine's resolution of element `key`.
    ///
    /// Runs the marker's callback exactly once, recording its bounding box.
    ///
    /// # Errors
    /// Returns [`ResolveError::UnknownElement`] if no marker was declared for
    /// `key` and [`ResolveError::AlreadyResolved`] if it was already
    /// resolved. The registry is unchanged in both cases.
    pub fn resolve(&mut self, key: ElementKey, position: Position) -> Result<(), ResolveError> {
        let Some(&handle) = self.by_key.get(&key) else {
            return Err(ResolveError::UnknownElement(key));
        };
        let Some(callback) = self.callbacks.remove(&key) else {
            return Err(ResolveError::AlreadyResolved(key));
        };
        self.set_state(handle, MarkerState::Resolved);
        callback(position, &mut self.registry);
        self.set_state(handle, MarkerState::Recorded);
        Ok(())
    }

    /// Apply a post-layout pass's resolutions in the order given.
    ///
    /// Engines may report every element on each pass, so a marker recorded
    /// earlier is skipped and counted as repeated. Its registry entry is
    /// left alone.
    ///
    /// # Errors
    /// Returns a [`PassError`] listing the unknown elements. The rest of the
    /// pass is applied before it is returned.
    pub fn resolve_all<I>(&mut self, resolutions: I) -> Result<PassSummary, PassError>
    where
        I: IntoIterator<Item = Resolution>,
    {
        let mut summary = PassSummary::default();
        let mut errors = Vec::new();
        for resolution in resolutions {
            match self.resolve(resolution.key, resolution.position) {
                Ok(()) => summary.applied += 1,
                Err(ResolveError::AlreadyResolved(key)) => {
                    trace!("element {key} reported again, ignored");
                    summary.repeated += 1;
                }
                Err(err) => {
                    warn!("{err}");
                    errors.push(err);
                }
            }
        }
        if errors.is_empty() {
            Ok(summary)
        } else {
            Err(PassError { summary, errors })
        }
    }

    /// Run the host's layout pass and apply its resolutions.
    ///
    /// # Errors
    /// See [`BuildContext::resolve_all`].
    pub fn run_layout<H>(&mut self, host: &mut H) -> Result<PassSummary, PassError>
    where
        H: LayoutHost + ?Sized,
    {
        let resolutions = host.layout();
        debug!("layout pass reported {} resolution(s)", resolutions.len());
        self.resolve_all(resolutions)
    }

    /// Current state of a marker.
    pub fn state(&self, handle: MarkerHandle) -> Option<MarkerState> {
        self.markers.get(handle.0).map(|record| record.state)
    }

    /// Element key the engine assigned to a marker.
    pub fn element_key(&self, handle: MarkerHandle) -> Option<ElementKey> {
        self.markers.get(handle.0).map(|record| record.key)
    }

    /// Number of markers still waiting for the engine.
    pub fn pending(&self) -> usize {
        self.callbacks.len()
    }

    /// End the build and write the registry.
    ///
    /// Markers the engine never resolved are left out of the registry.
    ///
    /// # Errors
    /// Returns an error if the registry path is refused by the destination
    /// or the registry cannot be written.
    pub fn finish(self) -> Result<BuildReport> {
        let destination = Destination::new(&self.config.dest_dir);
        let path = destination
            .resolve(&self.config.registry_path)
            .context("invalid registry path")?;

        let mut recorded = 0;
        let mut omitted = 0;
        for record in &self.markers {
            if record.state == MarkerState::Recorded {
                recorded += 1;
            } else {
                omitted += 1;
                debug!("marker {} (element {}) was never laid out", record.id, record.key);
            }
        }

        debug!("writing {} marker(s) in {} to {}", recorded, self.config.unit, path.display());
        let flush = self.registry.flush(&path, self.config.flush_mode)?;
        Ok(BuildReport {
            path,
            declared: self.markers.len(),
            recorded,
            omitted,
            flush,
        })
    }

    fn set_state(&mut self, handle: MarkerHandle, state: MarkerState) {
        if let Some(record) = self.markers.get_mut(handle.0) {
            trace!("marker {}: {:?} -> {:?}", record.id, record.state, state);
            record.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Host that accepts elements and reports whatever positions the test
    /// assigns to them.
    #[derive(Default)]
    struct ScriptedHost {
        elements: Vec<MarkerElement>,
        positions: Vec<Resolution>,
    }

    impl LayoutHost for ScriptedHost {
        fn push_inline(&mut self, element: MarkerElement) -> ElementKey {
            self.elements.push(element);
            ElementKey(self.elements.len() as u64)
        }

        fn layout(&mut self) -> Vec<Resolution> {
            self.positions.clone()
        }
    }

    fn at(page: usize, x_pt: f64, y_pt: f64) -> Position {
        Position {
            page,
            x: Length::pt(x_pt),
            y: Length::pt(y_pt),
        }
    }

    #[test]
    fn one_centimeter_marker_at_origin() {
        let mut ctx = BuildContext::new(RecorderConfig::default());
        let mut host = ScriptedHost::default();
        let handle = ctx.place_marker(&mut host, "A", MarkerOptions::sized(Length::pt(28.35)));
        let key = ctx.element_key(handle).unwrap();

        ctx.resolve(key, at(1, 0.0, 0.0)).unwrap();

        let bbox = ctx.registry().get("A").unwrap();
        assert_eq!(bbox.page, 1);
        assert_eq!((bbox.x.0.get(), bbox.x.1.get()), (0.0, 1.0));
        assert_eq!((bbox.y.0.get(), bbox.y.1.get()), (0.0, 1.0));
    }

    #[test]
    fn nothing_is_recorded_before_resolution() {
        let mut ctx = BuildContext::new(RecorderConfig::default());
        let mut host = ScriptedHost::default();
        let handle = ctx.place_marker(&mut host, "A", MarkerOptions::default());

        assert_eq!(host.elements, [MarkerElement::new(Length::pt(10.0), Length::ZERO)]);
        assert_eq!(ctx.state(handle), Some(MarkerState::LayoutPending));
        assert!(ctx.registry().is_empty());
        assert_eq!(ctx.pending(), 1);

        let key = ctx.element_key(handle).unwrap();
        ctx.resolve(key, at(2, 0.0, 0.0)).unwrap();
        assert_eq!(ctx.state(handle), Some(MarkerState::Recorded));
        assert_eq!(ctx.pending(), 0);
        assert_eq!(ctx.registry().get("A").unwrap().page, 2);
    }

    #[test]
    fn outset_is_not_recorded() {
        let mut ctx = BuildContext::new(RecorderConfig::default());
        let mut host = ScriptedHost::default();
        let options = MarkerOptions::sized(Length::cm(1.0)).with_outset(Length::cm(0.5));
        let handle = ctx.place_marker(&mut host, "A", options);

        assert_eq!(host.elements[0].visual_extent().to_pt(), Length::cm(2.0).to_pt());
        ctx.resolve(ctx.element_key(handle).unwrap(), at(1, 0.0, 0.0)).unwrap();
        assert_eq!(ctx.registry().get("A").unwrap().width(), 1.0);
    }

    #[test]
    fn second_resolution_is_rejected() {
        let mut ctx = BuildContext::new(RecorderConfig::default());
        let mut host = ScriptedHost::default();
        let handle = ctx.place_marker(&mut host, "A", MarkerOptions::default());
        let key = ctx.element_key(handle).unwrap();

        ctx.resolve(key, at(1, 0.0, 0.0)).unwrap();
        let before = *ctx.registry().get("A").unwrap();
        assert_eq!(ctx.resolve(key, at(3, 50.0, 50.0)), Err(ResolveError::AlreadyResolved(key)));
        assert_eq!(ctx.registry().get("A"), Some(&before));
    }

    #[test]
    fn unknown_element_is_rejected() {
        let mut ctx = BuildContext::new(RecorderConfig::default());
        let err = ctx.resolve(ElementKey(42), at(1, 0.0, 0.0)).unwrap_err();
        assert_eq!(err, ResolveError::UnknownElement(ElementKey(42)));
        assert_eq!(err.to_string(), "no marker declared for element #42");
        assert!(ctx.registry().is_empty());
    }

    #[test]
    fn zero_size_is_degenerate() {
        let bbox = bounding_box(at(1, 100.0, 200.0), Length::ZERO, PhysicalUnit::Centimeters);
        assert_eq!(bbox.x.0, bbox.x.1);
        assert_eq!(bbox.y.0, bbox.y.1);
        assert!(bbox.is_degenerate());
    }

    #[test]
    fn extent_matches_converted_size() {
        let size = Length::pt(17.3);
        let expected = to_physical(size, PhysicalUnit::Centimeters).get();
        for step in 0..200 {
            let offset = f64::from(step) * 3.7;
            let bbox = bounding_box(at(1, offset, offset * 2.0), size, PhysicalUnit::Centimeters);
            assert!((bbox.width() - expected).abs() <= 0.010_000_1, "width {} at {offset}", bbox.width());
            assert!((bbox.height() - expected).abs() <= 0.010_000_1, "height {} at {offset}", bbox.height());
        }
    }

    #[test]
    fn run_layout_drives_resolution() {
        let mut ctx = BuildContext::new(RecorderConfig::default());
        let mut host = ScriptedHost::default();
        let first = ctx.place_marker(&mut host, "A", MarkerOptions::default());
        let second = ctx.place_marker(&mut host, "B", MarkerOptions::default());
        host.positions = vec![Resolution {
            key: ctx.element_key(second).unwrap(),
            position: at(1, 0.0, 0.0),
        }];

        assert_eq!(ctx.run_layout(&mut host), Ok(PassSummary { applied: 1, repeated: 0 }));
        assert_eq!(ctx.state(first), Some(MarkerState::LayoutPending));
        assert_eq!(ctx.state(second), Some(MarkerState::Recorded));
        assert!(!ctx.registry().contains("A"));
        assert!(ctx.registry().contains("B"));
    }

    #[test]
    fn repeated_reports_do_not_block_new_markers() {
        let mut ctx = BuildContext::new(RecorderConfig::default());
        let mut host = ScriptedHost::default();
        let first = ctx.place_marker(&mut host, "A", MarkerOptions::default());
        let second = ctx.place_marker(&mut host, "B", MarkerOptions::default());
        let (a, b) = (ctx.element_key(first).unwrap(), ctx.element_key(second).unwrap());

        ctx.resolve(a, at(1, 0.0, 0.0)).unwrap();
        let before = *ctx.registry().get("A").unwrap();
        let pass = vec![
            Resolution { key: a, position: at(4, 90.0, 90.0) },
            Resolution { key: a, position: at(5, 90.0, 90.0) },
            Resolution { key: b, position: at(2, 0.0, 0.0) },
        ];

        assert_eq!(ctx.resolve_all(pass), Ok(PassSummary { applied: 1, repeated: 2 }));
        assert_eq!(ctx.state(second), Some(MarkerState::Recorded));
        assert_eq!(ctx.registry().get("A"), Some(&before));
        assert_eq!(ctx.registry().get("B").unwrap().page, 2);
    }

    #[test]
    fn unknown_elements_are_reported_after_the_pass() {
        let mut ctx = BuildContext::new(RecorderConfig::default());
        let mut host = ScriptedHost::default();
        let first = ctx.place_marker(&mut host, "A", MarkerOptions::default());
        let second = ctx.place_marker(&mut host, "B", MarkerOptions::default());
        let pass = vec![
            Resolution { key: ctx.element_key(first).unwrap(), position: at(1, 0.0, 0.0) },
            Resolution { key: ElementKey(99), position: at(1, 0.0, 0.0) },
            Resolution { key: ctx.element_key(second).unwrap(), position: at(1, 0.0, 0.0) },
        ];

        let err = ctx.resolve_all(pass).unwrap_err();
        assert_eq!(err.summary, PassSummary { applied: 2, repeated: 0 });
        assert_eq!(err.errors, [ResolveError::UnknownElement(ElementKey(99))]);
        assert_eq!(err.to_string(), "1 rejected resolution(s); no marker declared for element #99");
        assert!(ctx.registry().contains("A"));
        assert!(ctx.registry().contains("B"));
    }

    /// Host that hands out the same key for every element.
    struct StuckHost;

    impl LayoutHost for StuckHost {
        fn push_inline(&mut self, _element: MarkerElement) -> ElementKey {
            ElementKey(7)
        }

        fn layout(&mut self) -> Vec<Resolution> {
            vec![Resolution { key: ElementKey(7), position: at(3, 0.0, 0.0) }]
        }
    }

    #[test]
    fn reused_element_key_keeps_the_first_marker() {
        let mut ctx = BuildContext::new(RecorderConfig::default());
        let mut host = StuckHost;
        let first = ctx.place_marker(&mut host, "A", MarkerOptions::default());
        let second = ctx.place_marker(&mut host, "B", MarkerOptions::default());

        assert_eq!(ctx.state(second), Some(MarkerState::Declared));
        assert_eq!(ctx.pending(), 1);
        assert_eq!(ctx.run_layout(&mut host), Ok(PassSummary { applied: 1, repeated: 0 }));
        assert_eq!(ctx.state(first), Some(MarkerState::Recorded));
        assert_eq!(ctx.state(second), Some(MarkerState::Declared));
        assert_eq!(ctx.registry().get("A").unwrap().page, 3);
        assert!(!ctx.registry().contains("B"));
    }
}
