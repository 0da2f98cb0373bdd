//! A minimal line and page flow engine.
//!
//! Items are laid out left to right into lines that wrap at the content
//! width; lines stack downwards and overflow onto a new page. Every pass
//! re-lays the whole document and reports every marker it placed.

use std::collections::HashSet;

use log::{debug, trace};
use pagemark::{ElementKey, LayoutHost, Length, MarkerElement, Position, Resolution};

/// Page size and uniform margin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: Length,
    pub height: Length,
    pub margin: Length,
}

impl PageGeometry {
    pub fn new(width: Length, height: Length, margin: Length) -> Self {
        Self { width, height, margin }
    }

    /// ISO A4 with 2.5cm margins.
    pub fn a4() -> Self {
        Self::new(Length::mm(210.0), Length::mm(297.0), Length::cm(2.5))
    }

    fn content_width(&self) -> Length {
        self.width - self.margin * 2.0
    }

    fn content_bottom(&self) -> Length {
        self.height - self.margin
    }
}

#[derive(Clone, Copy, Debug)]
enum FlowItem {
    Marker { key: ElementKey, element: MarkerElement },
    Text { width: Length, height: Length },
    LineBreak,
    PageBreak,
}

/// An item placed in the line being built: optional marker key, offset from
/// the line start and height.
type LineEntry = (Option<ElementKey>, Length, Length);

struct Cursor {
    geometry: PageGeometry,
    line_gap: Length,
    page: usize,
    y: Length,
    line: Vec<LineEntry>,
    line_width: Length,
}

impl Cursor {
    fn new(geometry: PageGeometry, line_gap: Length) -> Self {
        Self {
            geometry,
            line_gap,
            page: 1,
            y: geometry.margin,
            line: Vec::new(),
            line_width: Length::ZERO,
        }
    }

    fn push(&mut self, key: Option<ElementKey>, width: Length, height: Length, out: &mut Vec<Resolution>) {
        if !self.line.is_empty() && self.line_width + width > self.geometry.content_width() {
            self.finish_line(out);
        }
        self.line.push((key, self.line_width, height));
        self.line_width = self.line_width + width;
    }

    fn finish_line(&mut self, out: &mut Vec<Resolution>) {
        if self.line.is_empty() {
            return;
        }
        let height = self
            .line
            .iter()
            .fold(Length::ZERO, |tallest, &(_, _, item_height)| tallest.max(item_height));
        if self.y > self.geometry.margin && self.y + height > self.geometry.content_bottom() {
            self.next_page();
        }
        for &(key, offset, _) in &self.line {
            if let Some(key) = key {
                out.push(Resolution {
                    key,
                    position: Position {
                        page: self.page,
                        x: self.geometry.margin + offset,
                        y: self.y,
                    },
                });
            }
        }
        self.y = self.y + height + self.line_gap;
        self.line.clear();
        self.line_width = Length::ZERO;
    }

    fn next_page(&mut self) {
        self.page += 1;
        self.y = self.geometry.margin;
    }
}

/// A flow layout engine that hosts markers.
pub struct FlowEngine {
    geometry: PageGeometry,
    line_gap: Length,
    items: Vec<FlowItem>,
    discarded: HashSet<ElementKey>,
    next_key: u64,
    passes: usize,
}

impl FlowEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            line_gap: Length::ZERO,
            items: Vec::new(),
            discarded: HashSet::new(),
            next_key: 0,
            passes: 0,
        }
    }

    /// Vertical space inserted after every line.
    #[must_use]
    pub fn with_line_gap(mut self, gap: Length) -> Self {
        self.line_gap = gap;
        self
    }

    /// Append an inline run of text occupying `width` by `height`.
    pub fn push_text(&mut self, width: Length, height: Length) {
        self.items.push(FlowItem::Text { width, height });
    }

    /// End the current line.
    pub fn line_break(&mut self) {
        self.items.push(FlowItem::LineBreak);
    }

    /// End the current page.
    pub fn page_break(&mut self) {
        self.items.push(FlowItem::PageBreak);
    }

    /// Drop an element before layout, as an engine does for hidden content.
    /// The element still takes up space but is never reported.
    pub fn discard(&mut self, key: ElementKey) {
        self.discarded.insert(key);
    }

    /// Markers accepted so far, in document order.
    pub fn markers(&self) -> Vec<(ElementKey, MarkerElement)> {
        self.items
            .iter()
            .filter_map(|item| match *item {
                FlowItem::Marker { key, element } => Some((key, element)),
                FlowItem::Text { .. } | FlowItem::LineBreak | FlowItem::PageBreak => None,
            })
            .collect()
    }

    /// Number of layout passes run.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

impl LayoutHost for FlowEngine {
    fn push_inline(&mut self, element: MarkerElement) -> ElementKey {
        self.next_key += 1;
        let key = ElementKey(self.next_key);
        trace!("flow accepted marker element {key}");
        self.items.push(FlowItem::Marker { key, element });
        key
    }

    fn layout(&mut self) -> Vec<Resolution> {
        self.passes += 1;
        let mut cursor = Cursor::new(self.geometry, self.line_gap);
        let mut out = Vec::new();
        for item in &self.items {
            match *item {
                FlowItem::Marker { key, element } => {
                    cursor.push(Some(key), element.size, element.size, &mut out);
                }
                FlowItem::Text { width, height } => cursor.push(None, width, height, &mut out),
                FlowItem::LineBreak => cursor.finish_line(&mut out),
                FlowItem::PageBreak => {
                    cursor.finish_line(&mut out);
                    cursor.next_page();
                }
            }
        }
        cursor.finish_line(&mut out);
        out.retain(|resolution| !self.discarded.contains(&resolution.key));
        debug!("flow pass {} placed {} marker(s) over {} page(s)", self.passes, out.len(), cursor.page);
        out
    }
}
