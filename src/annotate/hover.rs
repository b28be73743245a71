use crate::annotate::model::{Point, Rect, RegionDraft, RegionId, RegionMode, Size};
use crate::annotate::store::RegionStore;
use serde::{Deserialize, Serialize};

/// Number of the overlay's own layers stacked above page content at any
/// point: the scrim canvas, the helper container, and one more. Hit-test
/// results start with these, so the first page element sits at this index.
pub const OVERLAY_LAYER_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementHit {
    pub tag: String,
    /// Bounding box in viewport coordinates.
    pub bounds: Rect,
}

/// Host-side element enumeration, topmost first.
pub trait HitTester {
    fn elements_at(&self, point: Point) -> Vec<ElementHit>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorStyle {
    /// Freehand drawing.
    #[default]
    Crosshair,
    /// An element under the cursor can be picked with a click.
    Pointer,
}

/// Indirect selection path: picks the element under the cursor and offers its
/// bounds as a one-click region.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverHighlighter {
    allowed_tags: Vec<String>,
    candidate: Option<Rect>,
    cursor: CursorStyle,
}

impl HoverHighlighter {
    pub fn new<I, S>(allowed_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_tags: allowed_tags
                .into_iter()
                .map(|tag| tag.as_ref().to_ascii_lowercase())
                .collect(),
            candidate: None,
            cursor: CursorStyle::Crosshair,
        }
    }

    pub fn candidate(&self) -> Option<Rect> {
        self.candidate
    }

    pub fn preview(&self, mode: RegionMode) -> Option<RegionDraft> {
        self.candidate.map(|bounds| RegionDraft::new(bounds, mode))
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn is_eligible(&self, tag: &str) -> bool {
        let tag = tag.to_ascii_lowercase();
        self.allowed_tags.iter().any(|allowed| *allowed == tag)
    }

    /// Resolves the element below the overlay layers at `point` (viewport
    /// space). `scroll` converts its bounds into document space, where they
    /// are clipped to `document`.
    pub fn pointer_move(
        &mut self,
        point: Point,
        scroll: Point,
        document: Size,
        hits: &dyn HitTester,
    ) -> CursorStyle {
        let bounds = hits
            .elements_at(point)
            .into_iter()
            .nth(OVERLAY_LAYER_DEPTH)
            .filter(|hit| self.is_eligible(&hit.tag))
            .and_then(|hit| hit.bounds.translate(scroll).clip_to(document));

        match bounds {
            Some(bounds) => {
                self.candidate = Some(bounds);
                self.cursor = CursorStyle::Pointer;
            }
            None => {
                self.candidate = None;
                self.cursor = CursorStyle::Crosshair;
            }
        }
        self.cursor
    }

    /// Commits the current candidate through the same path as a drawn
    /// region. The candidate is consumed either way.
    pub fn click(&mut self, mode: RegionMode, store: &mut RegionStore) -> Option<RegionId> {
        let bounds = self.candidate.take()?;
        let id = store.add(RegionDraft::new(bounds, mode));
        match id {
            Some(id) => tracing::debug!(%id, ?mode, ?bounds, "element region picked"),
            None => tracing::debug!(?bounds, "picked element below minimum extent"),
        }
        id
    }

    pub fn clear(&mut self) {
        self.candidate = None;
    }
}
