use crate::annotate::model::{Point, Rect, RegionDraft, RegionId, RegionMode, Size, BORDER_WIDTH};
use crate::annotate::store::RegionStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawState {
    Idle,
    Drawing { draft: Rect },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Pointer-up without an active gesture.
    Ignored,
    Discarded,
    Committed(RegionId),
}

/// Turns canvas pointer gestures into committed regions. All points are in
/// document space.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawController {
    state: DrawState,
    edge_margin: f64,
}

impl Default for DrawController {
    fn default() -> Self {
        Self::new(BORDER_WIDTH)
    }
}

impl DrawController {
    pub fn new(edge_margin: f64) -> Self {
        Self {
            state: DrawState::Idle,
            edge_margin,
        }
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    pub fn draft(&self) -> Option<Rect> {
        match self.state {
            DrawState::Drawing { draft } => Some(draft),
            DrawState::Idle => None,
        }
    }

    /// The draft as it should be painted: only once both extents exceed
    /// `min_extent`.
    pub fn preview(&self, mode: RegionMode, min_extent: f64) -> Option<RegionDraft> {
        self.draft()
            .filter(|draft| draft.exceeds_extent(min_extent))
            .map(|draft| RegionDraft::new(draft, mode))
    }

    pub fn pointer_down(&mut self, point: Point) -> bool {
        if self.is_drawing() {
            return false;
        }
        self.state = DrawState::Drawing {
            draft: Rect::new(point.x, point.y, 0.0, 0.0),
        };
        true
    }

    pub fn pointer_move(&mut self, point: Point, document: Size) -> Option<Rect> {
        let DrawState::Drawing { draft } = &mut self.state else {
            return None;
        };

        draft.width = point.x - draft.x;
        draft.height = point.y - draft.y;
        draft.width = clamp_extent(draft.x, draft.width, document.width, self.edge_margin);
        draft.height = clamp_extent(draft.y, draft.height, document.height, self.edge_margin);
        Some(*draft)
    }

    /// Applies the release point, then commits the draft when it clears the
    /// store's threshold.
    pub fn pointer_up(
        &mut self,
        point: Point,
        document: Size,
        mode: RegionMode,
        store: &mut RegionStore,
    ) -> DrawOutcome {
        if self.pointer_move(point, document).is_none() {
            return DrawOutcome::Ignored;
        }
        let DrawState::Drawing { draft } = std::mem::replace(&mut self.state, DrawState::Idle)
        else {
            return DrawOutcome::Ignored;
        };

        match store.add(RegionDraft::new(draft, mode)) {
            Some(id) => {
                tracing::debug!(%id, ?mode, ?draft, "region drawn");
                DrawOutcome::Committed(id)
            }
            None => {
                tracing::debug!(?draft, "draft below minimum extent discarded");
                DrawOutcome::Discarded
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = DrawState::Idle;
    }
}

/// Keeps `start + extent` inside `[0, limit]`, leaving `margin` at the
/// clamped edge so the border stays on the canvas.
fn clamp_extent(start: f64, extent: f64, limit: f64, margin: f64) -> f64 {
    if start + extent > limit {
        return limit - start - margin;
    }
    if start + extent < 0.0 {
        return -start + margin;
    }
    extent
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: Size = Size::new(1000.0, 800.0);

    fn gesture(from: (f64, f64), to: (f64, f64), store: &mut RegionStore) -> DrawOutcome {
        let mut draw = DrawController::default();
        assert!(draw.pointer_down(Point::new(from.0, from.1)));
        let _ = draw.pointer_move(Point::new(to.0, to.1), DOC);
        draw.pointer_up(Point::new(to.0, to.1), DOC, RegionMode::Reveal, store)
    }

    #[test]
    fn reverse_drag_commits_normalized_region() {
        let mut store = RegionStore::default();
        let outcome = gesture((100.0, 100.0), (50.0, 40.0), &mut store);
        assert_eq!(outcome, DrawOutcome::Committed(RegionId(0)));
        assert_eq!(store.all()[0].bounds, Rect::new(50.0, 40.0, 50.0, 60.0));
    }

    #[test]
    fn tiny_drag_is_discarded() {
        let mut store = RegionStore::default();
        assert_eq!(
            gesture((10.0, 10.0), (12.0, 11.0), &mut store),
            DrawOutcome::Discarded
        );
        assert!(store.is_empty());
    }

    #[test]
    fn six_by_six_is_committed() {
        let mut store = RegionStore::default();
        assert_eq!(
            gesture((10.0, 10.0), (16.0, 16.0), &mut store),
            DrawOutcome::Committed(RegionId(0))
        );
    }

    #[test]
    fn release_point_is_applied_without_prior_move() {
        let mut store = RegionStore::default();
        let mut draw = DrawController::default();
        draw.pointer_down(Point::new(20.0, 20.0));
        let outcome = draw.pointer_up(Point::new(60.0, 50.0), DOC, RegionMode::Conceal, &mut store);
        assert_eq!(outcome, DrawOutcome::Committed(RegionId(0)));
        assert_eq!(store.all()[0].bounds, Rect::new(20.0, 20.0, 40.0, 30.0));
        assert_eq!(store.all()[0].mode, RegionMode::Conceal);
    }

    #[test]
    fn draft_is_clamped_inside_document_with_border_margin() {
        let mut draw = DrawController::default();
        draw.pointer_down(Point::new(900.0, 700.0));
        let draft = draw.pointer_move(Point::new(5000.0, 5000.0), DOC).expect("drawing");
        assert_eq!(draft.width, 96.0);
        assert_eq!(draft.height, 96.0);

        let draft = draw.pointer_move(Point::new(-50.0, -10.0), DOC).expect("drawing");
        assert_eq!(draft.width, -896.0);
        assert_eq!(draft.height, -696.0);
    }

    #[test]
    fn pointer_up_while_idle_is_ignored() {
        let mut store = RegionStore::default();
        let mut draw = DrawController::default();
        assert_eq!(
            draw.pointer_up(Point::new(1.0, 1.0), DOC, RegionMode::Reveal, &mut store),
            DrawOutcome::Ignored
        );
    }

    #[test]
    fn preview_requires_extent_strictly_above_threshold() {
        let mut draw = DrawController::default();
        draw.pointer_down(Point::new(0.0, 0.0));
        draw.pointer_move(Point::new(6.0, 6.0), DOC);
        assert_eq!(draw.preview(RegionMode::Reveal, 6.0), None);
        draw.pointer_move(Point::new(7.0, 7.0), DOC);
        assert!(draw.preview(RegionMode::Reveal, 6.0).is_some());
    }
}
