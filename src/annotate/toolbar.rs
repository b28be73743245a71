use crate::annotate::model::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// 2D translation applied to the toolbar panel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation {
    pub dx: f64,
    pub dy: f64,
}

impl Translation {
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn then(self, next: Translation) -> Translation {
        Translation::new(self.dx + next.dx, self.dy + next.dy)
    }

    fn as_point(self) -> Point {
        Point::new(self.dx, self.dy)
    }
}

/// How far the panel may travel from where the drag started.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragLimits {
    pub x_neg: f64,
    pub x_pos: f64,
    pub y_neg: f64,
    pub y_pos: f64,
}

impl DragLimits {
    pub fn between(panel: Rect, viewport: Size) -> Self {
        Self {
            x_neg: -panel.left(),
            x_pos: viewport.width - panel.right(),
            y_neg: -panel.top(),
            y_pos: viewport.height - panel.bottom(),
        }
    }

    fn clamp(&self, delta: Point) -> Translation {
        Translation::new(
            clamp_axis(delta.x, self.x_neg, self.x_pos),
            clamp_axis(delta.y, self.y_neg, self.y_pos),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolbarDragState {
    Idle,
    Dragging {
        anchor: Point,
        limits: DragLimits,
        moved: bool,
    },
}

/// Repositions the floating control panel. The panel's resting rect is
/// given with no translation applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarDragger {
    resting: Rect,
    base: Translation,
    delta: Translation,
    state: ToolbarDragState,
}

impl ToolbarDragger {
    pub fn new(resting: Rect) -> Self {
        Self {
            resting,
            base: Translation::default(),
            delta: Translation::default(),
            state: ToolbarDragState::Idle,
        }
    }

    /// Panel centred in the viewport.
    pub fn centered(panel: Size, viewport: Size) -> Self {
        Self::new(Rect::new(
            (viewport.width - panel.width) / 2.0,
            (viewport.height - panel.height) / 2.0,
            panel.width,
            panel.height,
        ))
    }

    pub fn state(&self) -> ToolbarDragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ToolbarDragState::Dragging { .. })
    }

    pub fn base(&self) -> Translation {
        self.base
    }

    /// Currently displayed translation: base plus any in-flight delta.
    pub fn transform(&self) -> Translation {
        if self.is_dragging() {
            self.base.then(self.delta)
        } else {
            self.base
        }
    }

    pub fn panel_rect(&self) -> Rect {
        self.resting.translate(self.transform().as_point())
    }

    pub fn pointer_down(&mut self, point: Point, viewport: Size) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.delta = Translation::default();
        self.state = ToolbarDragState::Dragging {
            anchor: point,
            limits: DragLimits::between(self.panel_rect(), viewport),
            moved: false,
        };
        true
    }

    pub fn pointer_move(&mut self, point: Point) -> Option<Translation> {
        let ToolbarDragState::Dragging {
            anchor,
            limits,
            moved,
        } = &mut self.state
        else {
            return None;
        };

        let delta = Point::new(point.x - anchor.x, point.y - anchor.y);
        self.delta = limits.clamp(delta);
        *moved = true;
        Some(self.base.then(self.delta))
    }

    /// Ends the drag. Returns true when the delta was folded into the base.
    pub fn pointer_up(&mut self) -> bool {
        let ToolbarDragState::Dragging { moved, .. } =
            std::mem::replace(&mut self.state, ToolbarDragState::Idle)
        else {
            return false;
        };

        if moved {
            self.base = self.base.then(self.delta);
            tracing::debug!(dx = self.base.dx, dy = self.base.dy, "toolbar moved");
        }
        self.delta = Translation::default();
        moved
    }
}

/// Clamps to `[neg, pos]` (lower bound first), then rounds half-up while
/// staying inside the limits.
fn clamp_axis(value: f64, neg: f64, pos: f64) -> f64 {
    let mut next = value;
    if next < neg {
        next = neg;
    }
    if next > pos {
        next = pos;
    }

    let rounded = (next + 0.5).floor();
    if rounded > pos {
        pos.floor()
    } else if rounded < neg {
        neg.ceil().min(pos.floor())
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(800.0, 600.0);

    fn dragger_at(x: f64, y: f64) -> ToolbarDragger {
        ToolbarDragger::new(Rect::new(x, y, 200.0, 40.0))
    }

    #[test]
    fn drag_far_up_left_stops_at_viewport_corner() {
        let mut dragger = dragger_at(0.0, 0.0);
        dragger.pointer_down(Point::new(10.0, 10.0), VIEWPORT);
        dragger.pointer_move(Point::new(-9999.0, -9999.0));
        assert!(dragger.pointer_up());

        let rect = dragger.panel_rect();
        assert_eq!((rect.x, rect.y), (0.0, 0.0));
    }

    #[test]
    fn drag_far_down_right_keeps_panel_inside() {
        let mut dragger = ToolbarDragger::centered(Size::new(200.0, 40.0), VIEWPORT);
        dragger.pointer_down(Point::new(400.0, 300.0), VIEWPORT);
        let shown = dragger.pointer_move(Point::new(9999.0, 9999.0)).expect("dragging");
        assert_eq!(shown, Translation::new(300.0, 280.0));
        dragger.pointer_up();

        let rect = dragger.panel_rect();
        assert_eq!(rect.right(), 800.0);
        assert_eq!(rect.bottom(), 600.0);
    }

    #[test]
    fn delta_is_rounded_to_whole_units() {
        let mut dragger = dragger_at(100.0, 100.0);
        dragger.pointer_down(Point::new(0.0, 0.0), VIEWPORT);
        let shown = dragger.pointer_move(Point::new(10.5, -3.4)).expect("dragging");
        assert_eq!(shown, Translation::new(11.0, -3.0));
    }

    #[test]
    fn second_drag_limits_follow_new_resting_position() {
        let mut dragger = dragger_at(100.0, 100.0);
        dragger.pointer_down(Point::new(0.0, 0.0), VIEWPORT);
        dragger.pointer_move(Point::new(-50.0, 0.0));
        dragger.pointer_up();
        assert_eq!(dragger.base(), Translation::new(-50.0, 0.0));

        dragger.pointer_down(Point::new(0.0, 0.0), VIEWPORT);
        let shown = dragger.pointer_move(Point::new(-500.0, 0.0)).expect("dragging");
        assert_eq!(shown, Translation::new(-100.0, 0.0));
    }

    #[test]
    fn click_without_move_keeps_base() {
        let mut dragger = dragger_at(100.0, 100.0);
        dragger.pointer_down(Point::new(0.0, 0.0), VIEWPORT);
        assert!(!dragger.pointer_up());
        assert_eq!(dragger.base(), Translation::default());
        assert!(!dragger.pointer_up());
    }

    #[test]
    fn move_without_drag_is_ignored() {
        let mut dragger = dragger_at(100.0, 100.0);
        assert_eq!(dragger.pointer_move(Point::new(5.0, 5.0)), None);
    }
}
