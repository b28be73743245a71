use crate::annotate::model::Point;
use serde::{Deserialize, Serialize};

/// Fixed-position offset of the document-sized canvas and helper layers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerOffset {
    pub left: f64,
    pub top: f64,
}

/// Keeps the overlay layers pinned to the document while the viewport
/// scrolls.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportSync {
    scroll: Point,
}

impl ViewportSync {
    pub fn scroll(&self) -> Point {
        self.scroll
    }

    pub fn on_scroll(&mut self, scroll: Point) -> LayerOffset {
        self.scroll = scroll;
        self.offset()
    }

    pub fn offset(&self) -> LayerOffset {
        LayerOffset {
            left: -self.scroll.x,
            top: -self.scroll.y,
        }
    }

    pub fn to_document(&self, viewport_point: Point) -> Point {
        viewport_point.offset(self.scroll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_moves_layers_opposite_to_offset() {
        let mut sync = ViewportSync::default();
        let offset = sync.on_scroll(Point::new(40.0, 1200.0));
        assert_eq!(
            offset,
            LayerOffset {
                left: -40.0,
                top: -1200.0
            }
        );
        assert_eq!(sync.to_document(Point::new(5.0, 5.0)), Point::new(45.0, 1205.0));
    }
}
