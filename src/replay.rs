//! Scripted sessions: a host stand-in that feeds recorded commands through an
//! [`AnnotationSession`] against a fixture page.

use crate::annotate::capture::SolidColorProvider;
use crate::annotate::hover::{ElementHit, HitTester};
use crate::annotate::messages::OverlayCommand;
use crate::annotate::model::{Point, Rect, Region, Size};
use crate::annotate::session::AnnotationSession;
use crate::annotate::settings::{OverlayColor, OverlaySettings};
use crate::annotate::surface::Surface;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

const OVERLAY_LAYER_TAGS: [&str; 3] = ["canvas", "div", "div"];
const CAPTURE_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    pub viewport: Size,
    pub document: Size,
    /// Page elements in document coordinates, later entries on top.
    #[serde(default)]
    pub elements: Vec<ElementHit>,
    #[serde(default = "default_screenshot_color")]
    pub screenshot_color: OverlayColor,
    pub events: Vec<OverlayCommand>,
}

fn default_screenshot_color() -> OverlayColor {
    OverlayColor::rgba(255, 255, 255, 255)
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read replay script {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("deserialize replay script {}", path.display()))
    }
}

/// Static page. Reports the overlay's own layers first, then every element
/// under the point, topmost first, in viewport coordinates.
pub struct FixtureHitTester {
    elements: Vec<ElementHit>,
    scroll: Rc<Cell<Point>>,
}

impl FixtureHitTester {
    pub fn new(elements: Vec<ElementHit>, scroll: Rc<Cell<Point>>) -> Self {
        Self { elements, scroll }
    }
}

impl HitTester for FixtureHitTester {
    fn elements_at(&self, point: Point) -> Vec<ElementHit> {
        let scroll = self.scroll.get();
        let document_point = point.offset(scroll);
        let to_viewport = Point::new(-scroll.x, -scroll.y);

        let overlay = OVERLAY_LAYER_TAGS.iter().map(|tag| ElementHit {
            tag: tag.to_string(),
            bounds: Rect::new(0.0, 0.0, f64::MAX, f64::MAX),
        });
        let page = self
            .elements
            .iter()
            .rev()
            .filter(|element| element.bounds.contains(document_point))
            .map(|element| ElementHit {
                tag: element.tag.clone(),
                bounds: element.bounds.translate(to_viewport),
            });
        overlay.chain(page).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub regions: Vec<Region>,
    pub overlay: Surface,
    pub export: Option<Surface>,
    pub effects: usize,
    pub repaints: u64,
}

pub fn run_script(script: ReplayScript, settings: OverlaySettings) -> Result<ReplayReport> {
    let scroll = Rc::new(Cell::new(Point::default()));
    let hit_tester = FixtureHitTester::new(script.elements, Rc::clone(&scroll));
    let provider = SolidColorProvider(script.screenshot_color.into());
    let mut session = AnnotationSession::new(
        settings,
        script.viewport,
        script.document,
        Box::new(hit_tester),
        Arc::new(provider),
    );

    let mut effects = 0;
    for (index, command) in script.events.into_iter().enumerate() {
        if let OverlayCommand::Scroll { x, y } = command {
            scroll.set(Point::new(x, y));
        }
        tracing::trace!(index, ?command, "replaying command");
        effects += session.dispatch(command).len();
        effects += session.pump_captures().len();
    }

    while session.captures_in_flight() > 0 {
        let applied = session.wait_for_capture(CAPTURE_WAIT);
        if applied.is_empty() && session.captures_in_flight() > 0 {
            tracing::warn!(
                pending = session.captures_in_flight(),
                "gave up waiting for screenshot captures"
            );
            break;
        }
        effects += applied.len();
    }

    let report = ReplayReport {
        regions: session.regions().to_vec(),
        overlay: session.surface().clone(),
        export: session.compose_export(),
        effects,
        repaints: session.compositor().repaint_count(),
    };
    tracing::info!(
        regions = report.regions.len(),
        effects = report.effects,
        repaints = report.repaints,
        "replay finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_reports_overlay_layers_before_page() {
        let scroll = Rc::new(Cell::new(Point::new(0.0, 100.0)));
        let tester = FixtureHitTester::new(
            vec![
                ElementHit {
                    tag: "section".into(),
                    bounds: Rect::new(0.0, 0.0, 500.0, 500.0),
                },
                ElementHit {
                    tag: "img".into(),
                    bounds: Rect::new(10.0, 110.0, 50.0, 50.0),
                },
            ],
            scroll,
        );

        let hits = tester.elements_at(Point::new(20.0, 20.0));
        let tags: Vec<&str> = hits.iter().map(|hit| hit.tag.as_str()).collect();
        assert_eq!(tags, ["canvas", "div", "div", "img", "section"]);
        assert_eq!(hits[3].bounds, Rect::new(10.0, 10.0, 50.0, 50.0));
    }
}
