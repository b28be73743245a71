use crate::annotate::capture::{
    CaptureOutcome, CaptureRequest, CaptureWorker, Screenshot, ScreenshotProvider,
};
use crate::annotate::composite::{CanvasCompositor, CompositorStyle, Scene};
use crate::annotate::draw::{DrawController, DrawOutcome};
use crate::annotate::hover::{CursorStyle, HitTester, HoverHighlighter};
use crate::annotate::messages::{Key, OverlayCommand, OverlayEffect, PointerTarget};
use crate::annotate::model::{Point, Rect, Region, RegionDraft, RegionId, RegionMode, Size};
use crate::annotate::settings::OverlaySettings;
use crate::annotate::store::RegionStore;
use crate::annotate::surface::Surface;
use crate::annotate::toolbar::ToolbarDragger;
use crate::annotate::viewport::{LayerOffset, ViewportSync};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Closed,
    /// Feedback form visible, canvas passive.
    Form,
    /// Drawer open: canvas takes pointer input, toolbar is draggable.
    Placement,
}

/// One open/close cycle of the overlay. Owns every component and routes
/// host commands between them; nothing else touches the canvas.
pub struct AnnotationSession {
    settings: OverlaySettings,
    phase: SessionPhase,
    mode: RegionMode,
    include_screenshot: bool,
    viewport_size: Size,
    document: Size,
    store: RegionStore,
    compositor: CanvasCompositor,
    draw: DrawController,
    hover: HoverHighlighter,
    toolbar: Option<ToolbarDragger>,
    viewport: ViewportSync,
    focused: Option<RegionId>,
    screenshot: Option<Screenshot>,
    capture: CaptureWorker,
    hit_tester: Box<dyn HitTester>,
    epoch: u64,
}

impl AnnotationSession {
    pub fn new(
        settings: OverlaySettings,
        viewport: Size,
        document: Size,
        hit_tester: Box<dyn HitTester>,
        provider: Arc<dyn ScreenshotProvider>,
    ) -> Self {
        let settings = settings.sanitized();
        let compositor = CanvasCompositor::new(
            document.to_pixels(),
            CompositorStyle::from_settings(&settings),
        );
        Self {
            phase: SessionPhase::Closed,
            mode: RegionMode::default(),
            include_screenshot: settings.include_screenshot,
            viewport_size: viewport,
            document,
            store: RegionStore::new(settings.min_region_extent),
            compositor,
            draw: DrawController::new(settings.border_width as f64),
            hover: HoverHighlighter::new(&settings.allowed_tags),
            toolbar: None,
            viewport: ViewportSync::default(),
            focused: None,
            screenshot: None,
            capture: CaptureWorker::new(provider),
            hit_tester,
            epoch: 0,
            settings,
        }
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != SessionPhase::Closed
    }

    pub fn mode(&self) -> RegionMode {
        self.mode
    }

    pub fn include_screenshot(&self) -> bool {
        self.include_screenshot
    }

    pub fn regions(&self) -> &[Region] {
        self.store.all()
    }

    pub fn surface(&self) -> &Surface {
        self.compositor.surface()
    }

    pub fn compositor(&self) -> &CanvasCompositor {
        &self.compositor
    }

    pub fn screenshot(&self) -> Option<&Screenshot> {
        self.screenshot.as_ref()
    }

    pub fn toolbar(&self) -> Option<&ToolbarDragger> {
        self.toolbar.as_ref()
    }

    pub fn cursor(&self) -> CursorStyle {
        self.hover.cursor()
    }

    pub fn hover_candidate(&self) -> Option<Rect> {
        self.hover.candidate()
    }

    pub fn focused(&self) -> Option<RegionId> {
        self.focused
    }

    pub fn layer_offset(&self) -> LayerOffset {
        self.viewport.offset()
    }

    pub fn captures_in_flight(&self) -> usize {
        self.capture.in_flight()
    }

    pub fn dispatch(&mut self, command: OverlayCommand) -> Vec<OverlayEffect> {
        let mut effects = Vec::new();

        if self.phase == SessionPhase::Closed {
            if matches!(command, OverlayCommand::Open) {
                self.open(&mut effects);
            } else {
                tracing::trace!(?command, "command ignored while closed");
            }
            return effects;
        }

        match command {
            OverlayCommand::Open => {}
            OverlayCommand::Close | OverlayCommand::KeyDown { key: Key::Escape } => {
                self.close(&mut effects);
            }
            OverlayCommand::KeyDown { key: Key::Other } => {}
            OverlayCommand::OpenPlacement => self.open_placement(&mut effects),
            OverlayCommand::FinishPlacement => self.finish_placement(&mut effects),
            OverlayCommand::SetMode { mode } => {
                self.mode = mode;
            }
            OverlayCommand::ToggleScreenshot => {
                self.include_screenshot = !self.include_screenshot;
                tracing::debug!(include = self.include_screenshot, "screenshot toggled");
                if self.include_screenshot {
                    self.request_capture(&mut effects);
                }
            }
            OverlayCommand::PointerDown { point, target } => self.pointer_down(point, target),
            OverlayCommand::PointerMove { point } => self.pointer_move(point, &mut effects),
            OverlayCommand::PointerUp { point } => self.pointer_up(point, &mut effects),
            OverlayCommand::Click => self.click(&mut effects),
            OverlayCommand::Scroll { x, y } => {
                let offset = self.viewport.on_scroll(Point::new(x, y));
                effects.push(OverlayEffect::LayersMoved(offset));
            }
            OverlayCommand::Resize { viewport, document } => {
                self.viewport_size = viewport;
                self.document = document;
                if self.compositor.resize(document.to_pixels()) {
                    tracing::debug!(?document, "canvas resized");
                }
                self.repaint(&mut effects);
            }
            OverlayCommand::RemoveRegion { id } => {
                if self.store.remove(id) {
                    if self.focused == Some(id) {
                        self.focused = None;
                    }
                    effects.push(OverlayEffect::RegionRemoved(id));
                    self.repaint(&mut effects);
                }
            }
            OverlayCommand::FocusRegion { id } => {
                if self.phase == SessionPhase::Placement
                    && !self.draw.is_drawing()
                    && self.store.get(id).is_some()
                {
                    self.focused = Some(id);
                    effects.push(OverlayEffect::RegionFocused(Some(id)));
                    self.repaint(&mut effects);
                }
            }
            OverlayCommand::BlurRegion { id } => {
                if self.focused == Some(id) {
                    self.focused = None;
                    effects.push(OverlayEffect::RegionFocused(None));
                    self.repaint(&mut effects);
                }
            }
        }
        effects
    }

    /// Applies every capture outcome that has arrived so far.
    pub fn pump_captures(&mut self) -> Vec<OverlayEffect> {
        let mut effects = Vec::new();
        while let Some(outcome) = self.capture.try_recv() {
            self.apply_capture(outcome, &mut effects);
        }
        effects
    }

    /// Blocks for up to `timeout` on the next capture outcome, then drains
    /// whatever else is ready.
    pub fn wait_for_capture(&mut self, timeout: Duration) -> Vec<OverlayEffect> {
        let mut effects = Vec::new();
        if let Some(outcome) = self.capture.recv_timeout(timeout) {
            self.apply_capture(outcome, &mut effects);
        }
        effects.extend(self.pump_captures());
        effects
    }

    /// The image attached to a submission: the last capture with the
    /// borderless overlay laid over it. `None` when the user opted out.
    pub fn compose_export(&self) -> Option<Surface> {
        if !self.include_screenshot {
            return None;
        }
        let (base, origin) = match &self.screenshot {
            Some(shot) => (shot.surface.clone(), shot.origin_pixels()),
            None => {
                let (width, height) = self.viewport_size.to_pixels();
                let scroll = self.viewport.scroll();
                (
                    Surface::transparent(width, height),
                    (scroll.x.round() as i32, scroll.y.round() as i32),
                )
            }
        };
        Some(self.compositor.compose_over(&base, origin, self.store.all()))
    }

    fn open(&mut self, effects: &mut Vec<OverlayEffect>) {
        self.phase = SessionPhase::Form;
        tracing::info!(epoch = self.epoch, "overlay opened");
        effects.push(OverlayEffect::LayersMoved(self.viewport.offset()));
        self.repaint(effects);
        if self.include_screenshot {
            self.request_capture(effects);
        }
    }

    fn close(&mut self, effects: &mut Vec<OverlayEffect>) {
        self.store.reset();
        self.draw.cancel();
        self.hover.clear();
        self.toolbar = None;
        self.focused = None;
        self.screenshot = None;
        self.mode = RegionMode::default();
        self.include_screenshot = self.settings.include_screenshot;
        self.phase = SessionPhase::Closed;
        self.epoch += 1;
        tracing::info!(epoch = self.epoch, "overlay closed");
        effects.push(OverlayEffect::Closed);
    }

    fn open_placement(&mut self, effects: &mut Vec<OverlayEffect>) {
        if self.phase != SessionPhase::Form {
            return;
        }
        self.phase = SessionPhase::Placement;
        let toolbar = ToolbarDragger::centered(self.settings.toolbar_size, self.viewport_size);
        effects.push(OverlayEffect::ToolbarMoved(toolbar.base()));
        self.toolbar = Some(toolbar);
        effects.push(OverlayEffect::CursorChanged(self.hover.cursor()));
    }

    fn finish_placement(&mut self, effects: &mut Vec<OverlayEffect>) {
        if self.phase != SessionPhase::Placement {
            return;
        }
        self.phase = SessionPhase::Form;
        self.toolbar = None;
        self.draw.cancel();
        self.hover.clear();
        self.focused = None;
        self.repaint(effects);
        if self.include_screenshot {
            self.request_capture(effects);
        }
    }

    fn pointer_down(&mut self, point: Point, target: PointerTarget) {
        if self.phase != SessionPhase::Placement {
            return;
        }
        match target {
            PointerTarget::ToolbarHandle => {
                if self.draw.is_drawing() {
                    return;
                }
                if let Some(toolbar) = self.toolbar.as_mut() {
                    toolbar.pointer_down(point, self.viewport_size);
                }
            }
            PointerTarget::Canvas => {
                if self.toolbar_dragging() {
                    return;
                }
                self.draw.pointer_down(self.viewport.to_document(point));
            }
        }
    }

    fn pointer_move(&mut self, point: Point, effects: &mut Vec<OverlayEffect>) {
        if let Some(toolbar) = self.toolbar.as_mut() {
            if let Some(transform) = toolbar.pointer_move(point) {
                effects.push(OverlayEffect::ToolbarMoved(transform));
                return;
            }
        }

        if self.draw.is_drawing() {
            self.hover.clear();
            self.draw
                .pointer_move(self.viewport.to_document(point), self.document);
            self.repaint(effects);
            return;
        }

        if self.phase == SessionPhase::Placement {
            let before = self.hover.cursor();
            let cursor = self.hover.pointer_move(
                point,
                self.viewport.scroll(),
                self.document,
                self.hit_tester.as_ref(),
            );
            if cursor != before {
                effects.push(OverlayEffect::CursorChanged(cursor));
            }
            self.repaint(effects);
        }
    }

    fn pointer_up(&mut self, point: Point, effects: &mut Vec<OverlayEffect>) {
        if let Some(toolbar) = self.toolbar.as_mut() {
            if toolbar.is_dragging() {
                if toolbar.pointer_up() {
                    effects.push(OverlayEffect::ToolbarMoved(toolbar.base()));
                }
                return;
            }
        }

        let outcome = self.draw.pointer_up(
            self.viewport.to_document(point),
            self.document,
            self.mode,
            &mut self.store,
        );
        match outcome {
            DrawOutcome::Ignored => {}
            DrawOutcome::Discarded => self.repaint(effects),
            DrawOutcome::Committed(id) => {
                self.push_added(id, effects);
                self.repaint(effects);
            }
        }
    }

    fn click(&mut self, effects: &mut Vec<OverlayEffect>) {
        if self.phase != SessionPhase::Placement || self.draw.is_drawing() || self.toolbar_dragging()
        {
            return;
        }
        if let Some(id) = self.hover.click(self.mode, &mut self.store) {
            self.push_added(id, effects);
            self.repaint(effects);
        }
    }

    fn push_added(&self, id: RegionId, effects: &mut Vec<OverlayEffect>) {
        if let Some(region) = self.store.get(id) {
            effects.push(OverlayEffect::RegionAdded(*region));
        }
    }

    fn toolbar_dragging(&self) -> bool {
        self.toolbar
            .as_ref()
            .is_some_and(|toolbar| toolbar.is_dragging())
    }

    fn active_draft(&self) -> Option<RegionDraft> {
        if self.draw.is_drawing() {
            return self.draw.preview(self.mode, self.store.min_extent());
        }
        if self.phase == SessionPhase::Placement {
            return self.hover.preview(self.mode);
        }
        None
    }

    fn repaint(&mut self, effects: &mut Vec<OverlayEffect>) {
        let scene = Scene {
            regions: self.store.all(),
            active: self.active_draft(),
            focused: self.focused,
            borders: true,
        };
        self.compositor.repaint(&scene);
        effects.push(OverlayEffect::Repainted);
    }

    fn request_capture(&mut self, effects: &mut Vec<OverlayEffect>) {
        let request = CaptureRequest {
            viewport: self.viewport_size,
            scroll: self.viewport.scroll(),
        };
        let sequence = self.capture.request(request, self.epoch);
        tracing::debug!(sequence, epoch = self.epoch, "screenshot requested");
        effects.push(OverlayEffect::CaptureRequested { sequence, request });
    }

    fn apply_capture(&mut self, outcome: CaptureOutcome, effects: &mut Vec<OverlayEffect>) {
        let CaptureOutcome {
            sequence,
            epoch,
            request,
            result,
        } = outcome;

        if epoch != self.epoch || !self.is_open() {
            tracing::debug!(sequence, epoch, "stale capture discarded");
            return;
        }

        match result {
            Ok(surface) => {
                tracing::debug!(sequence, size = ?surface.size(), "screenshot received");
                self.screenshot = Some(Screenshot {
                    surface,
                    origin: request.scroll,
                });
                self.repaint(effects);
            }
            Err(err) => {
                tracing::warn!(?err, sequence, "screenshot capture failed; keeping previous image");
            }
        }
    }
}
