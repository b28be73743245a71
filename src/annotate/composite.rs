use crate::annotate::model::{Region, RegionDraft, RegionId, RegionMode};
use crate::annotate::settings::OverlaySettings;
use crate::annotate::surface::{Rgba, Surface};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorStyle {
    pub scrim: Rgba,
    pub accent: Rgba,
    pub border_width: f64,
    pub conceal: Rgba,
    pub conceal_preview: Rgba,
    pub conceal_focus: Rgba,
}

impl Default for CompositorStyle {
    fn default() -> Self {
        Self::from_settings(&OverlaySettings::default())
    }
}

impl CompositorStyle {
    pub fn from_settings(settings: &OverlaySettings) -> Self {
        Self {
            scrim: settings.scrim_color(),
            accent: settings.accent_color.into(),
            border_width: settings.border_width as f64,
            conceal: Rgba::BLACK,
            conceal_preview: Rgba::BLACK.with_alpha(settings.conceal_preview_alpha),
            conceal_focus: Rgba::BLACK.with_alpha(settings.conceal_focus_alpha),
        }
    }
}

/// Everything one repaint reads. `regions` is a snapshot for the duration of
/// the paint.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub regions: &'a [Region],
    /// Draft or hover candidate, already filtered for visibility.
    pub active: Option<RegionDraft>,
    pub focused: Option<RegionId>,
    pub borders: bool,
}

impl<'a> Scene<'a> {
    pub fn committed(regions: &'a [Region]) -> Self {
        Self {
            regions,
            active: None,
            focused: None,
            borders: true,
        }
    }
}

/// Owns the document-sized overlay surface. Other components ask for a
/// repaint instead of drawing on it.
#[derive(Debug, Clone)]
pub struct CanvasCompositor {
    surface: Surface,
    style: CompositorStyle,
    repaints: u64,
}

impl CanvasCompositor {
    pub fn new(size: (u32, u32), style: CompositorStyle) -> Self {
        Self {
            surface: Surface::transparent(size.0, size.1),
            style,
            repaints: 0,
        }
    }

    pub fn style(&self) -> &CompositorStyle {
        &self.style
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn repaint_count(&self) -> u64 {
        self.repaints
    }

    /// Reallocates the surface when the document size changed. The caller
    /// repaints afterwards.
    pub fn resize(&mut self, size: (u32, u32)) -> bool {
        if self.surface.size() == size {
            return false;
        }
        self.surface = Surface::transparent(size.0, size.1);
        true
    }

    pub fn repaint(&mut self, scene: &Scene<'_>) {
        paint_scene(&mut self.surface, &self.style, scene);
        self.repaints += 1;
    }

    /// Lays the borderless overlay, cropped at `origin`, over `base`.
    pub fn compose_over(&self, base: &Surface, origin: (i32, i32), regions: &[Region]) -> Surface {
        let mut layer = Surface::transparent(self.surface.width(), self.surface.height());
        let scene = Scene {
            borders: false,
            ..Scene::committed(regions)
        };
        paint_scene(&mut layer, &self.style, &scene);

        let mut output = base.clone();
        output.draw_over(&layer, origin);
        output
    }
}

/// Full repaint. Every conceal paint happens after every reveal paint so a
/// reveal can never uncover concealed pixels.
pub fn paint_scene(surface: &mut Surface, style: &CompositorStyle, scene: &Scene<'_>) {
    surface.fill(style.scrim);

    let active_reveal = scene
        .active
        .filter(|draft| draft.mode == RegionMode::Reveal)
        .map(|draft| draft.bounds);
    let reveals = || {
        scene
            .regions
            .iter()
            .filter(|region| region.is_reveal())
            .map(|region| region.bounds)
            .chain(active_reveal)
    };

    if scene.borders {
        for bounds in reveals() {
            surface.stroke_rect(bounds, style.border_width, style.accent);
        }
    }
    for bounds in reveals() {
        surface.clear_rect(bounds);
    }

    if let Some(draft) = scene.active.filter(|d| d.mode == RegionMode::Conceal) {
        surface.fill_rect(draft.bounds, style.conceal_preview);
    }

    let focused = scene
        .focused
        .and_then(|id| scene.regions.iter().find(|r| r.id == id))
        .filter(|region| region.is_conceal());
    if let Some(region) = focused {
        surface.clear_rect(region.bounds);
        surface.fill_rect(region.bounds, style.conceal_focus);
    }
    for region in scene.regions.iter().filter(|r| r.is_conceal()) {
        if Some(region.id) == focused.map(|f| f.id) {
            continue;
        }
        surface.fill_rect(region.bounds, style.conceal);
    }
}
