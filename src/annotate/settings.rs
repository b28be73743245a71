use serde::{Deserialize, Serialize};

use crate::annotate::model::{Size, MIN_REGION_EXTENT};
use crate::annotate::surface::Rgba;

const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "button", "a", "span", "h1", "h2", "h3", "h4", "h5", "p", "i", "strong", "small", "sub",
    "sup", "b", "time", "img", "caption", "input", "label", "legend", "select", "textarea",
    "details", "summary",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverlayColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque_alpha")]
    pub a: u8,
}

impl OverlayColor {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl From<OverlayColor> for Rgba {
    fn from(color: OverlayColor) -> Self {
        Rgba::rgba(color.r, color.g, color.b, color.a)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlaySettings {
    /// Opacity of the dimming scrim over the page, 0.0..=1.0.
    #[serde(default = "default_background_opacity")]
    pub background_opacity: f32,
    #[serde(default = "default_scrim_rgb")]
    pub scrim_rgb: OverlayColor,
    #[serde(default = "default_accent_color")]
    pub accent_color: OverlayColor,
    #[serde(default = "default_border_width")]
    pub border_width: u32,
    #[serde(default = "default_min_region_extent")]
    pub min_region_extent: f64,
    #[serde(default = "default_conceal_preview_alpha")]
    pub conceal_preview_alpha: u8,
    #[serde(default = "default_conceal_focus_alpha")]
    pub conceal_focus_alpha: u8,
    #[serde(default = "default_allowed_tags")]
    pub allowed_tags: Vec<String>,
    #[serde(default = "default_include_screenshot")]
    pub include_screenshot: bool,
    #[serde(default = "default_toolbar_size")]
    pub toolbar_size: Size,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            background_opacity: default_background_opacity(),
            scrim_rgb: default_scrim_rgb(),
            accent_color: default_accent_color(),
            border_width: default_border_width(),
            min_region_extent: default_min_region_extent(),
            conceal_preview_alpha: default_conceal_preview_alpha(),
            conceal_focus_alpha: default_conceal_focus_alpha(),
            allowed_tags: default_allowed_tags(),
            include_screenshot: default_include_screenshot(),
            toolbar_size: default_toolbar_size(),
        }
    }
}

impl OverlaySettings {
    pub fn scrim_color(&self) -> Rgba {
        let alpha = (self.background_opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba::rgba(self.scrim_rgb.r, self.scrim_rgb.g, self.scrim_rgb.b, alpha)
    }

    /// Pulls hand-edited values back into range and normalizes tag names.
    pub fn sanitize(&mut self) {
        if !self.background_opacity.is_finite() {
            self.background_opacity = default_background_opacity();
        }
        self.background_opacity = self.background_opacity.clamp(0.0, 1.0);
        self.border_width = self.border_width.clamp(1, 32);
        if !self.min_region_extent.is_finite() || self.min_region_extent < 1.0 {
            self.min_region_extent = default_min_region_extent();
        }
        if !(self.toolbar_size.width > 0.0 && self.toolbar_size.height > 0.0) {
            self.toolbar_size = default_toolbar_size();
        }

        let mut tags: Vec<String> = self
            .allowed_tags
            .iter()
            .map(|tag| tag.trim().to_ascii_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        tags.sort();
        tags.dedup();
        self.allowed_tags = tags;
    }

    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }
}

fn opaque_alpha() -> u8 {
    255
}

fn default_background_opacity() -> f32 {
    0.5
}

fn default_scrim_rgb() -> OverlayColor {
    OverlayColor::rgba(102, 102, 102, 255)
}

fn default_accent_color() -> OverlayColor {
    OverlayColor::rgba(0xff, 0xeb, 0x3b, 255)
}

fn default_border_width() -> u32 {
    4
}

fn default_min_region_extent() -> f64 {
    MIN_REGION_EXTENT
}

fn default_conceal_preview_alpha() -> u8 {
    128
}

fn default_conceal_focus_alpha() -> u8 {
    191
}

pub fn default_allowed_tags() -> Vec<String> {
    DEFAULT_ALLOWED_TAGS.iter().map(|tag| tag.to_string()).collect()
}

fn default_include_screenshot() -> bool {
    true
}

fn default_toolbar_size() -> Size {
    Size::new(320.0, 48.0)
}
