pub mod capture;
pub mod composite;
pub mod draw;
pub mod export;
pub mod hover;
pub mod messages;
pub mod model;
pub mod session;
pub mod settings;
pub mod settings_store;
pub mod store;
pub mod surface;
pub mod toolbar;
pub mod viewport;

pub use capture::{CaptureRequest, Screenshot, ScreenshotProvider, SolidColorProvider};
pub use composite::{CanvasCompositor, CompositorStyle, Scene};
pub use hover::{CursorStyle, ElementHit, HitTester};
pub use messages::{Key, OverlayCommand, OverlayEffect, PointerTarget};
pub use model::{Point, Rect, Region, RegionDraft, RegionId, RegionMode, Size};
pub use session::{AnnotationSession, SessionPhase};
pub use settings::OverlaySettings;
pub use store::RegionStore;
pub use surface::{Rgba, Surface};
