use crate::annotate::capture::CaptureRequest;
use crate::annotate::hover::CursorStyle;
use crate::annotate::model::{Point, Region, RegionId, RegionMode, Size};
use crate::annotate::toolbar::Translation;
use crate::annotate::viewport::LayerOffset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerTarget {
    #[default]
    Canvas,
    ToolbarHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    #[serde(other)]
    Other,
}

/// Host events translated into typed commands. Pointer points are in
/// viewport coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayCommand {
    Open,
    Close,
    OpenPlacement,
    FinishPlacement,
    SetMode {
        mode: RegionMode,
    },
    ToggleScreenshot,
    PointerDown {
        point: Point,
        #[serde(default)]
        target: PointerTarget,
    },
    PointerMove {
        point: Point,
    },
    PointerUp {
        point: Point,
    },
    Click,
    Scroll {
        x: f64,
        y: f64,
    },
    Resize {
        viewport: Size,
        document: Size,
    },
    KeyDown {
        key: Key,
    },
    RemoveRegion {
        id: RegionId,
    },
    FocusRegion {
        id: RegionId,
    },
    BlurRegion {
        id: RegionId,
    },
}

/// What the host has to reflect after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEffect {
    Repainted,
    CursorChanged(CursorStyle),
    LayersMoved(LayerOffset),
    ToolbarMoved(Translation),
    CaptureRequested {
        sequence: u64,
        request: CaptureRequest,
    },
    RegionAdded(Region),
    RegionRemoved(RegionId),
    RegionFocused(Option<RegionId>),
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_tagged_json() {
        let commands: Vec<OverlayCommand> = serde_json::from_str(
            r#"[
                {"type": "open"},
                {"type": "set_mode", "mode": "conceal"},
                {"type": "pointer_down", "point": {"x": 1.0, "y": 2.0}},
                {"type": "pointer_down", "point": {"x": 1.0, "y": 2.0}, "target": "toolbar_handle"},
                {"type": "key_down", "key": "F5"},
                {"type": "remove_region", "id": 3}
            ]"#,
        )
        .expect("parse commands");

        assert_eq!(
            commands[1],
            OverlayCommand::SetMode {
                mode: RegionMode::Conceal
            }
        );
        assert_eq!(
            commands[2],
            OverlayCommand::PointerDown {
                point: Point::new(1.0, 2.0),
                target: PointerTarget::Canvas
            }
        );
        assert_eq!(
            commands[3],
            OverlayCommand::PointerDown {
                point: Point::new(1.0, 2.0),
                target: PointerTarget::ToolbarHandle
            }
        );
        assert_eq!(commands[4], OverlayCommand::KeyDown { key: Key::Other });
        assert_eq!(commands[5], OverlayCommand::RemoveRegion { id: RegionId(3) });
    }
}
