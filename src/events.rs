//! Wire-facing gamepad events.
//!
//! Every event serializes as `{"type": ..., "data": {...}}`; the host side
//! dispatches on `type`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GamepadEvent {
    Button { button: &'static str, pressed: bool },
    /// Stick vector, each axis in [-1, 1]. Clamped at the mapper, never here.
    Joystick { x: f32, y: f32 },
    /// Accumulated pixel deltas since the last flush; unbounded.
    MouseMove { x: f32, y: f32 },
    MouseClick { button: MouseButton, pressed: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_wire_shape() {
        let ev = GamepadEvent::Button {
            button: "Space",
            pressed: true,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(
            json,
            r#"{"type":"button","data":{"button":"Space","pressed":true}}"#
        );
    }

    #[test]
    fn joystick_wire_shape() {
        let ev = GamepadEvent::Joystick { x: -0.5, y: 1.0 };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"{"type":"joystick","data":{"x":-0.5,"y":1.0}}"#);
    }

    #[test]
    fn mouse_move_wire_shape() {
        let ev = GamepadEvent::MouseMove { x: 12.0, y: -3.5 };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"{"type":"mouse_move","data":{"x":12.0,"y":-3.5}}"#);
    }

    #[test]
    fn mouse_click_wire_shape() {
        let ev = GamepadEvent::MouseClick {
            button: MouseButton::Right,
            pressed: false,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(
            json,
            r#"{"type":"mouse_click","data":{"button":"right","pressed":false}}"#
        );
    }
}
