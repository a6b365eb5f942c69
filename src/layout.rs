//! Control geometry: the on-surface layout and its invariants.
//!
//! Positions are percentages of the logical surface, sizes are logical pixels.
//! The layout owns every mutation; the editor and the snapshot loader go
//! through the clamping setters so the invariants hold everywhere.

use log::warn;

use crate::events::MouseButton;

/// Position clamp, percent of surface.
pub const POS_MIN: f32 = 0.0;
pub const POS_MAX: f32 = 95.0;
/// Size clamp, logical pixels.
pub const SIZE_MIN: f32 = 40.0;
pub const SIZE_MAX: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    Joystick,
    TouchPad,
    ButtonA,
    ButtonB,
    ButtonX,
    ButtonY,
    KeyR,
    KeyC,
    KeyX,
    MouseLeft,
    MouseRight,
    ShoulderL,
    ShoulderR,
    Start,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Joystick,
    TouchPad,
    Button,
    MouseButton,
}

impl ControlId {
    pub fn name(self) -> &'static str {
        match self {
            ControlId::Joystick => "joystick",
            ControlId::TouchPad => "touch_pad",
            ControlId::ButtonA => "button_a",
            ControlId::ButtonB => "button_b",
            ControlId::ButtonX => "button_x",
            ControlId::ButtonY => "button_y",
            ControlId::KeyR => "key_r",
            ControlId::KeyC => "key_c",
            ControlId::KeyX => "key_x",
            ControlId::MouseLeft => "mouse_left",
            ControlId::MouseRight => "mouse_right",
            ControlId::ShoulderL => "shoulder_l",
            ControlId::ShoulderR => "shoulder_r",
            ControlId::Start => "start",
            ControlId::Select => "select",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "joystick" => ControlId::Joystick,
            "touch_pad" => ControlId::TouchPad,
            "button_a" => ControlId::ButtonA,
            "button_b" => ControlId::ButtonB,
            "button_x" => ControlId::ButtonX,
            "button_y" => ControlId::ButtonY,
            "key_r" => ControlId::KeyR,
            "key_c" => ControlId::KeyC,
            "key_x" => ControlId::KeyX,
            "mouse_left" => ControlId::MouseLeft,
            "mouse_right" => ControlId::MouseRight,
            "shoulder_l" => ControlId::ShoulderL,
            "shoulder_r" => ControlId::ShoulderR,
            "start" => ControlId::Start,
            "select" => ControlId::Select,
            _ => return None,
        })
    }

    pub fn kind(self) -> ControlKind {
        match self {
            ControlId::Joystick => ControlKind::Joystick,
            ControlId::TouchPad => ControlKind::TouchPad,
            ControlId::MouseLeft | ControlId::MouseRight => ControlKind::MouseButton,
            _ => ControlKind::Button,
        }
    }

    /// Hit-rectangle height as a fraction of `size`.
    fn aspect(self) -> f32 {
        match self {
            ControlId::TouchPad => 0.7,
            ControlId::MouseLeft | ControlId::MouseRight => 0.8,
            ControlId::ShoulderL | ControlId::ShoulderR => 0.5,
            ControlId::Start | ControlId::Select => 0.6,
            _ => 1.0,
        }
    }
}

/// Logical key a button control stands for. `None` for controls that are not
/// plain buttons.
pub fn key_for(id: ControlId) -> Option<&'static str> {
    Some(match id {
        ControlId::ButtonA => "Space",
        ControlId::ButtonB => "E",
        ControlId::ButtonX => "Q",
        ControlId::ButtonY => "F",
        ControlId::ShoulderL => "Shift",
        ControlId::ShoulderR => "Control",
        ControlId::Start => "Enter",
        ControlId::Select => "Escape",
        ControlId::KeyR => "R",
        ControlId::KeyC => "C",
        ControlId::KeyX => "X",
        _ => return None,
    })
}

pub fn mouse_button_for(id: ControlId) -> Option<MouseButton> {
    match id {
        ControlId::MouseLeft => Some(MouseButton::Left),
        ControlId::MouseRight => Some(MouseButton::Right),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Logical surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left
            && p.x <= self.left + self.width
            && p.y >= self.top
            && p.y <= self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Control {
    pub id: ControlId,
    /// Left edge, percent of surface width.
    pub x: f32,
    /// Top edge, percent of surface height.
    pub y: f32,
    /// Width in logical pixels; height derives from the control's aspect.
    pub size: f32,
}

impl Control {
    pub fn region(&self, surface: Surface) -> Rect {
        Rect {
            left: self.x / 100.0 * surface.width,
            top: self.y / 100.0 * surface.height,
            width: self.size,
            height: self.size * self.id.aspect(),
        }
    }
}

/// The set of controls on the surface. Registration order is the hit-test
/// priority when regions overlap.
#[derive(Debug, Clone)]
pub struct ControlLayout {
    controls: Vec<Control>,
}

const DEFAULTS: &[(ControlId, f32, f32, f32)] = &[
    (ControlId::Joystick, 15.0, 65.0, 150.0),
    (ControlId::TouchPad, 75.0, 35.0, 200.0),
    (ControlId::ButtonA, 90.0, 70.0, 80.0),
    (ControlId::ButtonB, 95.0, 55.0, 80.0),
    (ControlId::ButtonX, 80.0, 55.0, 80.0),
    (ControlId::ButtonY, 90.0, 40.0, 80.0),
    (ControlId::KeyR, 65.0, 75.0, 70.0),
    (ControlId::KeyC, 55.0, 75.0, 70.0),
    (ControlId::KeyX, 45.0, 75.0, 70.0),
    (ControlId::MouseLeft, 85.0, 85.0, 160.0),
    (ControlId::MouseRight, 95.0, 85.0, 100.0),
    (ControlId::ShoulderL, 10.0, 10.0, 110.0),
    (ControlId::ShoulderR, 85.0, 10.0, 110.0),
    (ControlId::Start, 50.0, 10.0, 50.0),
    (ControlId::Select, 40.0, 10.0, 50.0),
];

impl Default for ControlLayout {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ControlLayout {
    pub fn defaults() -> Self {
        Self {
            controls: DEFAULTS
                .iter()
                .map(|&(id, x, y, size)| Control { id, x, y, size })
                .collect(),
        }
    }

    /// Layout holding only the given controls, default geometry. Deployment
    /// variants without a touchpad (or mouse buttons) build their layout here.
    pub fn with_controls(ids: &[ControlId]) -> Self {
        Self {
            controls: DEFAULTS
                .iter()
                .filter(|(id, ..)| ids.contains(id))
                .map(|&(id, x, y, size)| Control { id, x, y, size })
                .collect(),
        }
    }

    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.controls.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter()
    }

    pub fn set_position(&mut self, id: ControlId, x: f32, y: f32) {
        if let Some(c) = self.controls.iter_mut().find(|c| c.id == id) {
            c.x = x.clamp(POS_MIN, POS_MAX);
            c.y = y.clamp(POS_MIN, POS_MAX);
        }
    }

    pub fn set_size(&mut self, id: ControlId, size: f32) {
        if let Some(c) = self.controls.iter_mut().find(|c| c.id == id) {
            c.size = size.clamp(SIZE_MIN, SIZE_MAX);
        }
    }

    /// First control whose hit rectangle contains the point, in registration
    /// order.
    pub fn hit_test(&self, p: Point, surface: Surface) -> Option<ControlId> {
        self.controls
            .iter()
            .find(|c| c.region(surface).contains(p))
            .map(|c| c.id)
    }

    /// Serialize the full layout for the persistence store.
    pub fn snapshot(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for c in &self.controls {
            map.insert(
                c.id.name().to_string(),
                serde_json::json!({ "x": c.x, "y": c.y, "size": c.size }),
            );
        }
        serde_json::Value::Object(map)
    }

    /// Merge a persisted snapshot over the current geometry. Controls missing
    /// from the snapshot keep what they have (so a freshly introduced control
    /// keeps its compiled-in default); unknown names are skipped.
    pub fn apply_snapshot(&mut self, snapshot: &serde_json::Value) {
        let Some(map) = snapshot.as_object() else {
            warn!("layout snapshot is not an object; keeping current layout");
            return;
        };
        for (name, geom) in map {
            let Some(id) = ControlId::from_name(name) else {
                warn!("layout snapshot references unknown control '{name}'; skipped");
                continue;
            };
            if self.get(id).is_none() {
                continue;
            }
            let field = |key: &str| geom.get(key).and_then(|v| v.as_f64()).map(|v| v as f32);
            if let (Some(x), Some(y)) = (field("x"), field("y")) {
                self.set_position(id, x, y);
            }
            if let Some(size) = field("size") {
                self.set_size(id, size);
            }
        }
    }
}
