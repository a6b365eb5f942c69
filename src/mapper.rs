//! Per-control gesture interpretation.
//!
//! The mapper is stateless across controls except for the touchpad's
//! last-sample table, which it needs to turn absolute positions into relative
//! deltas. Joystick moves become normalized vectors immediately; touchpad
//! moves go into the accumulator instead of out the wire; buttons are
//! edge-triggered only.

use std::collections::HashMap;

use crate::accumulator::MotionAccumulator;
use crate::events::GamepadEvent;
use crate::layout::{Control, ControlKind, Point, Surface, key_for, mouse_button_for};
use crate::tracker::PointerId;

pub const DEFAULT_SENSITIVITY: f32 = 1.5;

/// Inset from the joystick rim; the knob stops this far from the edge.
pub const EDGE_MARGIN: f32 = 20.0;

/// Vertical touchpad motion is dampened relative to horizontal.
const VERTICAL_DAMP: f32 = 0.5;

#[derive(Debug)]
pub struct InputMapper {
    sensitivity: f32,
    pad_last: HashMap<PointerId, Point>,
}

impl InputMapper {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            pad_last: HashMap::new(),
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    /// A pointer was bound to `control`.
    pub fn on_press(
        &mut self,
        control: &Control,
        pointer: PointerId,
        at: Point,
        surface: Surface,
    ) -> Option<GamepadEvent> {
        match control.id.kind() {
            ControlKind::Joystick => Some(joystick_vector(control, at, surface)),
            ControlKind::TouchPad => {
                self.pad_last.insert(pointer, at);
                None
            }
            ControlKind::Button => key_for(control.id).map(|button| GamepadEvent::Button {
                button,
                pressed: true,
            }),
            ControlKind::MouseButton => {
                mouse_button_for(control.id).map(|button| GamepadEvent::MouseClick {
                    button,
                    pressed: true,
                })
            }
        }
    }

    /// The bound pointer moved.
    pub fn on_move(
        &mut self,
        control: &Control,
        pointer: PointerId,
        at: Point,
        surface: Surface,
        accumulator: &mut MotionAccumulator,
    ) -> Option<GamepadEvent> {
        match control.id.kind() {
            ControlKind::Joystick => Some(joystick_vector(control, at, surface)),
            ControlKind::TouchPad => {
                // Insert establishes the baseline when no previous sample
                // exists; the first move then carries no delta.
                if let Some(last) = self.pad_last.insert(pointer, at) {
                    let dx = (at.x - last.x) * self.sensitivity;
                    let dy = (at.y - last.y) * self.sensitivity * VERTICAL_DAMP;
                    accumulator.add(dx, dy);
                }
                None
            }
            ControlKind::Button | ControlKind::MouseButton => None,
        }
    }

    /// The bound pointer was released (or cancelled; treated the same so the
    /// host never keeps a key held).
    pub fn on_release(&mut self, control: &Control, pointer: PointerId) -> Option<GamepadEvent> {
        match control.id.kind() {
            // The authoritative stick-centered signal, sent exactly once even
            // if the last move already reported near-zero.
            ControlKind::Joystick => Some(GamepadEvent::Joystick { x: 0.0, y: 0.0 }),
            ControlKind::TouchPad => {
                self.pad_last.remove(&pointer);
                None
            }
            ControlKind::Button => key_for(control.id).map(|button| GamepadEvent::Button {
                button,
                pressed: false,
            }),
            ControlKind::MouseButton => {
                mouse_button_for(control.id).map(|button| GamepadEvent::MouseClick {
                    button,
                    pressed: false,
                })
            }
        }
    }
}

/// Vector from the joystick's visual center, clamped to the rim minus the
/// edge margin with its angle preserved, normalized to [-1, 1] per axis.
fn joystick_vector(control: &Control, at: Point, surface: Surface) -> GamepadEvent {
    let center = control.region(surface).center();
    // A stick resized to the minimum would have a zero radius; keep the
    // divisor positive.
    let max_dist = (control.size / 2.0 - EDGE_MARGIN).max(1.0);

    let mut dx = at.x - center.x;
    let mut dy = at.y - center.y;
    let dist = dx.hypot(dy);
    if dist > max_dist {
        let angle = dy.atan2(dx);
        dx = angle.cos() * max_dist;
        dy = angle.sin() * max_dist;
    }

    GamepadEvent::Joystick {
        x: dx / max_dist,
        y: dy / max_dist,
    }
}
