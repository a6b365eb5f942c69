//! Pointer-to-control binding.
//!
//! One tracker instance owns the whole table; there is no ambient "current
//! touch id" state anywhere else. A binding is created when a pointer-down
//! lands in a control's hit region and is sticky from then on: moves resolve
//! back to the bound control even after the pointer drifts outside its
//! visible bounds.

use crate::layout::{ControlId, ControlLayout, Point, Surface};

/// Kernel multitouch tracking ids are non-negative; the synthetic id used by
/// single-contact sources (mouse, single-touch panels) is reserved below zero.
pub type PointerId = i32;

pub const MOUSE_POINTER: PointerId = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// Surface interruption. Treated like `Up` for binding cleanup.
    Cancel,
}

#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub phase: PointerPhase,
    pub at: Point,
}

impl PointerEvent {
    pub fn new(pointer: PointerId, phase: PointerPhase, at: Point) -> Self {
        Self { pointer, phase, at }
    }
}

/// At most one pointer per control, at most one control per pointer.
#[derive(Debug, Default)]
pub struct TouchTracker {
    bindings: Vec<(PointerId, ControlId)>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to bind a fresh pointer to the control under it. Returns the bound
    /// control, or `None` when the point hits nothing, the pointer is already
    /// bound, or the hit control is already driven by another pointer.
    pub fn on_pointer_down(
        &mut self,
        pointer: PointerId,
        at: Point,
        layout: &ControlLayout,
        surface: Surface,
    ) -> Option<ControlId> {
        if self.resolve(pointer).is_some() {
            return None;
        }
        let control = layout.hit_test(at, surface)?;
        if self.pointer_for(control).is_some() {
            return None;
        }
        self.bindings.push((pointer, control));
        Some(control)
    }

    pub fn resolve(&self, pointer: PointerId) -> Option<ControlId> {
        self.bindings
            .iter()
            .find(|(p, _)| *p == pointer)
            .map(|&(_, c)| c)
    }

    pub fn pointer_for(&self, control: ControlId) -> Option<PointerId> {
        self.bindings
            .iter()
            .find(|(_, c)| *c == control)
            .map(|&(p, _)| p)
    }

    /// Drop the pointer's binding, returning the control it drove. Releasing
    /// an unbound pointer is a no-op.
    pub fn on_pointer_up(&mut self, pointer: PointerId) -> Option<ControlId> {
        let idx = self.bindings.iter().position(|(p, _)| *p == pointer)?;
        Some(self.bindings.swap_remove(idx).1)
    }

    /// Drop every binding, returning them. Used on edit-mode transitions:
    /// in-flight gestures do not survive.
    pub fn clear(&mut self) -> Vec<(PointerId, ControlId)> {
        std::mem::take(&mut self.bindings)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ControlLayout;

    const SURFACE: Surface = Surface {
        width: 1000.0,
        height: 500.0,
    };

    fn center_of(layout: &ControlLayout, id: ControlId) -> Point {
        layout.get(id).unwrap().region(SURFACE).center()
    }

    #[test]
    fn binding_is_sticky_outside_bounds() {
        let layout = ControlLayout::defaults();
        let mut tracker = TouchTracker::new();
        let at = center_of(&layout, ControlId::Joystick);
        assert_eq!(
            tracker.on_pointer_down(7, at, &layout, SURFACE),
            Some(ControlId::Joystick)
        );
        // The pointer has long left the joystick region; it still resolves.
        assert_eq!(tracker.resolve(7), Some(ControlId::Joystick));
        assert_eq!(tracker.on_pointer_up(7), Some(ControlId::Joystick));
        assert_eq!(tracker.resolve(7), None);
    }

    #[test]
    fn second_pointer_on_bound_control_is_rejected() {
        let layout = ControlLayout::defaults();
        let mut tracker = TouchTracker::new();
        let at = center_of(&layout, ControlId::Joystick);
        assert!(tracker.on_pointer_down(1, at, &layout, SURFACE).is_some());
        assert_eq!(tracker.on_pointer_down(2, at, &layout, SURFACE), None);
        assert_eq!(tracker.resolve(2), None);
    }

    #[test]
    fn bound_pointer_cannot_grab_a_second_control() {
        let layout = ControlLayout::defaults();
        let mut tracker = TouchTracker::new();
        let joy = center_of(&layout, ControlId::Joystick);
        let pad = center_of(&layout, ControlId::TouchPad);
        assert!(tracker.on_pointer_down(1, joy, &layout, SURFACE).is_some());
        assert_eq!(tracker.on_pointer_down(1, pad, &layout, SURFACE), None);
        assert_eq!(tracker.resolve(1), Some(ControlId::Joystick));
    }

    #[test]
    fn unbound_release_is_a_noop() {
        let mut tracker = TouchTracker::new();
        assert_eq!(tracker.on_pointer_up(42), None);
    }

    #[test]
    fn down_on_empty_space_binds_nothing() {
        let layout = ControlLayout::defaults();
        let mut tracker = TouchTracker::new();
        assert_eq!(
            tracker.on_pointer_down(MOUSE_POINTER, Point::new(5.0, 250.0), &layout, SURFACE),
            None
        );
        assert!(tracker.is_empty());
    }

    #[test]
    fn clear_drains_all_bindings() {
        let layout = ControlLayout::defaults();
        let mut tracker = TouchTracker::new();
        tracker.on_pointer_down(1, center_of(&layout, ControlId::Joystick), &layout, SURFACE);
        tracker.on_pointer_down(2, center_of(&layout, ControlId::ButtonA), &layout, SURFACE);
        let drained = tracker.clear();
        assert_eq!(drained.len(), 2);
        assert!(tracker.is_empty());
        assert_eq!(tracker.resolve(1), None);
    }
}
