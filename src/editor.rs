//! Edit-mode drag and resize over the layout.
//!
//! Only active while the session's edit flag is set; gameplay binding is
//! suspended meanwhile. Dragging captures the pointer's start position and
//! the control's position as an anchor, then tracks deltas as percentages of
//! the surface. Resizing is a discrete step affordance, independent of any
//! drag in progress.

use crate::layout::{ControlId, ControlLayout, Point, Surface};
use crate::tracker::PointerId;

/// Pixels added or removed per resize step.
pub const RESIZE_STEP: f32 = 10.0;

#[derive(Debug, Clone, Copy)]
struct Drag {
    pointer: PointerId,
    control: ControlId,
    start: Point,
    anchor_x: f32,
    anchor_y: f32,
}

#[derive(Debug, Default)]
pub struct LayoutEditor {
    drag: Option<Drag>,
}

impl LayoutEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Begin dragging the control under the pointer, if idle and a control is
    /// there.
    pub fn on_pointer_down(
        &mut self,
        pointer: PointerId,
        at: Point,
        layout: &ControlLayout,
        surface: Surface,
    ) -> Option<ControlId> {
        if self.drag.is_some() {
            return None;
        }
        let control = layout.hit_test(at, surface)?;
        let anchor = layout.get(control)?;
        self.drag = Some(Drag {
            pointer,
            control,
            start: at,
            anchor_x: anchor.x,
            anchor_y: anchor.y,
        });
        Some(control)
    }

    /// Apply the drag delta as percent of the surface. Returns the moved
    /// control so the renderer can re-apply its position immediately.
    pub fn on_pointer_move(
        &mut self,
        pointer: PointerId,
        at: Point,
        layout: &mut ControlLayout,
        surface: Surface,
    ) -> Option<ControlId> {
        let drag = self.drag.as_ref().filter(|d| d.pointer == pointer)?;
        let dx_pct = (at.x - drag.start.x) / surface.width * 100.0;
        let dy_pct = (at.y - drag.start.y) / surface.height * 100.0;
        layout.set_position(drag.control, drag.anchor_x + dx_pct, drag.anchor_y + dy_pct);
        Some(drag.control)
    }

    /// End the drag; no binding survives an up or cancel.
    pub fn on_pointer_up(&mut self, pointer: PointerId) {
        if self.drag.is_some_and(|d| d.pointer == pointer) {
            self.drag = None;
        }
    }

    /// Forget any drag in progress (edit mode turned off mid-gesture).
    pub fn cancel(&mut self) {
        self.drag = None;
    }

    /// Step a control's size up or down, clamped by the layout.
    pub fn resize(&self, layout: &mut ControlLayout, control: ControlId, steps: i32) {
        if let Some(c) = layout.get(control) {
            let size = c.size + RESIZE_STEP * steps as f32;
            layout.set_size(control, size);
        }
    }
}
