//! The engine core: one session per surface.
//!
//! All pointer callbacks and the flush tick run on one logical thread, so the
//! session is plain mutable state with no locking. Pointer events route to
//! the editor while edit mode is on, to the tracker/mapper otherwise; emitted
//! gamepad events queue in `pending` for the run loop to drain into the link.

use std::time::Instant;

use log::debug;

use crate::accumulator::MotionAccumulator;
use crate::editor::LayoutEditor;
use crate::events::GamepadEvent;
use crate::layout::{ControlId, ControlLayout, Surface};
use crate::mapper::InputMapper;
use crate::tracker::{PointerEvent, PointerPhase, TouchTracker};

#[derive(Debug)]
pub struct Session {
    layout: ControlLayout,
    surface: Surface,
    tracker: TouchTracker,
    mapper: InputMapper,
    accumulator: MotionAccumulator,
    editor: LayoutEditor,
    edit_mode: bool,
    pending: Vec<GamepadEvent>,
}

impl Session {
    pub fn new(layout: ControlLayout, surface: Surface, sensitivity: f32, now: Instant) -> Self {
        Self {
            layout,
            surface,
            tracker: TouchTracker::new(),
            mapper: InputMapper::new(sensitivity),
            accumulator: MotionAccumulator::new(now),
            editor: LayoutEditor::new(),
            edit_mode: false,
            pending: Vec::new(),
        }
    }

    pub fn layout(&self) -> &ControlLayout {
        &self.layout
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.mapper.set_sensitivity(sensitivity);
    }

    /// Feed one pointer event through the engine.
    pub fn handle_pointer(&mut self, ev: PointerEvent) {
        if self.edit_mode {
            self.handle_edit(ev);
        } else {
            self.handle_gameplay(ev);
        }
    }

    fn handle_edit(&mut self, ev: PointerEvent) {
        match ev.phase {
            PointerPhase::Down => {
                if let Some(control) =
                    self.editor
                        .on_pointer_down(ev.pointer, ev.at, &self.layout, self.surface)
                {
                    debug!("edit: dragging {}", control.name());
                }
            }
            PointerPhase::Move => {
                self.editor
                    .on_pointer_move(ev.pointer, ev.at, &mut self.layout, self.surface);
            }
            PointerPhase::Up | PointerPhase::Cancel => self.editor.on_pointer_up(ev.pointer),
        }
    }

    fn handle_gameplay(&mut self, ev: PointerEvent) {
        match ev.phase {
            PointerPhase::Down => {
                let Some(control) =
                    self.tracker
                        .on_pointer_down(ev.pointer, ev.at, &self.layout, self.surface)
                else {
                    return;
                };
                if let Some(c) = self.layout.get(control) {
                    let emitted = self.mapper.on_press(c, ev.pointer, ev.at, self.surface);
                    self.pending.extend(emitted);
                }
            }
            PointerPhase::Move => {
                // Moves for unbound pointers drop silently; this is the
                // normal aftermath of an edit-mode transition.
                let Some(control) = self.tracker.resolve(ev.pointer) else {
                    return;
                };
                if let Some(c) = self.layout.get(control) {
                    let emitted = self.mapper.on_move(
                        c,
                        ev.pointer,
                        ev.at,
                        self.surface,
                        &mut self.accumulator,
                    );
                    self.pending.extend(emitted);
                }
            }
            PointerPhase::Up | PointerPhase::Cancel => {
                let Some(control) = self.tracker.on_pointer_up(ev.pointer) else {
                    return;
                };
                if let Some(c) = self.layout.get(control) {
                    let emitted = self.mapper.on_release(c, ev.pointer);
                    self.pending.extend(emitted);
                }
            }
        }
    }

    /// Flip edit mode. Live gestures do not survive the transition: every
    /// binding is released (emitting the matching release events so the host
    /// never keeps a key held) and pending touchpad motion is discarded.
    pub fn set_edit_mode(&mut self, on: bool) {
        if self.edit_mode == on {
            return;
        }
        for (pointer, control) in self.tracker.clear() {
            if let Some(c) = self.layout.get(control) {
                let emitted = self.mapper.on_release(c, pointer);
                self.pending.extend(emitted);
            }
        }
        self.accumulator.reset();
        self.editor.cancel();
        self.edit_mode = on;
        debug!("edit mode {}", if on { "on" } else { "off" });
    }

    pub fn toggle_edit_mode(&mut self) -> bool {
        self.set_edit_mode(!self.edit_mode);
        self.edit_mode
    }

    /// Resize affordance; only meaningful in edit mode but harmless outside.
    pub fn resize_control(&mut self, control: ControlId, steps: i32) {
        self.editor.resize(&mut self.layout, control, steps);
    }

    /// Advance the flush schedule; due touchpad motion becomes one event.
    pub fn tick(&mut self, now: Instant) {
        if let Some((dx, dy)) = self.accumulator.poll(now) {
            self.pending.push(GamepadEvent::MouseMove { x: dx, y: dy });
        }
    }

    pub fn next_deadline(&self) -> Instant {
        self.accumulator.next_deadline()
    }

    /// Take everything emitted since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<GamepadEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::FLUSH_INTERVAL;
    use crate::events::MouseButton;
    use crate::layout::Point;
    use crate::mapper::DEFAULT_SENSITIVITY;
    use crate::tracker::PointerId;

    const SURFACE: Surface = Surface {
        width: 1000.0,
        height: 500.0,
    };

    fn session(now: Instant) -> Session {
        Session::new(
            ControlLayout::defaults(),
            SURFACE,
            DEFAULT_SENSITIVITY,
            now,
        )
    }

    fn down(s: &mut Session, pointer: PointerId, at: Point) {
        s.handle_pointer(PointerEvent::new(pointer, PointerPhase::Down, at));
    }
    fn mv(s: &mut Session, pointer: PointerId, at: Point) {
        s.handle_pointer(PointerEvent::new(pointer, PointerPhase::Move, at));
    }
    fn up(s: &mut Session, pointer: PointerId, at: Point) {
        s.handle_pointer(PointerEvent::new(pointer, PointerPhase::Up, at));
    }

    fn center(s: &Session, id: ControlId) -> Point {
        s.layout().get(id).unwrap().region(SURFACE).center()
    }

    #[test]
    fn simultaneous_gestures_do_not_cross_talk() {
        let t0 = Instant::now();
        let mut s = session(t0);
        let joy = center(&s, ControlId::Joystick);
        let pad = center(&s, ControlId::TouchPad);

        down(&mut s, 1, joy);
        down(&mut s, 2, pad);
        s.drain_events();

        // Only the touchpad finger moves; no joystick event may appear.
        mv(&mut s, 2, Point::new(pad.x + 30.0, pad.y));
        let events = s.drain_events();
        assert!(events.is_empty(), "touchpad moves accumulate, got {events:?}");

        // Only the joystick finger moves; the accumulator must stay empty.
        mv(&mut s, 1, Point::new(joy.x + 10.0, joy.y));
        let events = s.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GamepadEvent::Joystick { .. }));

        s.tick(t0 + FLUSH_INTERVAL);
        let events = s.drain_events();
        // The flush carries only the touchpad's motion from its own pointer.
        assert_eq!(events.len(), 1);
        match events[0] {
            GamepadEvent::MouseMove { x, y } => {
                assert!((x - 30.0 * DEFAULT_SENSITIVITY).abs() < 1e-4);
                assert_eq!(y, 0.0);
            }
            ref other => panic!("expected mouse_move, got {other:?}"),
        }
    }

    #[test]
    fn press_and_release_emit_one_event_each() {
        let t0 = Instant::now();
        let mut s = session(t0);
        let a = center(&s, ControlId::ButtonA);

        down(&mut s, 1, a);
        // Holding: extra moves emit nothing.
        mv(&mut s, 1, a);
        mv(&mut s, 1, a);
        up(&mut s, 1, a);

        let events = s.drain_events();
        assert_eq!(
            events,
            vec![
                GamepadEvent::Button {
                    button: "Space",
                    pressed: true
                },
                GamepadEvent::Button {
                    button: "Space",
                    pressed: false
                },
            ]
        );
    }

    #[test]
    fn cancel_releases_like_up() {
        let t0 = Instant::now();
        let mut s = session(t0);
        let left = center(&s, ControlId::MouseLeft);

        down(&mut s, 1, left);
        s.handle_pointer(PointerEvent::new(1, PointerPhase::Cancel, left));
        let events = s.drain_events();
        assert_eq!(
            events,
            vec![
                GamepadEvent::MouseClick {
                    button: MouseButton::Left,
                    pressed: true
                },
                GamepadEvent::MouseClick {
                    button: MouseButton::Left,
                    pressed: false
                },
            ]
        );
    }

    #[test]
    fn joystick_release_always_centers() {
        let t0 = Instant::now();
        let mut s = session(t0);
        let joy = center(&s, ControlId::Joystick);

        down(&mut s, 1, joy);
        // Last reported vector is already (0,0); the release still reports it.
        up(&mut s, 1, joy);
        let events = s.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], GamepadEvent::Joystick { x: 0.0, y: 0.0 });
    }

    #[test]
    fn edit_transition_releases_live_gestures() {
        let t0 = Instant::now();
        let mut s = session(t0);
        let a = center(&s, ControlId::ButtonA);
        let pad = center(&s, ControlId::TouchPad);

        down(&mut s, 1, a);
        down(&mut s, 2, pad);
        mv(&mut s, 2, Point::new(pad.x + 50.0, pad.y));
        s.drain_events();

        s.set_edit_mode(true);
        let events = s.drain_events();
        assert_eq!(
            events,
            vec![GamepadEvent::Button {
                button: "Space",
                pressed: false
            }]
        );

        // Accumulated motion was discarded with the transition.
        s.tick(t0 + FLUSH_INTERVAL);
        assert!(s.drain_events().is_empty());

        // The stale finger keeps moving; its events drop silently.
        s.set_edit_mode(false);
        mv(&mut s, 2, Point::new(pad.x + 90.0, pad.y));
        s.tick(t0 + FLUSH_INTERVAL * 2);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn edit_mode_drags_instead_of_emitting() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.set_edit_mode(true);
        let joy = center(&s, ControlId::Joystick);

        down(&mut s, 1, joy);
        mv(&mut s, 1, Point::new(joy.x + 100.0, joy.y));
        up(&mut s, 1, Point::new(joy.x + 100.0, joy.y));

        assert!(s.drain_events().is_empty());
        assert_eq!(s.layout().get(ControlId::Joystick).unwrap().x, 25.0);
    }

    #[test]
    fn empty_ticks_send_nothing() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.tick(t0 + FLUSH_INTERVAL);
        s.tick(t0 + FLUSH_INTERVAL * 2);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn resize_steps_through_the_session() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.set_edit_mode(true);
        s.resize_control(ControlId::ButtonA, -2);
        assert_eq!(s.layout().get(ControlId::ButtonA).unwrap().size, 60.0);
    }
}
