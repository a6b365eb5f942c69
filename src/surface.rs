//! Touch device discovery & raw-event decoding (evdev 0.13.2 compatible).
//!
//! The kernel's type-B multitouch protocol batches slot updates between
//! `SYN_REPORT` markers; the decoder turns each batch into discrete pointer
//! events carrying the kernel tracking id. Single-touch panels (BTN_TOUCH +
//! ABS_X/ABS_Y) ride the same path on the synthetic mouse pointer id.

use evdev::{AbsoluteAxisCode, Device, EventType, KeyCode, SynchronizationCode};
use log::warn;

use crate::layout::{Point, Surface};
use crate::tracker::{MOUSE_POINTER, PointerEvent, PointerPhase};

const MAX_SLOTS: usize = 10;

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub multitouch: bool,
}

pub fn discover_touch_devices() -> Vec<DeviceInfo> {
    let mut out = vec![];
    if let Ok(rd) = std::fs::read_dir("/dev/input") {
        for e in rd.flatten() {
            let p = e.path();
            if p.file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.starts_with("event"))
                .unwrap_or(false)
            {
                if let Ok(dev) = Device::open(&p) {
                    let has_abs = dev.supported_events().contains(EventType::ABSOLUTE);
                    if !has_abs {
                        continue;
                    }
                    let axes = dev.supported_absolute_axes();
                    let has_mt = axes.as_ref().map_or(false, |a| {
                        a.contains(AbsoluteAxisCode::ABS_MT_SLOT)
                            && a.contains(AbsoluteAxisCode::ABS_MT_POSITION_X)
                            && a.contains(AbsoluteAxisCode::ABS_MT_POSITION_Y)
                    });
                    let has_st = axes.as_ref().map_or(false, |a| {
                        a.contains(AbsoluteAxisCode::ABS_X)
                            && a.contains(AbsoluteAxisCode::ABS_Y)
                    }) && dev
                        .supported_keys()
                        .map_or(false, |k| k.contains(KeyCode::BTN_TOUCH));
                    if has_mt || has_st {
                        out.push(DeviceInfo {
                            path: p.display().to_string(),
                            name: dev.name().unwrap_or("unknown").to_string(),
                            multitouch: has_mt,
                        });
                    }
                }
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    tracking: i32, // -1 = inactive
    x: f32,
    y: f32,
    pending_down: bool,
    pending_up: bool,
    moved: bool,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            tracking: -1,
            x: 0.0,
            y: 0.0,
            pending_down: false,
            pending_up: false,
            moved: false,
        }
    }
}

/// Pure decoder state, separate from the device so it can be driven directly.
#[derive(Debug)]
pub struct SlotDecoder {
    surface: Surface,
    multitouch: bool,
    // raw axis normalization
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
    slots: Vec<Slot>,
    cur_slot: usize,
}

impl SlotDecoder {
    pub fn new(surface: Surface, multitouch: bool) -> Self {
        Self {
            surface,
            multitouch,
            x_min: 0,
            x_max: 4096,
            y_min: 0,
            y_max: 4096,
            slots: vec![Slot::default(); MAX_SLOTS],
            cur_slot: 0,
        }
    }

    pub fn set_raw_ranges(&mut self, x_min: i32, x_max: i32, y_min: i32, y_max: i32) {
        self.x_min = x_min;
        self.x_max = x_max.max(x_min + 1);
        self.y_min = y_min;
        self.y_max = y_max.max(y_min + 1);
    }

    fn norm_x(&self, raw: i32) -> f32 {
        ((raw - self.x_min) as f32 / (self.x_max - self.x_min) as f32).clamp(0.0, 1.0)
    }

    fn norm_y(&self, raw: i32) -> f32 {
        ((raw - self.y_min) as f32 / (self.y_max - self.y_min) as f32).clamp(0.0, 1.0)
    }

    /// Feed one raw event; pointer events for a finished batch land in `out`.
    pub fn handle(&mut self, etype: EventType, code: u16, value: i32, out: &mut Vec<PointerEvent>) {
        if etype == EventType::ABSOLUTE {
            match code {
                c if c == AbsoluteAxisCode::ABS_MT_SLOT.0 => {
                    self.cur_slot = value.clamp(0, MAX_SLOTS as i32 - 1) as usize;
                }
                c if c == AbsoluteAxisCode::ABS_MT_TRACKING_ID.0 => {
                    let s = &mut self.slots[self.cur_slot];
                    if value < 0 {
                        s.pending_up = true;
                    } else {
                        s.tracking = value;
                        s.pending_down = true;
                    }
                }
                c if c == AbsoluteAxisCode::ABS_MT_POSITION_X.0 => {
                    let nx = self.norm_x(value);
                    let s = &mut self.slots[self.cur_slot];
                    s.x = nx;
                    s.moved = true;
                }
                c if c == AbsoluteAxisCode::ABS_MT_POSITION_Y.0 => {
                    let ny = self.norm_y(value);
                    let s = &mut self.slots[self.cur_slot];
                    s.y = ny;
                    s.moved = true;
                }
                c if c == AbsoluteAxisCode::ABS_X.0 && !self.multitouch => {
                    let nx = self.norm_x(value);
                    let s = &mut self.slots[0];
                    s.x = nx;
                    s.moved = true;
                }
                c if c == AbsoluteAxisCode::ABS_Y.0 && !self.multitouch => {
                    let ny = self.norm_y(value);
                    let s = &mut self.slots[0];
                    s.y = ny;
                    s.moved = true;
                }
                _ => {}
            }
        } else if etype == EventType::KEY {
            if code == KeyCode::BTN_TOUCH.0 && !self.multitouch {
                let s = &mut self.slots[0];
                if value != 0 {
                    s.tracking = MOUSE_POINTER;
                    s.pending_down = true;
                } else {
                    s.pending_up = true;
                }
            }
        } else if etype == EventType::SYNCHRONIZATION && code == SynchronizationCode::SYN_REPORT.0 {
            self.end_frame(out);
        }
    }

    fn end_frame(&mut self, out: &mut Vec<PointerEvent>) {
        for slot in &mut self.slots {
            if slot.tracking == -1 && !slot.pending_down {
                slot.pending_up = false;
                slot.moved = false;
                continue;
            }
            let at = Point::new(
                slot.x * self.surface.width,
                slot.y * self.surface.height,
            );
            if slot.pending_down {
                out.push(PointerEvent::new(slot.tracking, PointerPhase::Down, at));
                slot.pending_down = false;
                slot.moved = false;
            } else if slot.moved {
                out.push(PointerEvent::new(slot.tracking, PointerPhase::Move, at));
                slot.moved = false;
            }
            if slot.pending_up {
                out.push(PointerEvent::new(slot.tracking, PointerPhase::Up, at));
                slot.pending_up = false;
                slot.tracking = -1;
            }
        }
    }
}

/// One opened touch device plus its decoder.
pub struct TouchSurface {
    dev: Device,
    decoder: SlotDecoder,
}

impl TouchSurface {
    pub fn open(info: &DeviceInfo, surface: Surface) -> anyhow::Result<Self> {
        let mut dev = Device::open(&info.path)?;
        if let Err(e) = dev.set_nonblocking(true) {
            warn!("{}: set_nonblocking failed: {e}", info.path);
        }
        Ok(Self {
            dev,
            decoder: SlotDecoder::new(surface, info.multitouch),
        })
    }

    /// Drain whatever the kernel has queued into pointer events. Returns how
    /// many events were produced; an empty queue is not an error.
    pub fn poll(&mut self, out: &mut Vec<PointerEvent>) -> usize {
        let before = out.len();
        if let Ok(events) = self.dev.fetch_events() {
            for ev in events {
                self.decoder
                    .handle(ev.event_type(), ev.code(), ev.value(), out);
            }
        }
        out.len() - before
    }
}
