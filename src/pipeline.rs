//! The foreground run loop: devices in, gamepad events out.
//!
//! Everything engine-related happens on this thread; the signal listener and
//! the settings watcher only feed channels that the loop drains between
//! iterations.
//!
//! Runtime controls: SIGUSR1 toggles edit mode, SIGUSR2 saves the layout,
//! SIGHUP reconnects the link, SIGINT/SIGTERM stop the loop.

use anyhow::{Result, anyhow};
use log::{error, info, warn};
use notify::{RecursiveMode, Watcher};
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook::iterator::Signals;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{self, Store};
use crate::link::Link;
use crate::session::Session;
use crate::surface::{self, TouchSurface};

pub fn run(server_override: Option<String>) -> Result<()> {
    let store = Store::open_default()?;
    let settings = store.load_settings();
    let layout = config::load_layout(&store);
    let surface = settings.surface.surface();

    let addr = server_override
        .or_else(|| settings.server.addr.clone())
        .ok_or_else(|| {
            anyhow!("no server address; pass --server <host:port> or set [server] addr in settings.toml")
        })?;

    let mut link = Link::new(addr);
    if let Err(e) = link.connect() {
        warn!("{e}; input is tracked but dropped until reconnect (SIGHUP)");
    }

    let devices = surface::discover_touch_devices();
    if devices.is_empty() {
        warn!("no touch devices detected; surface is idle");
    }
    let mut surfaces: Vec<TouchSurface> = vec![];
    for d in &devices {
        match TouchSurface::open(d, surface) {
            Ok(s) => {
                info!("using {} ({})", d.name, d.path);
                surfaces.push(s);
            }
            Err(e) => warn!("failed to open {}: {e}", d.path),
        }
    }

    let mut session = Session::new(layout, surface, settings.input.sensitivity, Instant::now());

    // Signal listener thread; the loop drains the channel.
    let (tx_sig, rx_sig) = mpsc::channel::<i32>();
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])?;
    thread::spawn(move || {
        for sig in signals.forever() {
            if tx_sig.send(sig).is_err() {
                break;
            }
        }
    });

    // Settings watcher: sensitivity edits apply to the live session.
    let (tx_fs, rx_fs) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx_fs.send(res);
    })?;
    watcher.watch(store.dir(), RecursiveMode::NonRecursive)?;

    let settings_file = store.settings_path();
    let mut raw = Vec::new();
    loop {
        while let Ok(sig) = rx_sig.try_recv() {
            match sig {
                SIGINT | SIGTERM => {
                    info!("shutting down");
                    return Ok(());
                }
                SIGHUP => {
                    if let Err(e) = link.connect() {
                        warn!("reconnect failed: {e}");
                    }
                }
                SIGUSR1 => {
                    let on = session.toggle_edit_mode();
                    info!("edit mode {}", if on { "on" } else { "off" });
                }
                SIGUSR2 => match config::save_layout(&store, session.layout()) {
                    Ok(()) => info!("layout saved"),
                    Err(e) => error!("layout save failed: {e}"),
                },
                _ => {}
            }
        }

        let mut settings_changed = false;
        while let Ok(res) = rx_fs.try_recv() {
            match res {
                Ok(event) => {
                    if event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == settings_file.file_name())
                    {
                        settings_changed = true;
                    }
                }
                Err(e) => warn!("settings watcher error: {e}"),
            }
        }
        if settings_changed {
            let s = store.load_settings();
            session.set_sensitivity(s.input.sensitivity);
            info!("sensitivity now {}", s.input.sensitivity);
        }

        raw.clear();
        let mut produced = 0;
        for dev in surfaces.iter_mut() {
            produced += dev.poll(&mut raw);
        }
        for ev in raw.drain(..) {
            session.handle_pointer(ev);
        }

        session.tick(Instant::now());
        for ev in session.drain_events() {
            link.send(&ev);
        }

        if produced == 0 {
            // Idle, but never sleep past the next flush tick.
            let until_flush = session
                .next_deadline()
                .saturating_duration_since(Instant::now());
            thread::sleep(until_flush.min(Duration::from_millis(4)));
        }
    }
}
