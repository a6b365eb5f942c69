use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::env;

use crate::config::{self, SENSITIVITY_MAX, SENSITIVITY_MIN, Store};
use crate::editor::LayoutEditor;
use crate::layout::{ControlId, ControlLayout};
use crate::pipeline;

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("run") => {
            let server: Option<String> = pargs.opt_value_from_str("--server")?;
            pipeline::run(server)
        }

        Some("layout") => {
            let what: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: padctl layout <show|reset|resize>"))?;
            let store = Store::open_default()?;
            match what.as_str() {
                "show" => {
                    let layout = config::load_layout(&store);
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&layout.snapshot()).unwrap_or_default()
                    );
                }
                "reset" => {
                    config::save_layout(&store, &ControlLayout::defaults())?;
                    println!("ok: layout reset to defaults");
                }
                "resize" => {
                    let name: String = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: padctl layout resize <control> <steps>"))?;
                    let steps: i32 = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: padctl layout resize <control> <steps>"))?;
                    let control = ControlId::from_name(&name)
                        .ok_or_else(|| anyhow!("unknown control: {name}"))?;
                    let mut layout = config::load_layout(&store);
                    LayoutEditor::new().resize(&mut layout, control, steps);
                    config::save_layout(&store, &layout)?;
                    let size = layout.get(control).map(|c| c.size).unwrap_or_default();
                    println!("ok: {name} is now {size} px");
                }
                other => return Err(anyhow!("unknown layout action: {other}")),
            }
            Ok(())
        }

        Some("sens") => {
            let value: f32 = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: padctl sens <value>"))?;
            if !(SENSITIVITY_MIN..=SENSITIVITY_MAX).contains(&value) {
                return Err(anyhow!(
                    "sensitivity must be in [{SENSITIVITY_MIN}, {SENSITIVITY_MAX}]"
                ));
            }
            let store = Store::open_default()?;
            let mut settings = store.load_settings();
            settings.input.sensitivity = value;
            store.save_settings(&settings)?;
            println!("ok: sensitivity set to {value}");
            Ok(())
        }

        Some("doctor") => {
            let store = Store::open_default()?;
            let report = config::doctor_report(&store);
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_default()
            );
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!(
        r#"padctl — touchscreen gamepad streamer

USAGE:
  padctl help [command]                   Show general or command-specific help
  padctl run [--server <host:port>]       Stream the touch surface to a host
  padctl layout show                      Print the effective layout
  padctl layout reset                     Restore the default layout
  padctl layout resize <control> <steps>  Step a control's size (10 px/step)
  padctl sens <value>                     Set touchpad sensitivity [0.1, 5.0]
  padctl doctor                           Diagnose permissions/devices

RUNTIME SIGNALS (while `padctl run` is active):
  SIGUSR1   toggle edit mode (drag controls instead of playing)
  SIGUSR2   save the current layout
  SIGHUP    reconnect to the host

TIPS:
  - Settings: ~/.config/padctl/settings.toml
  - Layout:   ~/.config/padctl/layout.json
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: padctl run [--server <host:port>]\nStreams gamepad events to the host; falls back to [server] addr in settings.toml."
        ),
        "layout" => println!(
            "usage:\n  padctl layout show\n  padctl layout reset\n  padctl layout resize <control> <steps>\nControls: joystick, touch_pad, button_a/b/x/y, key_r/c/x, mouse_left, mouse_right, shoulder_l/r, start, select."
        ),
        "sens" => println!(
            "usage: padctl sens <value>\nSets touchpad sensitivity (default 1.5). The running session picks it up live."
        ),
        "doctor" => println!(
            "usage: padctl doctor\nChecks /dev/input access and lists detected touch devices."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
