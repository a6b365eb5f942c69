use anyhow::Result;
use directories::UserDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::layout::{ControlLayout, Surface};
use crate::mapper::DEFAULT_SENSITIVITY;

/// Store key holding the layout snapshot.
pub const LAYOUT_KEY: &str = "layout";

const SETTINGS_FILE: &str = "settings.toml";

/// Accepted sensitivity range; storage itself does not constrain the value.
pub const SENSITIVITY_MIN: f32 = 0.1;
pub const SENSITIVITY_MAX: f32 = 5.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub surface: SurfaceSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceSettings {
    #[serde(default = "default_surface_width")]
    pub width: f32,
    #[serde(default = "default_surface_height")]
    pub height: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSettings {
    pub addr: Option<String>,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            width: default_surface_width(),
            height: default_surface_height(),
        }
    }
}

impl SurfaceSettings {
    pub fn surface(&self) -> Surface {
        Surface {
            width: self.width,
            height: self.height,
        }
    }
}

fn default_sensitivity() -> f32 {
    DEFAULT_SENSITIVITY
}
fn default_surface_width() -> f32 {
    1280.0
}
fn default_surface_height() -> f32 {
    720.0
}

fn config_dir() -> PathBuf {
    let home = UserDirs::new().unwrap().home_dir().to_path_buf();
    home.join(".config").join("padctl")
}

/// File-per-key blob store in the config directory, plus the settings file.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn open_default() -> Result<Self> {
        let dir = config_dir();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_path(key)).ok()
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.key_path(key), value)?;
        Ok(())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    /// Missing file is the defaults; an unparseable file is the defaults with
    /// a warning. Settings are never a reason to refuse to start.
    pub fn load_settings(&self) -> Settings {
        let path = self.settings_path();
        let Ok(txt) = fs::read_to_string(&path) else {
            return Settings::default();
        };
        match toml::from_str(&txt) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to parse {}: {e}; using defaults", path.display());
                Settings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let txt = toml::to_string_pretty(settings)?;
        fs::write(self.settings_path(), txt)?;
        Ok(())
    }
}

/// Compiled-in defaults, overridden control-by-control by the persisted
/// snapshot. A snapshot that does not parse at all is ignored entirely.
pub fn load_layout(store: &Store) -> ControlLayout {
    let mut layout = ControlLayout::defaults();
    if let Some(blob) = store.get(LAYOUT_KEY) {
        match serde_json::from_str::<serde_json::Value>(&blob) {
            Ok(snapshot) => layout.apply_snapshot(&snapshot),
            Err(e) => warn!("persisted layout is unreadable ({e}); using defaults"),
        }
    }
    layout
}

pub fn save_layout(store: &Store, layout: &ControlLayout) -> Result<()> {
    let blob = serde_json::to_string_pretty(&layout.snapshot())?;
    store.set(LAYOUT_KEY, &blob)
}

pub fn doctor_report(store: &Store) -> serde_json::Value {
    let devices: Vec<String> = crate::surface::discover_touch_devices()
        .into_iter()
        .map(|d| format!("{} ({})", d.name, d.path))
        .collect();
    let settings = store.load_settings();
    serde_json::json!({
        "dev_input_readable": fs::read_dir("/dev/input").is_ok(),
        "input_group_member": check_in_input_group(),
        "config_dir": store.dir(),
        "settings": settings,
        "layout_saved": store.get(LAYOUT_KEY).is_some(),
        "devices": devices,
        "hints": {
            "add_user_to_input_group": "sudo usermod -aG input $USER && newgrp input"
        }
    })
}

fn check_in_input_group() -> bool {
    if let Ok(s) = fs::read_to_string("/etc/group") {
        let user = whoami::username();
        for line in s.lines() {
            if line.starts_with("input:") {
                if line
                    .split(':')
                    .nth(3)
                    .unwrap_or("")
                    .split(',')
                    .any(|u| u == user)
                {
                    return true;
                }
            }
        }
    }
    false
}
