use serde::Deserialize;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::action::{ActionBindings, UnknownKeyPolicy};
use crate::pressure::PressureCurve;
use crate::report::ReportIds;

use super::PenCapabilities;

const CONFIG_FILE_NAME: &str = "kamvas-pad.toml";

/// On-disk configuration. Every section carries GT-191 defaults so a missing
/// file (or a partial one) still yields a working driver.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub device: DeviceSection,
    pub pen: PenCapabilities,
    pub pressure_curve: PressureCurve,
    pub reports: ReportIds,
    pub actions: ActionBindings,
    pub unknown_key_policy: UnknownKeyPolicy,
    pub map_to_display: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceSection {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            name: "kamvas-pen".into(),
            vendor_id: 0x256c,
            product_id: 0x006e,
        }
    }
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_from_default_paths() -> Option<FileConfig> {
    for path in default_config_paths() {
        if path.exists() {
            if let Some(config) = load_from_path(&path) {
                return Some(config);
            }
        }
    }
    None
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from(CONFIG_FILE_NAME));

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join(CONFIG_FILE_NAME));
    }

    paths
}

/// Where `--write-default-config` puts its output.
pub fn default_config_target() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".config").join(CONFIG_FILE_NAME),
        Err(_) => PathBuf::from(CONFIG_FILE_NAME),
    }
}

pub fn write_default_config(path: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
    if path.exists() {
        return Err(format!("not overwriting existing config at {}", path.display()).into());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TOML)?;
    Ok(())
}

/// Commented template with the Huion Kamvas GT-191 values.
pub const DEFAULT_CONFIG_TOML: &str = r##"# kamvas-pad configuration (Huion Kamvas GT-191 defaults)

# What to do when an action names a key that does not resolve:
#   "best-effort"  press the keys that do resolve (default)
#   "abort-action" drop the whole action, like the historical driver
unknown_key_policy = "best-effort"

# Uncomment to map the driver output onto one display:
# map_to_display = "HDMI-1"

[device]
name = "kamvas-pen"
vendor_id = 0x256c
product_id = 0x006e

[pen]
max_x = 58752
max_y = 33048
max_pressure = 8191
max_tilt_x = 60
max_tilt_y = 60
resolution = 5080

# Pressure response as a cubic Bezier, control points in [0,1]x[0,1].
# The default is the identity line: raw pressure passes through unchanged.
# The sampled curve must be monotonic in x.
[pressure_curve]
p0 = [0.0, 0.0]
p1 = [0.333, 0.333]
p2 = [0.667, 0.667]
p3 = [1.0, 1.0]

# Report-type byte for each semantic report. Other firmware revisions use
# different constants for the same reports; override them here.
[reports]
pen_idle = 0x80
pen_touch = 0x81
pen_button_1 = 0x82
pen_button_1_touch = 0x83
pen_button_2 = 0x84
pen_button_2_touch = 0x85
tablet_button = 0xe0
scrollbar = 0xf0

# One key name, or several joined with '+', per tablet event. An empty
# string binds nothing. The defaults make the pen behave like a stock
# stylus: tip contact clicks, the side buttons act as stylus buttons.
[actions]
pen_touch = "BTN_TOUCH"
pen_button_1 = "BTN_STYLUS"
pen_button_1_touch = "BTN_STYLUS+BTN_TOUCH"
pen_button_2 = "BTN_STYLUS2"
pen_button_2_touch = "BTN_STYLUS2+BTN_TOUCH"
# Indexed by tablet button (bit index of the button mask).
tablet_buttons = [
    "KEY_LEFTCTRL+KEY_Z",
    "KEY_E",
    "KEY_B",
    "KEY_LEFTCTRL+KEY_S",
    "KEY_LEFTCTRL+KEY_EQUAL",
    "KEY_LEFTCTRL+KEY_MINUS",
]
# Indexed by scrollbar position (1-based on the hardware).
tablet_scrollbar = ["KEY_1", "KEY_2", "KEY_3", "KEY_4", "KEY_5", "KEY_6", "KEY_7"]
tablet_scrollbar_increase = "KEY_RIGHTBRACE"
tablet_scrollbar_decrease = "KEY_LEFTBRACE"
"##;
