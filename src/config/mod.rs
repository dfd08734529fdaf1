mod cli;
mod file;

pub use cli::Cli;
pub use file::{default_config_target, write_default_config};

use std::error::Error;

use evdevil::event::Key;
use serde::Deserialize;

use crate::action::{ActionBindings, UnknownKeyPolicy};
use crate::keys::resolve_key_name;
use crate::pressure::PressureCurve;
use crate::report::ReportIds;

/// Virtual axis ranges; also sizes the pressure table (`max_pressure + 1`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PenCapabilities {
    pub max_x: i32,
    pub max_y: i32,
    pub max_pressure: i32,
    pub max_tilt_x: i32,
    pub max_tilt_y: i32,
    pub resolution: i32,
}

impl Default for PenCapabilities {
    /// Huion Kamvas GT-191.
    fn default() -> Self {
        Self {
            max_x: 58752,
            max_y: 33048,
            max_pressure: 8191,
            max_tilt_x: 60,
            max_tilt_y: 60,
            resolution: 5080,
        }
    }
}

/// Merged configuration from the TOML file and CLI overrides.
#[derive(Debug, Clone)]
pub struct Config {
    pub device_name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub pen: PenCapabilities,
    pub pressure_curve: PressureCurve,
    pub reports: ReportIds,
    pub actions: ActionBindings,
    pub unknown_key_policy: UnknownKeyPolicy,
    pub map_to_display: Option<String>,
    pub print_usb_data: bool,
    pub print_computed: bool,
}

impl Config {
    /// Load configuration by merging the TOML file with CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let file_config = cli
            .config
            .as_ref()
            .and_then(|p| file::load_from_path(p))
            .or_else(file::load_from_default_paths)
            .unwrap_or_default();

        let config = Self {
            device_name: cli.device_name.clone().unwrap_or(file_config.device.name),
            vendor_id: cli.vendor_id.unwrap_or(file_config.device.vendor_id),
            product_id: cli.product_id.unwrap_or(file_config.device.product_id),
            pen: file_config.pen,
            pressure_curve: file_config.pressure_curve,
            reports: file_config.reports,
            actions: file_config.actions,
            unknown_key_policy: file_config.unknown_key_policy,
            map_to_display: cli.map_to_display.clone().or(file_config.map_to_display),
            print_usb_data: cli.print_usb_data && !cli.quiet,
            print_computed: cli.print_computed_values && !cli.quiet,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.device_name.is_empty() {
            return Err("device name must not be empty".into());
        }
        if self.vendor_id == 0 || self.product_id == 0 {
            return Err("vendor_id and product_id must be nonzero".into());
        }
        if self.pen.max_x <= 0 || self.pen.max_y <= 0 || self.pen.max_pressure <= 0 {
            return Err(format!(
                "pen axis ranges must be positive (max_x {}, max_y {}, max_pressure {})",
                self.pen.max_x, self.pen.max_y, self.pen.max_pressure
            ));
        }
        if self.pen.max_tilt_x < 0 || self.pen.max_tilt_y < 0 || self.pen.resolution < 0 {
            return Err(format!(
                "pen tilt/resolution must be non-negative (max_tilt_x {}, max_tilt_y {}, resolution {})",
                self.pen.max_tilt_x, self.pen.max_tilt_y, self.pen.resolution
            ));
        }
        Ok(())
    }

    /// The baseline pen buttons plus every key named in the bindings. The
    /// virtual device cannot grow capabilities after creation, so this must
    /// be the complete set up front.
    pub fn required_keys(&self) -> Vec<Key> {
        let mut keys = vec![
            Key::BTN_TOUCH,
            Key::BTN_TOOL_PEN,
            Key::BTN_STYLUS,
            Key::BTN_STYLUS2,
        ];
        for name in self.actions.key_names() {
            match resolve_key_name(name) {
                Some(key) => keys.push(key),
                None => log::warn!("unknown key name {:?} in bindings, not declared", name),
            }
        }
        keys.sort_unstable_by_key(|key| key.raw());
        keys.dedup_by_key(|key| key.raw());
        keys
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            device_name: "kamvas-pen".into(),
            vendor_id: 0x256c,
            product_id: 0x006e,
            pen: PenCapabilities::default(),
            pressure_curve: PressureCurve::default(),
            reports: ReportIds::default(),
            actions: ActionBindings::default(),
            unknown_key_policy: UnknownKeyPolicy::default(),
            map_to_display: None,
            print_usb_data: false,
            print_computed: false,
        }
    }
}
