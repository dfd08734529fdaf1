use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kamvas-pad")]
#[command(about = "Userland driver for Huion Kamvas pen tablets")]
#[command(version)]
pub struct Cli {
    /// Virtual device name registered with the input system
    #[arg(long)]
    pub device_name: Option<String>,

    /// USB vendor id (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_usb_id)]
    pub vendor_id: Option<u16>,

    /// USB product id (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_usb_id)]
    pub product_id: Option<u16>,

    /// Map driver output to the given display output (e.g. HDMI-1)
    #[arg(long)]
    pub map_to_display: Option<String>,

    /// Print each raw USB report to stdout
    #[arg(long)]
    pub print_usb_data: bool,

    /// Print the computed X, Y and pressure values
    #[arg(long)]
    pub print_computed_values: bool,

    /// Suppress all diagnostic output
    #[arg(long, short)]
    pub quiet: bool,

    /// Write a default config file and exit
    #[arg(long)]
    pub write_default_config: bool,

    /// Path to config file
    #[arg(long, env = "KAMVAS_CONFIG")]
    pub config: Option<PathBuf>,
}

fn parse_usb_id(s: &str) -> Result<u16, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("invalid USB id '{}'", s))
}
