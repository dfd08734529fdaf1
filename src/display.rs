//! Map the virtual device's output onto one display via xinput.

use std::process::Command;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const MAP_ATTEMPTS: u32 = 10;
const MAP_RETRY_DELAY: Duration = Duration::from_millis(500);

/// The X server needs a moment to pick up a fresh uinput device, so poll
/// `xinput list` until the device shows up, then map it to the display.
pub fn spawn_map_to_display(device_name: String, display: String) -> JoinHandle<()> {
    thread::spawn(move || {
        for _ in 0..MAP_ATTEMPTS {
            thread::sleep(MAP_RETRY_DELAY);

            let listed = Command::new("xinput")
                .arg("list")
                .output()
                .map(|output| String::from_utf8_lossy(&output.stdout).contains(&device_name))
                .unwrap_or(false);
            if !listed {
                continue;
            }

            match Command::new("xinput")
                .args(["map-to-output", &device_name, &display])
                .status()
            {
                Ok(status) if status.success() => {
                    log::info!("driver output mapped to {}", display);
                }
                Ok(status) => log::warn!("xinput map-to-output exited with {}", status),
                Err(e) => log::warn!("could not run xinput: {}", e),
            }
            return;
        }
        log::warn!(
            "driver output could not be mapped to {} ({:?} never appeared in xinput list)",
            display,
            device_name
        );
    })
}
