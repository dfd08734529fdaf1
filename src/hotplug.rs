//! Re-arm the streaming session when the tablet is plugged back in.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rusb::{Context, Device, Hotplug, HotplugBuilder, UsbContext};

use crate::supervisor::{SessionEnd, Supervisor};

struct BindWatcher {
    supervisor: Arc<Supervisor>,
}

impl Hotplug<Context> for BindWatcher {
    fn device_arrived(&mut self, _device: Device<Context>) {
        log::info!("tablet bound, starting a session");
        let supervisor = self.supervisor.clone();
        thread::spawn(move || match supervisor.start() {
            Ok(SessionEnd::Disconnected) => {
                log::warn!("tablet disconnected, waiting for it to be plugged back in");
            }
            Ok(SessionEnd::Busy) => {
                log::debug!("a session is already streaming, bind ignored");
            }
            Err(e) => log::error!("session failed: {}", e),
        });
    }

    // Unbind notifications are ignored: only the read-error path declares a
    // disconnect, so notifications for unrelated devices sharing the bus
    // cannot tear down a healthy session.
    fn device_left(&mut self, _device: Device<Context>) {}
}

/// Spawn the hotplug listener thread, filtered to the configured
/// vendor/product id. Returns None when the platform lacks hotplug support.
pub fn spawn_watcher(
    supervisor: Arc<Supervisor>,
    vendor_id: u16,
    product_id: u16,
) -> Option<JoinHandle<()>> {
    if !rusb::has_hotplug() {
        log::warn!("libusb hotplug is unsupported here; replugging will not restart the driver");
        return None;
    }
    Some(thread::spawn(move || {
        if let Err(e) = watch(supervisor, vendor_id, product_id) {
            log::error!("hotplug watcher failed: {}", e);
        }
    }))
}

fn watch(supervisor: Arc<Supervisor>, vendor_id: u16, product_id: u16) -> rusb::Result<()> {
    let context = Context::new()?;
    let _registration = HotplugBuilder::new()
        .vendor_id(vendor_id)
        .product_id(product_id)
        .register(&context, Box::new(BindWatcher { supervisor }))?;

    loop {
        context.handle_events(None)?;
    }
}
