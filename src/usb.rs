//! USB device acquisition: locate the tablet, claim its interfaces, run the
//! wake-up ritual, and read interrupt reports.

use std::error::Error;
use std::time::Duration;

use rusb::{ConfigDescriptor, Context, DeviceHandle, Direction, TransferType, UsbContext};

/// Primary endpoint read timeout. A timeout is the normal "no report this
/// cycle" condition, not an error.
const READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// The wake-up read only unsticks the firmware; keep it short.
const WAKE_TIMEOUT: Duration = Duration::from_millis(200);

struct StreamEndpoint {
    address: u8,
    max_packet_size: usize,
}

/// An opened, claimed tablet. Reports stream from interface 0's interrupt IN
/// endpoint; interface 1's endpoint only matters during wake-up.
pub struct TabletHandle {
    handle: DeviceHandle<Context>,
    primary: StreamEndpoint,
    secondary: Option<StreamEndpoint>,
}

impl TabletHandle {
    /// Locate the tablet by vendor/product id and forcefully claim every
    /// interface, detaching whatever kernel driver currently owns it.
    pub fn open(vendor_id: u16, product_id: u16) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let context = Context::new()?;
        let handle = context
            .open_device_with_vid_pid(vendor_id, product_id)
            .ok_or_else(|| {
                format!(
                    "tablet {:04x}:{:04x} not found (unplugged, no permission, or already open)",
                    vendor_id, product_id
                )
            })?;

        let config = handle.device().active_config_descriptor()?;
        for interface in config.interfaces() {
            let number = interface.number();
            if handle.kernel_driver_active(number).unwrap_or(false) {
                handle.detach_kernel_driver(number)?;
            }
            handle.claim_interface(number)?;
            log::info!("claimed interface {}", number);
        }

        let primary = interrupt_in_endpoint(&config, 0)
            .ok_or("interface 0 has no interrupt IN endpoint")?;
        let secondary = interrupt_in_endpoint(&config, 1);

        Ok(Self {
            handle,
            primary,
            secondary,
        })
    }

    /// Wake-up ritual after a tablet power cycle: iterate the string
    /// descriptors, then one throwaway read from the secondary endpoint.
    /// Without these the primary endpoint can stay silent after a reboot.
    /// Both steps are best-effort and their results are discarded.
    pub fn wake(&self) {
        for index in 0..=u8::MAX {
            let _ = self.handle.read_string_descriptor_ascii(index);
        }
        if let Some(secondary) = &self.secondary {
            let mut buf = vec![0u8; secondary.max_packet_size];
            let _ = self
                .handle
                .read_interrupt(secondary.address, &mut buf, WAKE_TIMEOUT);
        }
    }

    /// Report frame size for sizing the read buffer.
    pub fn max_packet_size(&self) -> usize {
        self.primary.max_packet_size
    }

    /// Blocking read of one report from the primary endpoint.
    pub fn read(&self, buf: &mut [u8]) -> rusb::Result<usize> {
        self.handle
            .read_interrupt(self.primary.address, buf, READ_TIMEOUT)
    }
}

fn interrupt_in_endpoint(
    config: &ConfigDescriptor,
    interface_number: u8,
) -> Option<StreamEndpoint> {
    for interface in config.interfaces() {
        if interface.number() != interface_number {
            continue;
        }
        for descriptor in interface.descriptors() {
            for endpoint in descriptor.endpoint_descriptors() {
                if endpoint.direction() == Direction::In
                    && endpoint.transfer_type() == TransferType::Interrupt
                {
                    return Some(StreamEndpoint {
                        address: endpoint.address(),
                        max_packet_size: endpoint.max_packet_size() as usize,
                    });
                }
            }
        }
    }
    None
}
