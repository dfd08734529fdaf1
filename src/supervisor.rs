//! Owns the streaming session: claim the device, wake it, then read reports
//! and turn them into virtual-device frames until disconnect.

use std::error::Error;
use std::io::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use evdevil::event::Abs;
use rusb::Error as UsbError;

use crate::action::ActionResolver;
use crate::config::Config;
use crate::display;
use crate::pressure::PressureTable;
use crate::report::{decode, Report};
use crate::usb::TabletHandle;
use crate::vpen::{EventSink, VirtualPen};

/// Why a streaming session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The device was physically removed. A later hotplug bind may start a
    /// new session.
    Disconnected,
    /// Another session already holds the device; this start was a no-op.
    Busy,
}

pub struct Supervisor {
    config: Arc<Config>,
    table: Arc<PressureTable>,
    running: Arc<AtomicBool>,
}

/// Clears the running flag on every exit path, panic included.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn try_acquire(flag: &Arc<AtomicBool>) -> Option<RunningGuard> {
    flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .ok()
        .map(|_| RunningGuard(flag.clone()))
}

impl Supervisor {
    pub fn new(config: Arc<Config>, table: Arc<PressureTable>) -> Self {
        Self {
            config,
            table,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claim the tablet and stream until it disappears. At most one session
    /// runs at a time; a concurrent caller gets `SessionEnd::Busy` back
    /// immediately instead of a second device claim.
    pub fn start(&self) -> Result<SessionEnd, Box<dyn Error + Send + Sync>> {
        let Some(_guard) = try_acquire(&self.running) else {
            return Ok(SessionEnd::Busy);
        };
        self.stream()
    }

    fn stream(&self) -> Result<SessionEnd, Box<dyn Error + Send + Sync>> {
        let config = &self.config;

        let tablet = TabletHandle::open(config.vendor_id, config.product_id)?;
        tablet.wake();

        let mut vpen = VirtualPen::create(
            &config.device_name,
            config.vendor_id,
            config.product_id,
            &config.pen,
            config.required_keys(),
        )?;

        if let Some(output) = &config.map_to_display {
            display::spawn_map_to_display(config.device_name.clone(), output.clone());
        }

        // Fresh edge state per session: after a reconnect the first resolved
        // action must be a press, never a hold of something pre-unplug.
        let mut resolver = ActionResolver::new(config.unknown_key_policy);
        let mut buf = vec![0u8; tablet.max_packet_size()];
        log::info!("{} streaming", config.device_name);

        loop {
            match tablet.read(&mut buf) {
                Ok(len) => {
                    if config.print_usb_data {
                        println!("{}", format_raw(&buf[..len]));
                    }
                    process_report(&buf[..len], config, &self.table, &mut resolver, &mut vpen)?;
                }
                Err(UsbError::NoDevice) => {
                    log::warn!("tablet disconnected");
                    drop(vpen);
                    return Ok(SessionEnd::Disconnected);
                }
                // No report this cycle.
                Err(UsbError::Timeout) => {}
                Err(e) => log::debug!("transient read error: {}", e),
            }
        }
    }
}

/// One full decode cycle for one raw report. Every recognized report ends in
/// exactly one sync, so consumers observe one atomic frame per report.
fn process_report(
    raw: &[u8],
    config: &Config,
    table: &PressureTable,
    resolver: &mut ActionResolver,
    sink: &mut impl EventSink,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(report) = decode(raw, &config.reports) else {
        log::debug!("malformed report ({} bytes), skipping cycle", raw.len());
        return Ok(());
    };

    match report {
        Report::Pen { kind, sample } => {
            match table.shape(sample.pressure) {
                Some(pressure) => {
                    sink.write_axis(Abs::X, sample.x);
                    sink.write_axis(Abs::Y, sample.y);
                    sink.write_axis(Abs::PRESSURE, pressure);
                    sink.write_axis(Abs::TILT_X, sample.tilt_x);
                    sink.write_axis(Abs::TILT_Y, sample.tilt_y);
                    if config.print_computed {
                        print!("X {} Y {} PRESS {}          \r", sample.x, sample.y, pressure);
                        let _ = std::io::stdout().flush();
                    }
                }
                None => log::warn!(
                    "pressure {} outside table domain, sample dropped",
                    sample.pressure
                ),
            }
            resolver.pen(kind, &config.actions, sink);
        }
        Report::TabletButton { mask } => resolver.tablet_button(mask, &config.actions, sink),
        Report::Scrollbar { position } => resolver.scrollbar(position, &config.actions, sink),
        Report::Unrecognized => {}
    }

    sink.sync()
}

/// Fixed-width byte row for `--print-usb-data`.
fn format_raw(raw: &[u8]) -> String {
    let mut row = String::new();
    for byte in raw {
        row.push_str(&format!("{:<6}", byte));
    }
    row
}
