//! Virtual pen device over uinput.

use std::error::Error;

use evdevil::event::{Abs, EventType, InputEvent, Key};
use evdevil::uinput::{AbsSetup, UinputDevice};
use evdevil::{AbsInfo, Bus, InputId, InputProp};

use crate::config::PenCapabilities;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;
pub const SYN_REPORT: u16 = 0;

/// EV_KEY transition values: 0 = release, 1 = press, 2 = autorepeat hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState {
    Up,
    Down,
    Hold,
}

impl PressState {
    pub fn value(self) -> i32 {
        match self {
            PressState::Up => 0,
            PressState::Down => 1,
            PressState::Hold => 2,
        }
    }
}

/// Receives one decode cycle's worth of events; `sync` flushes everything
/// written since the previous `sync` as one atomic input frame.
pub trait EventSink {
    fn write_axis(&mut self, axis: Abs, value: i32);
    fn write_key(&mut self, key: Key, state: PressState);
    fn sync(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub struct VirtualPen {
    device: UinputDevice,
    batch: Vec<InputEvent>,
}

impl VirtualPen {
    /// Declare the full capability set up front: uinput cannot grow a device
    /// after creation, so `keys` must already cover every bound action.
    pub fn create(
        name: &str,
        vendor_id: u16,
        product_id: u16,
        caps: &PenCapabilities,
        keys: Vec<Key>,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let axes = [
            AbsSetup::new(
                Abs::X,
                AbsInfo::new(0, caps.max_x).with_resolution(caps.resolution),
            ),
            AbsSetup::new(
                Abs::Y,
                AbsInfo::new(0, caps.max_y).with_resolution(caps.resolution),
            ),
            AbsSetup::new(Abs::PRESSURE, AbsInfo::new(0, caps.max_pressure)),
            AbsSetup::new(Abs::TILT_X, AbsInfo::new(-caps.max_tilt_x, caps.max_tilt_x)),
            AbsSetup::new(Abs::TILT_Y, AbsInfo::new(-caps.max_tilt_y, caps.max_tilt_y)),
        ];

        let device = UinputDevice::builder()?
            .with_input_id(InputId::new(Bus::from_raw(0x03), vendor_id, product_id, 0))?
            .with_props([InputProp::DIRECT])?
            .with_abs_axes(axes)?
            .with_keys(keys)?
            .build(name)?;

        if let Ok(sysname) = device.sysname() {
            log::info!(
                "virtual pen created: /sys/devices/virtual/input/{}",
                sysname.to_string_lossy()
            );
        }

        Ok(Self {
            device,
            batch: Vec::with_capacity(32),
        })
    }
}

impl EventSink for VirtualPen {
    fn write_axis(&mut self, axis: Abs, value: i32) {
        self.batch
            .push(InputEvent::new(EventType::from_raw(EV_ABS), axis.raw(), value));
    }

    fn write_key(&mut self, key: Key, state: PressState) {
        self.batch.push(InputEvent::new(
            EventType::from_raw(EV_KEY),
            key.raw(),
            state.value(),
        ));
    }

    fn sync(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.batch
            .push(InputEvent::new(EventType::from_raw(EV_SYN), SYN_REPORT, 0));
        let result = self.device.write(&self.batch);
        self.batch.clear();
        result?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_state_values_match_evdev() {
        assert_eq!(PressState::Up.value(), 0);
        assert_eq!(PressState::Down.value(), 1);
        assert_eq!(PressState::Hold.value(), 2);
    }
}
