//! Mezzanine hardware configuration
//!
//! Pin numbers are kernel GPIO numbers as exported through sysfs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Mezzanine pin and bus assignments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// sysfs GPIO class directory
    pub gpio_root: PathBuf,
    /// Hotplate relay (active high)
    pub hotplate_gpio: u32,
    /// Conveyor forward drive (active high)
    pub conveyor_forward_gpio: u32,
    /// Conveyor reverse drive (active high)
    pub conveyor_reverse_gpio: u32,
    /// START button (pressed reads low)
    pub start_gpio: u32,
    /// STOP button (pressed reads high)
    pub stop_gpio: u32,
    /// I2C bus the IR thermometer sits on
    pub i2c_bus: u8,
    /// IR thermometer 7-bit address
    pub thermometer_address: u8,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            gpio_root: PathBuf::from("/sys/class/gpio"),
            hotplate_gpio: 68,
            conveyor_forward_gpio: 66,
            conveyor_reverse_gpio: 67,
            start_gpio: 44,
            stop_gpio: 45,
            i2c_bus: 2,
            thermometer_address: 0x5A,
        }
    }
}

impl HardwareConfig {
    /// Every GPIO line the cell uses, with the function it serves
    pub fn gpio_assignments(&self) -> [(&'static str, u32); 5] {
        [
            ("hotplate", self.hotplate_gpio),
            ("conveyor forward", self.conveyor_forward_gpio),
            ("conveyor reverse", self.conveyor_reverse_gpio),
            ("start button", self.start_gpio),
            ("stop button", self.stop_gpio),
        ]
    }
}
