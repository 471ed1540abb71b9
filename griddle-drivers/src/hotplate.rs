//! Hotplate relay output
//!
//! The hotplate is switched by a relay on one GPIO line, active high.

use griddle_hal::OutputPin;

/// Hotplate switched by a GPIO pin
pub struct GpioHotplate<P> {
    pin: P,
    /// Current logical state (true = heating)
    on: bool,
}

impl<P: OutputPin> GpioHotplate<P> {
    /// Create a new hotplate output, switched off
    pub fn new(pin: P) -> Result<Self, P::Error> {
        let mut hotplate = Self { pin, on: false };
        hotplate.set_on(false)?;
        Ok(hotplate)
    }

    /// Switch the hotplate
    pub fn set_on(&mut self, on: bool) -> Result<(), P::Error> {
        if on {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.on = on;
        Ok(())
    }

    /// Check if the hotplate was last switched on
    pub fn is_on(&self) -> bool {
        self.on
    }
}
