//! Panel buttons
//!
//! STOP is wired normally-open to the supply (pressed reads high); START
//! is pulled up and pressing it shorts to ground (pressed reads low).

use griddle_hal::{InputPin, PinLevel};

/// Push button on a GPIO input
pub struct PanelButton<P> {
    pin: P,
    /// Level the pin reads while pressed
    pressed_level: PinLevel,
}

impl<P: InputPin> PanelButton<P> {
    /// Create a button that reads `pressed_level` while pressed
    pub fn new(pin: P, pressed_level: PinLevel) -> Self {
        Self { pin, pressed_level }
    }

    /// Button that reads high while pressed
    pub fn active_high(pin: P) -> Self {
        Self::new(pin, PinLevel::High)
    }

    /// Button that reads low while pressed
    pub fn active_low(pin: P) -> Self {
        Self::new(pin, PinLevel::Low)
    }

    /// Sample the button
    pub fn is_pressed(&mut self) -> Result<bool, P::Error> {
        Ok(self.pin.level()? == self.pressed_level)
    }
}
