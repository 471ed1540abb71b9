//! GPIO pin abstractions
//!
//! On the cell computer every pin access goes through the kernel and can
//! fail, so unlike a register-mapped MCU pin these operations return
//! `Result`.

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl PinLevel {
    /// Level from a boolean (true = high)
    pub const fn from_bool(high: bool) -> Self {
        if high {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }

    /// Check if this is the high level
    pub const fn is_high(self) -> bool {
        matches!(self, PinLevel::High)
    }
}

/// Digital output pin
pub trait OutputPin {
    /// Error type for pin operations
    type Error;

    /// Set the pin high (logic 1)
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Set the pin low (logic 0)
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Set the pin to a specific level
    fn set_level(&mut self, level: PinLevel) -> Result<(), Self::Error> {
        match level {
            PinLevel::High => self.set_high(),
            PinLevel::Low => self.set_low(),
        }
    }

    /// Read back the level the pin is currently driving
    fn output_level(&mut self) -> Result<PinLevel, Self::Error>;
}

/// Digital input pin
pub trait InputPin {
    /// Error type for pin operations
    type Error;

    /// Sample the pin
    fn level(&mut self) -> Result<PinLevel, Self::Error>;

    /// Check if the pin reads high (logic 1)
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.level().map(PinLevel::is_high)
    }

    /// Check if the pin reads low (logic 0)
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
