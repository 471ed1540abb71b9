//! Mezzanine board
//!
//! Everything on the cell's I/O mezzanine behind one
//! [`HardwareIo`] implementation: hotplate relay, conveyor drive, START and
//! STOP buttons and the IR thermometer.

use std::fmt::Display;

use griddle_core::traits::{Button, ConveyorDirection, HardwareError, HardwareIo};
use griddle_hal::{I2cBus, InputPin, OutputPin};
use tracing::{debug, info};

use crate::button::PanelButton;
use crate::conveyor::Conveyor;
use crate::hotplate::GpioHotplate;
use crate::sensor::mlx90614::{Mlx90614, SensorError};

/// GPIO lines used by the mezzanine
pub struct MezzaninePins<O, I> {
    pub hotplate: O,
    pub conveyor_forward: O,
    pub conveyor_reverse: O,
    pub start: I,
    pub stop: I,
}

/// The mezzanine's peripherals, brought up and ready
pub struct Mezzanine<O, I, B> {
    hotplate: GpioHotplate<O>,
    conveyor: Conveyor<O>,
    start: PanelButton<I>,
    stop: PanelButton<I>,
    thermometer: Mlx90614<B>,
}

impl<O, I, B> Mezzanine<O, I, B>
where
    O: OutputPin,
    O::Error: Display,
    I: InputPin,
    I::Error: Display,
    B: I2cBus,
    B::Error: Display,
{
    /// Initialize every peripheral
    ///
    /// Drives all outputs low, checks that neither button is held and takes
    /// a first valid thermometer reading.
    pub fn bring_up(
        pins: MezzaninePins<O, I>,
        thermometer: Mlx90614<B>,
    ) -> Result<Self, HardwareError> {
        info!("Initializing hotplate");
        let hotplate = GpioHotplate::new(pins.hotplate).map_err(gpio_error("hotplate"))?;

        info!("Initializing conveyor");
        let conveyor = Conveyor::new(pins.conveyor_forward, pins.conveyor_reverse)
            .map_err(gpio_error("conveyor"))?;

        info!("Initializing buttons");
        let mut mezzanine = Self {
            hotplate,
            conveyor,
            start: PanelButton::active_low(pins.start),
            stop: PanelButton::active_high(pins.stop),
            thermometer,
        };
        for button in [Button::Stop, Button::Start] {
            if mezzanine.read_button(button)? {
                return Err(HardwareError::ButtonPressed(button));
            }
        }

        info!(
            "Initializing temperature sensor at {:#04x}",
            mezzanine.thermometer.address()
        );
        mezzanine.thermometer.wake();
        let celsius = mezzanine.read_temperature()?;
        info!("Temperature sensor reads {:.2} °C", celsius);

        Ok(mezzanine)
    }

    /// Check if the hotplate was last switched on
    pub fn hotplate_on(&self) -> bool {
        self.hotplate.is_on()
    }

    /// Last conveyor direction set
    pub fn conveyor_direction(&self) -> ConveyorDirection {
        self.conveyor.direction()
    }
}

impl<O, I, B> HardwareIo for Mezzanine<O, I, B>
where
    O: OutputPin,
    O::Error: Display,
    I: InputPin,
    I::Error: Display,
    B: I2cBus,
    B::Error: Display,
{
    fn read_temperature(&mut self) -> Result<f64, HardwareError> {
        self.thermometer.read_celsius().map_err(|e| match e {
            SensorError::Bus(e) => HardwareError::SensorBus(e.to_string()),
            SensorError::Flagged(raw) => HardwareError::SensorFault { raw },
        })
    }

    fn set_conveyor(&mut self, direction: ConveyorDirection) -> Result<(), HardwareError> {
        debug!("Conveyor {:?}", direction);
        self.conveyor
            .set_direction(direction)
            .map_err(gpio_error("conveyor"))
    }

    fn set_hotplate(&mut self, on: bool) -> Result<(), HardwareError> {
        info!("Hotplate {}", if on { "on" } else { "off" });
        self.hotplate.set_on(on).map_err(gpio_error("hotplate"))
    }

    fn read_button(&mut self, button: Button) -> Result<bool, HardwareError> {
        match button {
            Button::Start => self.start.is_pressed().map_err(gpio_error("start button")),
            Button::Stop => self.stop.is_pressed().map_err(gpio_error("stop button")),
        }
    }
}

fn gpio_error<E: Display>(device: &'static str) -> impl FnOnce(E) -> HardwareError {
    move |e| HardwareError::Gpio {
        device,
        reason: e.to_string(),
    }
}
