//! Mezzanine bring-up on the cell computer

use griddle_core::config::HardwareConfig;
use griddle_core::traits::HardwareError;
use griddle_drivers::{Mezzanine, MezzaninePins, Mlx90614};
use griddle_hal::i2c::I2cConfig;
use griddle_hal_linux::{GpioError, I2cTools, SysfsPin};

/// The mezzanine as wired on the cell computer
pub type CellMezzanine = Mezzanine<SysfsPin, SysfsPin, I2cTools>;

/// Open every GPIO line and bring the mezzanine up
pub fn bring_up(config: &HardwareConfig) -> Result<CellMezzanine, HardwareError> {
    let root = config.gpio_root.as_path();
    let pins = MezzaninePins {
        hotplate: SysfsPin::output(root, config.hotplate_gpio).map_err(open_error("hotplate"))?,
        conveyor_forward: SysfsPin::output(root, config.conveyor_forward_gpio)
            .map_err(open_error("conveyor forward"))?,
        conveyor_reverse: SysfsPin::output(root, config.conveyor_reverse_gpio)
            .map_err(open_error("conveyor reverse"))?,
        start: SysfsPin::input(root, config.start_gpio).map_err(open_error("start button"))?,
        stop: SysfsPin::input(root, config.stop_gpio).map_err(open_error("stop button"))?,
    };

    let bus = I2cTools::new(I2cConfig {
        bus: config.i2c_bus,
    });
    Mezzanine::bring_up(pins, Mlx90614::new(bus, config.thermometer_address))
}

fn open_error(device: &'static str) -> impl FnOnce(GpioError) -> HardwareError {
    move |e| HardwareError::Gpio {
        device,
        reason: e.to_string(),
    }
}
