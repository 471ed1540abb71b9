//! Hardware driver implementations
//!
//! This crate provides the mezzanine peripherals on top of the
//! `griddle-hal` pin and bus traits:
//!
//! - Hotplate relay
//! - Conveyor drive (forward / reverse pins)
//! - Panel buttons
//! - IR thermometer (MLX90614)
//!
//! [`Mezzanine`] bundles them and implements
//! [`HardwareIo`](griddle_core::traits::HardwareIo) for the recipe.

#![deny(unsafe_code)]

pub mod button;
pub mod conveyor;
pub mod hotplate;
pub mod mezzanine;
pub mod sensor;

pub use button::PanelButton;
pub use conveyor::Conveyor;
pub use hotplate::GpioHotplate;
pub use mezzanine::{Mezzanine, MezzaninePins};
pub use sensor::mlx90614::Mlx90614;
