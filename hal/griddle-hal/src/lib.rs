//! Griddle Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits that the cell
//! drivers are written against. Platform crates implement them for a
//! concrete board, so the same driver code runs on the cell computer and
//! against mocks in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  griddle-drivers / griddle-controller   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  griddle-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ griddle-hal-  │
//!             │    linux      │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`i2c::I2cBus`] - I2C bus operations

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, OutputPin, PinLevel};
pub use i2c::I2cBus;
