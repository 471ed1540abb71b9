//! Robot register protocol
//!
//! This crate defines the wire protocol between the cell host and the robot
//! controller. The robot exposes a bank of general-purpose holding registers
//! over Modbus/TCP; the host drives motion by writing a target pose and a
//! command code and then polling until the robot program clears the command.
//!
//! # Frame Overview
//!
//! Every request and response is one Modbus/TCP application data unit:
//! ```text
//! ┌────────────────┬─────────────┬────────┬──────┬──────────┬──────────────┐
//! │ TRANSACTION ID │ PROTOCOL ID │ LENGTH │ UNIT │ FUNCTION │ DATA         │
//! │ 2B             │ 2B (0)      │ 2B     │ 1B   │ 1B       │ 0–252B       │
//! └────────────────┴─────────────┴────────┴──────┴──────────┴──────────────┘
//! ```
//!
//! All multi-byte fields are big-endian. Only the three register functions
//! the robot program uses are modelled.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod pdu;
pub mod registers;

pub use frame::{Adu, FrameError, FrameParser, MAX_ADU_SIZE, MAX_PDU_SIZE, MBAP_HEADER_LEN};
pub use pdu::{ExceptionCode, Request, Response};
pub use registers::{Pose, RobotCommand};
