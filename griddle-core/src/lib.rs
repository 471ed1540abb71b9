//! Board-agnostic core logic for the patty cell controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or transport implementations:
//!
//! - Collaborator traits (register bus, robot arm, hardware I/O, detector, clock)
//! - Recipe model (step definitions, cooking tasks, recipe templates)
//! - Task scheduler (registry of live tasks, tick and reap)
//! - Robot actuation protocol (claim / dispatch / release / await)
//! - Configuration type definitions
//!
//! Everything here runs on the single control thread. Step actions and the
//! actuator's polling loops block that thread; concurrency between cooking
//! items is only apparent, produced by ticking every task in quick
//! succession.

#![deny(unsafe_code)]

pub mod actuator;
pub mod config;
pub mod recipe;
pub mod scheduler;
pub mod traits;
