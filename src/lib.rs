//! # rot8d
//!
//! Follows the orientation iio-sensor-proxy publishes on D-Bus and keeps
//! sway's outputs and touch/pen calibration in line with it.

pub mod app;
pub mod backends;
pub mod config;
pub mod error;
pub mod orientation;
pub mod reaction;
pub mod sensors;

pub use error::{Error, Result};
pub use orientation::{Orientation, Transform};
