//! Raw video4linux kernel interface
//!
//! Everything above this module talks to the driver through these wrappers.

mod api;
pub use api::*;

pub mod videodev;
pub mod vidioc;
