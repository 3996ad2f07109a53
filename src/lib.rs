//! Capture frames from video4linux webcams
//!
//! A [`Device`] is opened on a `/dev/video*` node, a [`Resolution`] is picked among the formats
//! and frame sizes it offers, then frames are taken one at a time ([`Device::snapshot`]) or
//! streamed through memory mapped buffers ([`Device::stream`]).
//!
//! ```no_run
//! use webcam::{Device, FourCC};
//!
//! fn main() -> webcam::Result<()> {
//!     let dev = Device::open("/dev/video0")?;
//!     let res = dev.frame_size().pixel_format(FourCC::MJPEG).width(1280).select()?;
//!     let snapshot = dev.snapshot(&res)?;
//!     std::fs::write("frame.jpg", snapshot.data())?;
//!     Ok(())
//! }
//! ```

pub mod v4l2;

pub mod buffer;
pub mod capability;
pub mod format;
pub mod framesize;
pub mod io;
pub mod probe;

mod capture;
pub use capture::Snapshot;

mod config;
pub use config::Config;

pub mod device;
pub use device::{Capture, Device};

mod error;
pub use error::{Error, Result};

mod fourcc;
pub use fourcc::FourCC;

mod selector;
pub use selector::{FrameSizeSelector, Resolution};

mod timestamp;
pub use timestamp::Timestamp;

pub use capability::Capabilities;
pub use format::{Description as FormatDescription, Format};
pub use framesize::{Discrete, FrameSize, FrameSizes, Stepwise};
pub use probe::{search_video_devices, search_with};
