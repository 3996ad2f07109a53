use std::{io, path::PathBuf};

use crate::FourCC;

/// Errors reported by device, selector and capture operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("device {} is not a video capturing device", .0.display())]
    NotCaptureDevice(PathBuf),

    #[error("device {} is not able to stream frames", .0.display())]
    NotStreamingDevice(PathBuf),

    #[error("pixel format {0} is not offered by the device")]
    UnsupportedFormat(FourCC),

    #[error("device does not offer any pixel format")]
    NoFormats,

    #[error("no frame size available for pixel format {0}")]
    NoFrameSizes(FourCC),

    #[error("driver granted no buffers")]
    NoBuffers,

    #[error("timed out waiting for a frame")]
    Timeout,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the error means the device node went away (unplugged, driver unbound)
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::Io(e) | Error::Open { source: e, .. } => e.raw_os_error() == Some(libc::ENODEV),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
