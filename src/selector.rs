use std::fmt;

use tracing::{debug, warn};

use crate::device::Capture;
use crate::framesize::Discrete;
use crate::{Error, FourCC, Result};

/// Pixel format and frame size to capture with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub fourcc: FourCC,
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(fourcc: FourCC, width: u32, height: u32) -> Self {
        Resolution {
            fourcc,
            width,
            height,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.fourcc, self.width, self.height)
    }
}

/// Picks a [`Resolution`] among the frame sizes a device offers
///
/// Without any constraint the default format is used at its first enumerated size. A requested
/// width or height picks the closest offered value, the first one in driver order winning ties.
///
/// # Example
///
/// ```
/// use webcam::{Device, FourCC};
///
/// if let Ok(dev) = Device::open("/dev/video0") {
///     let resolution = dev
///         .frame_size()
///         .pixel_format(FourCC::YUYV)
///         .width(640)
///         .select();
/// }
/// ```
pub struct FrameSizeSelector<'a, C: Capture + ?Sized> {
    dev: &'a C,
    fourcc: Option<FourCC>,
    name: Option<String>,
    default: FourCC,
    width: u32,
    height: u32,
}

impl<'a, C: Capture + ?Sized> FrameSizeSelector<'a, C> {
    pub fn new(dev: &'a C) -> Self {
        FrameSizeSelector {
            dev,
            fourcc: None,
            name: None,
            default: FourCC::MJPEG,
            width: 0,
            height: 0,
        }
    }

    /// Requires this pixel format, selection fails if the device does not offer it
    pub fn pixel_format(mut self, fourcc: FourCC) -> Self {
        self.fourcc = Some(fourcc);
        self
    }

    /// Prefers the format named by a `V4L2_PIX_FMT_*` constant or four character code
    ///
    /// Unknown or unoffered names fall back to the default format.
    pub fn pixel_format_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Format used when none is requested, if the device offers it
    pub fn default_format(mut self, fourcc: FourCC) -> Self {
        self.default = fourcc;
        self
    }

    /// Desired width in pixels, 0 takes the first offered size
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Desired height in pixels, 0 takes the first size offered for the chosen width
    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn select(self) -> Result<Resolution> {
        let fourcc = self.select_format()?;
        let sizes = self.dev.frame_sizes(fourcc)?;

        let resolution = if !sizes.discrete().is_empty() {
            let discrete = sizes.discrete();
            let width = closest(discrete.iter().map(|d| d.width), self.width);
            let height = closest(
                discrete
                    .iter()
                    .filter(|d| Some(d.width) == width)
                    .map(|d| d.height),
                self.height,
            );

            match (width, height) {
                (Some(width), Some(height)) => Resolution::new(fourcc, width, height),
                _ => return Err(Error::NoFrameSizes(fourcc)),
            }
        } else if let Some(stepwise) = sizes.stepwise().first() {
            let Discrete { width, height } = stepwise.nearest(self.width, self.height);
            Resolution::new(fourcc, width, height)
        } else {
            return Err(Error::NoFrameSizes(fourcc));
        };

        debug!(
            width = self.width,
            height = self.height,
            selected = %resolution,
            "selected frame size"
        );
        Ok(resolution)
    }

    fn select_format(&self) -> Result<FourCC> {
        let offered: Vec<FourCC> = self
            .dev
            .enum_formats()?
            .iter()
            .map(|desc| desc.fourcc)
            .collect();

        let first = match offered.first() {
            Some(first) => *first,
            None => return Err(Error::NoFormats),
        };
        let default = if offered.contains(&self.default) {
            self.default
        } else {
            first
        };

        if let Some(fourcc) = self.fourcc {
            return if offered.contains(&fourcc) {
                Ok(fourcc)
            } else {
                Err(Error::UnsupportedFormat(fourcc))
            };
        }

        if let Some(name) = &self.name {
            return match FourCC::from_name(name) {
                Some(fourcc) if offered.contains(&fourcc) => Ok(fourcc),
                _ => {
                    warn!(name = %name, fallback = %default, "pixel format not offered");
                    Ok(default)
                }
            };
        }

        Ok(default)
    }
}

// Value closest to `target`, the first one winning ties. A target of 0 takes the first value.
fn closest(values: impl Iterator<Item = u32>, target: u32) -> Option<u32> {
    let mut best: Option<u32> = None;

    for value in values {
        if target == 0 {
            return Some(value);
        }

        match best {
            Some(b) if b.abs_diff(target) <= value.abs_diff(target) => {}
            _ => best = Some(value),
        }
    }

    best
}
