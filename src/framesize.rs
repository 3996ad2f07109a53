use std::convert::TryFrom;
use std::fmt;

use crate::v4l2::videodev::{
    v4l2_frmsizeenum, V4L2_FRMSIZE_TYPE_CONTINUOUS, V4L2_FRMSIZE_TYPE_DISCRETE,
    V4L2_FRMSIZE_TYPE_STEPWISE,
};
use crate::FourCC;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Frame size as returned by [`crate::v4l2::vidioc::VIDIOC_ENUM_FRAMESIZES`]
pub struct FrameSize {
    pub index: u32,
    pub fourcc: FourCC,
    pub size: FrameSizeEnum,
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.size.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSizeEnum {
    Discrete(Discrete),
    Stepwise(Stepwise),
}

impl FrameSizeEnum {
    /// Every discrete size described by this entry
    pub fn to_discrete(self) -> Vec<Discrete> {
        match self {
            Self::Discrete(discrete) => vec![discrete],
            Self::Stepwise(stepwise) => {
                let mut discrete = Vec::new();

                for width in (stepwise.min_width..=stepwise.max_width)
                    .step_by(stepwise.step_width.max(1) as usize)
                {
                    for height in (stepwise.min_height..=stepwise.max_height)
                        .step_by(stepwise.step_height.max(1) as usize)
                    {
                        discrete.push(Discrete { width, height });
                    }
                }

                discrete
            }
        }
    }
}

impl fmt::Display for FrameSizeEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSizeEnum::Discrete(val) => write!(f, "Discrete({})", val),
            FrameSizeEnum::Stepwise(val) => write!(f, "Stepwise({})", val),
        }
    }
}

impl TryFrom<v4l2_frmsizeenum> for FrameSizeEnum {
    type Error = String;

    fn try_from(desc: v4l2_frmsizeenum) -> Result<Self, Self::Error> {
        // The type field tells which union member the driver filled in.
        unsafe {
            match desc.type_ {
                V4L2_FRMSIZE_TYPE_DISCRETE => Ok(FrameSizeEnum::Discrete(Discrete {
                    width: desc.size.discrete.width,
                    height: desc.size.discrete.height,
                })),
                V4L2_FRMSIZE_TYPE_STEPWISE | V4L2_FRMSIZE_TYPE_CONTINUOUS => {
                    let stepwise = desc.size.stepwise;
                    let continuous = desc.type_ == V4L2_FRMSIZE_TYPE_CONTINUOUS;
                    Ok(FrameSizeEnum::Stepwise(Stepwise {
                        min_width: stepwise.min_width,
                        max_width: stepwise.max_width,
                        step_width: if continuous { 1 } else { stepwise.step_width },
                        min_height: stepwise.min_height,
                        max_height: stepwise.max_height,
                        step_height: if continuous { 1 } else { stepwise.step_height },
                    }))
                }
                typ => Err(format!("Unknown frame size type: {}", typ)),
            }
        }
    }
}

impl TryFrom<v4l2_frmsizeenum> for FrameSize {
    type Error = String;

    fn try_from(desc: v4l2_frmsizeenum) -> Result<Self, Self::Error> {
        Ok(FrameSize {
            index: desc.index,
            fourcc: FourCC::from(desc.pixel_format),
            size: FrameSizeEnum::try_from(desc)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Discrete {
    /// Width of the frame (in pixels).
    pub width: u32,
    /// Height of the frame (in pixels).
    pub height: u32,
}

impl fmt::Display for Discrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stepwise {
    /// Minimum frame width (in pixels).
    pub min_width: u32,
    /// Maximum frame width (in pixels).
    pub max_width: u32,
    /// Frame width step size (in pixels).
    pub step_width: u32,
    /// Minimum frame height (in pixels).
    pub min_height: u32,
    /// Maximum frame height (in pixels).
    pub max_height: u32,
    /// Frame height step size (in pixels).
    pub step_height: u32,
}

impl Stepwise {
    /// Whether `width`x`height` lies on the grid described by this range
    pub fn contains(&self, width: u32, height: u32) -> bool {
        on_grid(width, self.min_width, self.max_width, self.step_width)
            && on_grid(height, self.min_height, self.max_height, self.step_height)
    }

    /// The grid point closest to the requested size
    ///
    /// A requested dimension of 0 selects the maximum.
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::framesize::{Discrete, Stepwise};
    ///
    /// let range = Stepwise {
    ///     min_width: 16, max_width: 1920, step_width: 16,
    ///     min_height: 16, max_height: 1080, step_height: 8,
    /// };
    /// assert_eq!(range.nearest(650, 0), Discrete { width: 656, height: 1080 });
    /// ```
    pub fn nearest(&self, width: u32, height: u32) -> Discrete {
        Discrete {
            width: snap(width, self.min_width, self.max_width, self.step_width),
            height: snap(height, self.min_height, self.max_height, self.step_height),
        }
    }
}

fn on_grid(value: u32, min: u32, max: u32, step: u32) -> bool {
    value >= min && value <= max && (value - min) % step.max(1) == 0
}

fn snap(value: u32, min: u32, max: u32, step: u32) -> u32 {
    let step = step.max(1);
    // the largest value actually reachable from min
    let top = min + (max.saturating_sub(min) / step) * step;
    if value == 0 || value >= top {
        return top;
    }
    if value <= min {
        return min;
    }

    let below = min + ((value - min) / step) * step;
    let above = below + step;
    if above <= top && above - value < value - below {
        above
    } else {
        below
    }
}

impl fmt::Display for Stepwise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} - {}x{} with step {}/{}",
            self.min_width,
            self.min_height,
            self.max_width,
            self.max_height,
            self.step_width,
            self.step_height,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// All frame sizes a device offers for one pixel format
pub struct FrameSizes {
    pub fourcc: FourCC,
    discrete: Vec<Discrete>,
    stepwise: Vec<Stepwise>,
}

impl FrameSizes {
    pub fn new(fourcc: FourCC, sizes: impl IntoIterator<Item = FrameSize>) -> Self {
        let mut discrete = Vec::new();
        let mut stepwise = Vec::new();

        for size in sizes {
            match size.size {
                FrameSizeEnum::Discrete(d) => discrete.push(d),
                FrameSizeEnum::Stepwise(s) => stepwise.push(s),
            }
        }

        FrameSizes {
            fourcc,
            discrete,
            stepwise,
        }
    }

    /// Discrete sizes in driver enumeration order
    pub fn discrete(&self) -> &[Discrete] {
        &self.discrete
    }

    /// Stepwise (and continuous) ranges in driver enumeration order
    pub fn stepwise(&self) -> &[Stepwise] {
        &self.stepwise
    }

    /// Whether the device can capture `width`x`height` in this format
    pub fn supports(&self, width: u32, height: u32) -> bool {
        self.discrete
            .iter()
            .any(|d| d.width == width && d.height == height)
            || self.stepwise.iter().any(|s| s.contains(width, height))
    }

    pub fn is_empty(&self) -> bool {
        self.discrete.is_empty() && self.stepwise.is_empty()
    }
}
