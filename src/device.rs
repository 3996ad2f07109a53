use std::convert::TryFrom;
use std::os::raw::{c_int, c_void};
use std::path::{Path, PathBuf};
use std::{io, mem, sync::Arc};

use tracing::{debug, info, warn};

use crate::capability::{Capabilities, Flags};
use crate::format::{Description, Format};
use crate::framesize::{Discrete, FrameSize, FrameSizes};
use crate::selector::{FrameSizeSelector, Resolution};
use crate::v4l2;
use crate::v4l2::videodev::{
    v4l2_capability, v4l2_fmtdesc, v4l2_format, v4l2_frmsizeenum, V4L2_BUF_TYPE_VIDEO_CAPTURE,
};
use crate::{Config, Error, FourCC, Result};

/// Owned file descriptor of an opened device node
///
/// Shared between a [`Device`] and the streams created from it, the descriptor is closed when
/// the last reference goes away.
#[derive(Debug)]
pub struct Handle {
    fd: c_int,
}

impl Handle {
    /// Returns the raw file descriptor
    pub fn fd(&self) -> c_int {
        self.fd
    }

    /// Polls the file descriptor for I/O events
    ///
    /// Returns the number of ready descriptors, so 0 means the timeout expired.
    ///
    /// # Arguments
    ///
    /// * `events` - The events to wait for (see [`libc::POLLIN`])
    /// * `timeout` - Timeout in milliseconds, -1 waits forever
    pub fn poll(&self, events: i16, timeout: i32) -> io::Result<i32> {
        let mut pollfd = libc::pollfd {
            fd: self.fd,
            events,
            revents: 0,
        };

        loop {
            let ret = unsafe { libc::poll(&mut pollfd, 1, timeout) };
            if ret != -1 {
                return Ok(ret);
            }

            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn close(self) -> io::Result<()> {
        let fd = self.fd;
        mem::forget(self);
        v4l2::close(fd)
    }
}

impl From<c_int> for Handle {
    fn from(fd: c_int) -> Self {
        Handle { fd }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Err(e) = v4l2::close(self.fd) {
            warn!(fd = self.fd, error = %e, "failed to close device");
        }
    }
}

/// Format and frame size queries of a capture device
///
/// [`Device`] answers these with ioctls, the provided methods only build on the two required
/// enumerations.
pub trait Capture {
    /// Formats offered for video capture, in driver order
    fn enum_formats(&self) -> Result<Vec<Description>>;

    /// Frame sizes offered for `fourcc`, in driver order
    ///
    /// A format the driver knows no sizes for yields an empty list.
    fn enum_framesizes(&self, fourcc: FourCC) -> Result<Vec<FrameSize>>;

    /// Whether `fourcc` is among the enumerated formats
    fn supports_format(&self, fourcc: FourCC) -> Result<bool> {
        Ok(self.enum_formats()?.iter().any(|desc| desc.fourcc == fourcc))
    }

    fn frame_sizes(&self, fourcc: FourCC) -> Result<FrameSizes> {
        Ok(FrameSizes::new(fourcc, self.enum_framesizes(fourcc)?))
    }

    /// Discrete frame sizes offered for `fourcc`
    fn all_discrete(&self, fourcc: FourCC) -> Result<Vec<Discrete>> {
        Ok(self.frame_sizes(fourcc)?.discrete().to_vec())
    }

    /// Discrete frame sizes offered for Motion-JPEG
    fn all_discrete_mjpeg(&self) -> Result<Vec<Discrete>> {
        self.all_discrete(FourCC::MJPEG)
    }

    /// Whether `width`x`height` is one of the discrete sizes offered for `fourcc`
    fn supports_discrete(&self, fourcc: FourCC, width: u32, height: u32) -> Result<bool> {
        Ok(self
            .all_discrete(fourcc)?
            .iter()
            .any(|size| size.width == width && size.height == height))
    }
}

/// An opened video capture device
pub struct Device {
    handle: Arc<Handle>,
    path: PathBuf,
    caps: Capabilities,
    config: Config,
}

impl Device {
    /// Opens a capture device with the default configuration
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the device node, e.g. `/dev/video0`
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::Device;
    ///
    /// if let Ok(dev) = Device::open("/dev/video0") {
    ///     println!("{}", dev.capabilities());
    /// }
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(path, &Config::default())
    }

    /// Opens a capture device
    ///
    /// The node must support video capture through streaming I/O.
    pub fn with_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let fd = v4l2::open(path, libc::O_RDWR).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        // from here on the handle closes the fd on every early return
        let handle = Handle::from(fd);

        let caps = query_caps(&handle)?;
        if !caps.has(Flags::VIDEO_CAPTURE) {
            return Err(Error::NotCaptureDevice(path.to_path_buf()));
        }
        if !caps.has(Flags::STREAMING) {
            return Err(Error::NotStreamingDevice(path.to_path_buf()));
        }

        info!(path = %path.display(), card = %caps.card, driver = %caps.driver, "opened device");

        Ok(Device {
            handle: Arc::new(handle),
            path: path.to_path_buf(),
            caps,
            config: config.clone(),
        })
    }

    /// Returns the path the device was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Capabilities reported when the device was opened
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Queries the capabilities again
    pub fn query_capabilities(&self) -> Result<Capabilities> {
        query_caps(&self.handle)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the shared file descriptor handle
    pub fn handle(&self) -> Arc<Handle> {
        self.handle.clone()
    }

    /// Starts a frame size selection against the formats of this device
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::Device;
    ///
    /// if let Ok(dev) = Device::open("/dev/video0") {
    ///     let resolution = dev.frame_size().width(1280).height(720).select();
    /// }
    /// ```
    pub fn frame_size(&self) -> FrameSizeSelector<'_, Self> {
        FrameSizeSelector::new(self).default_format(self.config.default_format)
    }

    /// Returns the current capture format
    pub fn format(&self) -> Result<Format> {
        let mut v4l2_fmt = v4l2_format {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..unsafe { mem::zeroed() }
        };
        unsafe {
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_G_FMT,
                &mut v4l2_fmt as *mut _ as *mut c_void,
            )?;

            Ok(Format::from(v4l2_fmt.fmt.pix))
        }
    }

    /// Modifies the capture format
    ///
    /// Drivers adjust requests they cannot honor, so the returned format is the one actually
    /// in effect.
    pub fn set_format(&self, fmt: &Format) -> Result<Format> {
        let mut v4l2_fmt = v4l2_format {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..unsafe { mem::zeroed() }
        };
        v4l2_fmt.fmt.pix = (*fmt).into();

        unsafe {
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_S_FMT,
                &mut v4l2_fmt as *mut _ as *mut c_void,
            )?;

            Ok(Format::from(v4l2_fmt.fmt.pix))
        }
    }

    /// Applies a selected resolution as progressive capture format
    ///
    /// Fails with [`Error::UnsupportedFormat`] if the driver substituted another pixel format.
    pub fn set_resolution(&self, resolution: &Resolution) -> Result<Format> {
        let applied = self.set_format(&Format::new(
            resolution.width,
            resolution.height,
            resolution.fourcc,
        ))?;

        if applied.fourcc != resolution.fourcc {
            return Err(Error::UnsupportedFormat(resolution.fourcc));
        }
        if applied.width != resolution.width || applied.height != resolution.height {
            warn!(
                requested = %resolution,
                width = applied.width,
                height = applied.height,
                "driver adjusted the frame size"
            );
        }

        debug!(path = %self.path.display(), format = %resolution, "format set");
        Ok(applied)
    }

    /// Closes the device, reporting close errors instead of logging them
    ///
    /// If a stream still holds the handle, the descriptor is closed once that stream is dropped.
    pub fn close(self) -> Result<()> {
        info!(path = %self.path.display(), "closing device");
        match Arc::try_unwrap(self.handle) {
            Ok(handle) => Ok(handle.close()?),
            Err(_) => Ok(()),
        }
    }
}

impl Capture for Device {
    fn enum_formats(&self) -> Result<Vec<Description>> {
        let mut formats: Vec<Description> = Vec::new();
        let mut v4l2_fmt = v4l2_fmtdesc {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..unsafe { mem::zeroed() }
        };

        loop {
            let ret = unsafe {
                v4l2::ioctl(
                    self.handle.fd(),
                    v4l2::vidioc::VIDIOC_ENUM_FMT,
                    &mut v4l2_fmt as *mut _ as *mut c_void,
                )
            };

            match ret {
                Ok(()) => formats.push(Description::from(v4l2_fmt)),
                Err(e) if is_end_of_enum(&e) => break,
                Err(e) => return Err(e.into()),
            }

            v4l2_fmt.index += 1;
        }

        debug!(path = %self.path.display(), count = formats.len(), "enumerated formats");
        Ok(formats)
    }

    fn enum_framesizes(&self, fourcc: FourCC) -> Result<Vec<FrameSize>> {
        let mut frame_sizes = Vec::new();
        let mut v4l2_struct = v4l2_frmsizeenum {
            pixel_format: fourcc.into(),
            ..unsafe { mem::zeroed() }
        };

        loop {
            let ret = unsafe {
                v4l2::ioctl(
                    self.handle.fd(),
                    v4l2::vidioc::VIDIOC_ENUM_FRAMESIZES,
                    &mut v4l2_struct as *mut _ as *mut c_void,
                )
            };

            match ret {
                Ok(()) => match FrameSize::try_from(v4l2_struct) {
                    Ok(size) => frame_sizes.push(size),
                    Err(e) => warn!(fourcc = %fourcc, error = %e, "skipping frame size"),
                },
                Err(e) if is_end_of_enum(&e) => break,
                Err(e) => return Err(e.into()),
            }

            v4l2_struct.index += 1;
        }

        Ok(frame_sizes)
    }
}

fn query_caps(handle: &Handle) -> Result<Capabilities> {
    unsafe {
        let mut v4l2_caps: v4l2_capability = mem::zeroed();
        v4l2::ioctl(
            handle.fd(),
            v4l2::vidioc::VIDIOC_QUERYCAP,
            &mut v4l2_caps as *mut _ as *mut c_void,
        )?;

        Ok(Capabilities::from(v4l2_caps))
    }
}

// Enumeration ioctls report the index past the last entry with EINVAL.
fn is_end_of_enum(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EINVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framesize::{FrameSizeEnum, Stepwise};

    struct Fake {
        formats: Vec<FourCC>,
        sizes: Vec<FrameSizeEnum>,
    }

    impl Capture for Fake {
        fn enum_formats(&self) -> Result<Vec<Description>> {
            Ok(self
                .formats
                .iter()
                .enumerate()
                .map(|(index, fourcc)| Description {
                    index: index as u32,
                    flags: crate::format::Flags::empty(),
                    description: String::new(),
                    fourcc: *fourcc,
                })
                .collect())
        }

        fn enum_framesizes(&self, fourcc: FourCC) -> Result<Vec<FrameSize>> {
            if !self.formats.contains(&fourcc) {
                return Ok(Vec::new());
            }
            Ok(self
                .sizes
                .iter()
                .enumerate()
                .map(|(index, size)| FrameSize {
                    index: index as u32,
                    fourcc,
                    size: *size,
                })
                .collect())
        }
    }

    fn discrete(width: u32, height: u32) -> Discrete {
        Discrete { width, height }
    }

    fn fake() -> Fake {
        Fake {
            formats: vec![FourCC::YUYV, FourCC::MJPEG],
            sizes: vec![
                FrameSizeEnum::Discrete(discrete(640, 480)),
                FrameSizeEnum::Stepwise(Stepwise {
                    min_width: 16,
                    max_width: 64,
                    step_width: 16,
                    min_height: 16,
                    max_height: 64,
                    step_height: 16,
                }),
                FrameSizeEnum::Discrete(discrete(1280, 720)),
            ],
        }
    }

    #[test]
    fn provided_queries() {
        let dev = fake();
        assert!(dev.supports_format(FourCC::MJPEG).unwrap());
        assert!(!dev.supports_format(FourCC::H264).unwrap());

        let mjpeg = dev.all_discrete_mjpeg().unwrap();
        assert_eq!(mjpeg, vec![discrete(640, 480), discrete(1280, 720)]);

        assert!(dev.supports_discrete(FourCC::YUYV, 1280, 720).unwrap());
        // stepwise sizes are not discrete
        assert!(!dev.supports_discrete(FourCC::YUYV, 32, 32).unwrap());
        assert!(dev.frame_sizes(FourCC::YUYV).unwrap().supports(32, 32));

        assert!(dev.all_discrete(FourCC::H264).unwrap().is_empty());
    }

    #[test]
    fn einval_ends_enumeration() {
        assert!(is_end_of_enum(&io::Error::from_raw_os_error(libc::EINVAL)));
        assert!(!is_end_of_enum(&io::Error::from_raw_os_error(libc::ENOTTY)));
    }

    #[test]
    fn open_missing_node() {
        let err = Device::open("/nonexistent/video0").err().unwrap();
        match err {
            Error::Open { path, source } => {
                assert_eq!(path, PathBuf::from("/nonexistent/video0"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn poll_reports_timeout() {
        let mut fds = [0 as c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let reader = Handle::from(fds[0]);
        let writer = Handle::from(fds[1]);

        assert_eq!(reader.poll(libc::POLLIN, 10).unwrap(), 0);

        let byte = [1u8];
        assert_eq!(unsafe { libc::write(writer.fd(), byte.as_ptr() as *const c_void, 1) }, 1);
        assert_eq!(reader.poll(libc::POLLIN, 10).unwrap(), 1);

        writer.close().unwrap();
    }
}
