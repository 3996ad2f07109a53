use std::os::raw::c_void;
use std::{mem, sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::buffer::Metadata;
use crate::device::Handle;
use crate::io::arena::Arena;
use crate::v4l2;
use crate::v4l2::videodev::{v4l2_buffer, V4L2_BUF_TYPE_VIDEO_CAPTURE, V4L2_MEMORY_MMAP};
use crate::{Error, Result};

/// A captured frame, borrowed from the stream until the next call to [`Stream::next`]
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Bytes written by the driver
    pub data: &'a [u8],
    pub meta: Metadata,
}

/// Stream of mapped buffers
///
/// An arena instance is used internally for buffer handling.
pub struct Stream {
    handle: Arc<Handle>,
    arena: Arena,
    // buffer handed out by the last call to next()
    dequeued: Option<usize>,
    timeout: Option<i32>,

    active: bool,
}

impl Stream {
    /// Returns a stream for frame capturing
    ///
    /// The format has to be set before, buffers are sized after it.
    ///
    /// # Arguments
    ///
    /// * `handle` - Device handle to get its file descriptor
    /// * `count` - Number of buffers to request
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::Device;
    /// use webcam::io::Stream;
    ///
    /// if let Ok(dev) = Device::open("/dev/video0") {
    ///     let stream = Stream::with_buffers(dev.handle(), 4);
    /// }
    /// ```
    pub fn with_buffers(handle: Arc<Handle>, count: u32) -> Result<Self> {
        let mut arena = Arena::new(handle.clone());
        arena.allocate(count)?;

        Ok(Stream {
            handle,
            arena,
            dequeued: None,
            timeout: None,
            active: false,
        })
    }

    /// Sets how long [`Stream::next`] waits for a frame
    ///
    /// Durations beyond what poll(2) accepts are capped.
    pub fn set_timeout(&mut self, duration: Duration) {
        self.timeout = Some(duration.as_millis().min(i32::MAX as u128) as i32);
    }

    /// Waits forever for frames
    pub fn clear_timeout(&mut self) {
        self.timeout = None;
    }

    /// Number of buffers granted by the driver
    pub fn buffer_count(&self) -> usize {
        self.arena.len()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn buffer_desc(&self) -> v4l2_buffer {
        v4l2_buffer {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            memory: V4L2_MEMORY_MMAP,
            ..unsafe { mem::zeroed() }
        }
    }

    /// Queues every buffer and turns streaming on
    ///
    /// On failure the buffers queued so far are taken back, so starting can be retried.
    pub fn start(&mut self) -> Result<()> {
        if let Err(e) = self.queue_all_and_stream_on() {
            if let Err(reset) = self.stream_off() {
                warn!(error = %reset, "failed to reset buffer queue");
            }
            self.dequeued = None;
            return Err(e);
        }

        self.active = true;
        debug!(buffers = self.arena.len(), "stream on");
        Ok(())
    }

    fn queue_all_and_stream_on(&mut self) -> Result<()> {
        for index in 0..self.arena.len() {
            self.queue(index)?;
        }

        unsafe {
            let mut typ = V4L2_BUF_TYPE_VIDEO_CAPTURE;
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_STREAMON,
                &mut typ as *mut _ as *mut c_void,
            )?;
        }

        Ok(())
    }

    /// Turns streaming off, which also dequeues all buffers
    pub fn stop(&mut self) -> Result<()> {
        self.stream_off()?;

        self.active = false;
        self.dequeued = None;
        debug!("stream off");
        Ok(())
    }

    // STREAMOFF is also valid on a stream that never started, it drops every queued buffer.
    fn stream_off(&self) -> Result<()> {
        unsafe {
            let mut typ = V4L2_BUF_TYPE_VIDEO_CAPTURE;
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_STREAMOFF,
                &mut typ as *mut _ as *mut c_void,
            )?;
        }

        Ok(())
    }

    fn queue(&mut self, index: usize) -> Result<()> {
        let mut v4l2_buf = v4l2_buffer {
            index: index as u32,
            ..self.buffer_desc()
        };

        unsafe {
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_QBUF,
                &mut v4l2_buf as *mut _ as *mut c_void,
            )?;
        }

        Ok(())
    }

    fn dequeue(&mut self) -> Result<(usize, Metadata)> {
        let mut v4l2_buf = self.buffer_desc();

        wait_readable(&self.handle, self.timeout)?;

        unsafe {
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_DQBUF,
                &mut v4l2_buf as *mut _ as *mut c_void,
            )?;
        }

        let meta = Metadata {
            bytesused: v4l2_buf.bytesused,
            flags: v4l2_buf.flags.into(),
            timestamp: v4l2_buf.timestamp.into(),
            sequence: v4l2_buf.sequence,
        };

        Ok((v4l2_buf.index as usize, meta))
    }

    /// Waits for the next frame
    ///
    /// Streaming starts on the first call. The buffer returned by the previous call goes back
    /// to the driver, so its frame must not be used anymore.
    pub fn next(&mut self) -> Result<Frame<'_>> {
        if !self.active {
            self.start()?;
        }
        if let Some(index) = self.dequeued.take() {
            self.queue(index)?;
        }

        let (index, meta) = self.dequeue()?;
        self.dequeued = Some(index);

        let buf = self.arena.get(index).ok_or(Error::NoBuffers)?;
        let len = frame_len(meta.bytesused, buf.len());

        Ok(Frame {
            data: &buf[..len],
            meta,
        })
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        if !self.active {
            return;
        }

        if let Err(e) = self.stop() {
            // ENODEV means the device was unplugged or its connection broke down, there is
            // nothing left to stop.
            if !e.is_disconnect() {
                warn!(error = %e, "failed to stop stream");
            }
        }
    }
}

/// Blocks until a frame can be dequeued, `None` waits forever
fn wait_readable(handle: &Handle, timeout: Option<i32>) -> Result<()> {
    if handle.poll(libc::POLLIN, timeout.unwrap_or(-1))? == 0 {
        return Err(Error::Timeout);
    }

    Ok(())
}

// Some drivers leave bytesused at 0 for fixed size formats.
fn frame_len(bytesused: u32, buf_len: usize) -> usize {
    match bytesused as usize {
        0 => buf_len,
        used => used.min(buf_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe() -> (Arc<Handle>, Handle) {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        (Arc::new(Handle::from(fds[0])), Handle::from(fds[1]))
    }

    // A stream over a pipe: poll works, every v4l2 ioctl fails with ENOTTY.
    fn idle_stream(handle: Arc<Handle>) -> Stream {
        Stream {
            arena: Arena::new(handle.clone()),
            handle,
            dequeued: None,
            timeout: None,
            active: false,
        }
    }

    #[test]
    fn frame_len_follows_bytesused() {
        assert_eq!(frame_len(0, 4096), 4096);
        assert_eq!(frame_len(1200, 4096), 1200);
        assert_eq!(frame_len(4096, 4096), 4096);
        assert_eq!(frame_len(8192, 4096), 4096);
    }

    #[test]
    fn expired_wait_is_a_timeout() {
        let (read, _write) = pipe();
        assert!(matches!(wait_readable(&read, Some(10)), Err(Error::Timeout)));
    }

    #[test]
    fn readable_wait_returns() {
        let (read, write) = pipe();
        let byte = [1u8];
        let written = unsafe { libc::write(write.fd(), byte.as_ptr() as *const c_void, 1) };
        assert_eq!(written, 1);

        assert!(wait_readable(&read, Some(10)).is_ok());
    }

    #[test]
    fn dequeue_times_out() {
        let (read, _write) = pipe();
        let mut stream = idle_stream(read);
        stream.set_timeout(Duration::from_millis(10));
        assert_eq!(stream.timeout, Some(10));

        assert!(matches!(stream.dequeue(), Err(Error::Timeout)));
    }

    #[test]
    fn timeout_is_capped() {
        let (read, _write) = pipe();
        let mut stream = idle_stream(read);
        stream.set_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(stream.timeout, Some(i32::MAX));

        stream.clear_timeout();
        assert_eq!(stream.timeout, None);
    }

    #[test]
    fn failed_start_resets_the_queue() {
        let (read, _write) = pipe();
        let mut stream = idle_stream(read);
        stream.dequeued = Some(0);

        let err = stream.start().unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.raw_os_error() == Some(libc::ENOTTY)));
        assert!(!stream.is_active());
        assert_eq!(stream.dequeued, None);
    }
}
