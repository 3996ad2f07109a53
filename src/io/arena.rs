use std::os::raw::c_void;
use std::{io, mem, ops::Deref, ptr, slice, sync::Arc};

use tracing::{debug, warn};

use crate::device::Handle;
use crate::v4l2;
use crate::v4l2::videodev::{
    v4l2_buffer, v4l2_requestbuffers, V4L2_BUF_TYPE_VIDEO_CAPTURE, V4L2_MEMORY_MMAP,
};
use crate::{Error, Result};

/// A driver buffer mapped into our address space
struct Mapping {
    ptr: *mut u8,
    len: usize,
}

// The region belongs to the driver until unmapped, it is never aliased by another Mapping.
unsafe impl Send for Mapping {}

impl Mapping {
    fn unmap(self) -> io::Result<()> {
        unsafe { v4l2::munmap(self.ptr as *mut c_void, self.len) }
    }
}

impl Deref for Mapping {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }
}

/// Manage mapped capture buffers
///
/// Buffers are unmapped and handed back to the driver in the Drop impl. Errors during release
/// are logged there, call [`Arena::release`] to observe them.
pub struct Arena {
    handle: Arc<Handle>,
    bufs: Vec<Mapping>,
}

impl Arena {
    /// Returns a new buffer manager instance
    ///
    /// You usually do not need to use this directly, a [`crate::io::Stream`] creates its own
    /// arena.
    pub fn new(handle: Arc<Handle>) -> Self {
        Arena {
            handle,
            bufs: Vec::new(),
        }
    }

    fn request(&self, count: u32) -> io::Result<u32> {
        let mut v4l2_reqbufs = v4l2_requestbuffers {
            count,
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            memory: V4L2_MEMORY_MMAP,
            ..unsafe { mem::zeroed() }
        };
        unsafe {
            v4l2::ioctl(
                self.handle.fd(),
                v4l2::vidioc::VIDIOC_REQBUFS,
                &mut v4l2_reqbufs as *mut _ as *mut c_void,
            )?;
        }

        Ok(v4l2_reqbufs.count)
    }

    /// Requests `count` buffers and maps every one the driver grants
    ///
    /// Returns the number of buffers actually allocated, which may differ from `count`.
    pub fn allocate(&mut self, count: u32) -> Result<u32> {
        let count = self.request(count)?;
        if count == 0 {
            return Err(Error::NoBuffers);
        }

        if let Err(e) = self.map(count) {
            if let Err(release) = self.release() {
                warn!(error = %release, "failed to release buffers after mapping failed");
            }
            return Err(e);
        }

        debug!(count, "mapped buffers");
        Ok(count)
    }

    fn map(&mut self, count: u32) -> Result<()> {
        for index in 0..count {
            let mut v4l2_buf = v4l2_buffer {
                index,
                type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
                memory: V4L2_MEMORY_MMAP,
                ..unsafe { mem::zeroed() }
            };
            unsafe {
                v4l2::ioctl(
                    self.handle.fd(),
                    v4l2::vidioc::VIDIOC_QUERYBUF,
                    &mut v4l2_buf as *mut _ as *mut c_void,
                )?;

                let ptr = v4l2::mmap(
                    ptr::null_mut(),
                    v4l2_buf.length as usize,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED,
                    self.handle.fd(),
                    v4l2_buf.m.offset as libc::off_t,
                )?;

                self.bufs.push(Mapping {
                    ptr: ptr as *mut u8,
                    len: v4l2_buf.length as usize,
                });
            }
        }

        Ok(())
    }

    /// Unmaps all buffers, then frees them by requesting 0
    ///
    /// Every buffer is unmapped and the driver is always asked to free them, even if some
    /// step fails. The first error is returned.
    pub fn release(&mut self) -> Result<()> {
        let mut result = Ok(());
        for buf in self.bufs.drain(..) {
            if let Err(e) = buf.unmap() {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        let freed = self.request(0);
        result?;
        freed?;

        debug!("released buffers");
        Ok(())
    }

    /// Number of mapped buffers
    pub fn len(&self) -> usize {
        self.bufs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bufs.is_empty()
    }

    /// Contents of the buffer at `index`
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.bufs.get(index).map(|buf| &buf[..])
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        if self.bufs.is_empty() {
            return;
        }

        if let Err(e) = self.release() {
            if e.is_disconnect() {
                debug!("device gone, buffers released with the descriptor");
            } else {
                warn!(error = %e, "failed to release buffers");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Every v4l2 ioctl on a pipe fails with ENOTTY.
    fn pipe_arena() -> (Arena, Handle) {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        (Arena::new(Arc::new(Handle::from(fds[0]))), Handle::from(fds[1]))
    }

    fn anonymous_mapping() -> Mapping {
        let len = 4096;
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        assert_ne!(ptr, libc::MAP_FAILED);

        Mapping {
            ptr: ptr as *mut u8,
            len,
        }
    }

    fn os_error(result: Result<()>) -> Option<i32> {
        match result {
            Err(Error::Io(e)) => e.raw_os_error(),
            _ => None,
        }
    }

    #[test]
    fn release_frees_after_unmapping() {
        let (mut arena, _write) = pipe_arena();
        arena.bufs.push(anonymous_mapping());
        arena.bufs.push(anonymous_mapping());

        // both unmaps succeed, the error comes from REQBUFS(0)
        assert_eq!(os_error(arena.release()), Some(libc::ENOTTY));
        assert!(arena.is_empty());
    }

    #[test]
    fn release_reports_first_unmap_error() {
        let (mut arena, _write) = pipe_arena();
        // munmap rejects an address that is not page aligned
        arena.bufs.push(Mapping {
            ptr: 1 as *mut u8,
            len: 4096,
        });
        arena.bufs.push(anonymous_mapping());

        assert_eq!(os_error(arena.release()), Some(libc::EINVAL));
        assert!(arena.is_empty());
        assert!(arena.get(0).is_none());
    }
}
