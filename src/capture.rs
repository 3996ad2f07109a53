use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};

use tracing::{debug, info};

use crate::buffer::Metadata;
use crate::io::{Frame, Stream};
use crate::selector::Resolution;
use crate::{Device, Result};

/// A frame copied out of the driver's buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    resolution: Resolution,
    data: Vec<u8>,
    meta: Metadata,
}

impl Snapshot {
    fn from_frame(resolution: Resolution, frame: &Frame<'_>) -> Self {
        Snapshot {
            resolution,
            data: frame.data.to_vec(),
            meta: frame.meta,
        }
    }

    /// Number of bytes in the frame
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Frame bytes, encoded in the pixel format of the resolution
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Format and size the frame was captured with
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} ({} bytes)",
            self.resolution,
            self.meta.sequence,
            self.data.len()
        )
    }
}

impl Device {
    /// Captures a single frame
    ///
    /// A single buffer is set up for the capture and everything is torn down again before
    /// returning.
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::Device;
    ///
    /// if let Ok(dev) = Device::open("/dev/video0") {
    ///     if let Ok(res) = dev.frame_size().select() {
    ///         let snapshot = dev.snapshot(&res);
    ///     }
    /// }
    /// ```
    pub fn snapshot(&self, resolution: &Resolution) -> Result<Snapshot> {
        let mut stream = self.open_stream(resolution, 1)?;

        let snapshot = {
            let frame = stream.next()?;
            Snapshot::from_frame(*resolution, &frame)
        };
        stream.stop()?;

        debug!(snapshot = %snapshot, "snapshot taken");
        Ok(snapshot)
    }

    /// Captures a single frame and hands it to `handler`
    pub fn snapshot_with<F>(&self, resolution: &Resolution, handler: F) -> Result<()>
    where
        F: FnOnce(&Snapshot),
    {
        let snapshot = self.snapshot(resolution)?;
        handler(&snapshot);
        Ok(())
    }

    /// Captures a single frame and sends it over `sender`
    ///
    /// Returns whether the snapshot was delivered, which fails once the receiver hung up.
    pub fn snapshot_to(&self, resolution: &Resolution, sender: &Sender<Snapshot>) -> Result<bool> {
        let snapshot = self.snapshot(resolution)?;
        Ok(sender.send(snapshot).is_ok())
    }

    /// Sets the capture format and returns a stream with the configured number of buffers
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::Device;
    ///
    /// if let Ok(dev) = Device::open("/dev/video0") {
    ///     if let Ok(res) = dev.frame_size().select() {
    ///         if let Ok(mut stream) = dev.stream(&res) {
    ///             if let Ok(frame) = stream.next() {
    ///                 println!("{} bytes, {}", frame.data.len(), frame.meta.timestamp);
    ///             }
    ///         }
    ///     }
    /// }
    /// ```
    pub fn stream(&self, resolution: &Resolution) -> Result<Stream> {
        self.open_stream(resolution, self.config().buffer_count)
    }

    fn open_stream(&self, resolution: &Resolution, buffers: u32) -> Result<Stream> {
        self.set_resolution(resolution)?;

        let mut stream = Stream::with_buffers(self.handle(), buffers)?;
        if let Some(timeout) = self.config().timeout {
            stream.set_timeout(timeout);
        }

        Ok(stream)
    }

    /// Writes the bytes of every captured frame to `writer` until `stop` is set
    ///
    /// The flag is checked between frames. Returns the number of frames written.
    pub fn stream_to_writer<W: Write>(
        &self,
        resolution: &Resolution,
        writer: &mut W,
        stop: &AtomicBool,
    ) -> Result<u64> {
        let mut stream = self.stream(resolution)?;
        let mut frames = 0u64;

        while !stop.load(Ordering::Relaxed) {
            let frame = stream.next()?;
            writer.write_all(frame.data)?;
            frames += 1;
        }

        writer.flush()?;
        stream.stop()?;

        info!(frames, "stream to writer finished");
        Ok(frames)
    }

    /// Sends one snapshot per tick received on `ticks`
    ///
    /// Streaming runs for as long as `ticks` stays connected and the receiving end of
    /// `snapshots` is alive. Returns the number of snapshots sent.
    ///
    /// A single buffer circulates, so every snapshot is captured after its tick arrived.
    pub fn stream_by_ticks(
        &self,
        resolution: &Resolution,
        ticks: Receiver<()>,
        snapshots: Sender<Snapshot>,
    ) -> Result<u64> {
        let mut stream = self.open_stream(resolution, 1)?;
        let mut sent = 0u64;

        for () in ticks.iter() {
            let snapshot = {
                let frame = stream.next()?;
                Snapshot::from_frame(*resolution, &frame)
            };

            if snapshots.send(snapshot).is_err() {
                debug!("snapshot receiver hung up");
                break;
            }
            sent += 1;
        }

        stream.stop()?;

        info!(sent, "ticked stream finished");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Flags;
    use crate::{FourCC, Timestamp};

    #[test]
    fn snapshot_from_frame() {
        let bytes = [0xffu8, 0xd8, 0xff, 0xd9];
        let frame = Frame {
            data: &bytes,
            meta: Metadata {
                bytesused: 4,
                flags: Flags::DONE,
                timestamp: Timestamp::new(1, 500),
                sequence: 7,
            },
        };
        let resolution = Resolution::new(FourCC::MJPEG, 640, 480);

        let snapshot = Snapshot::from_frame(resolution, &frame);
        assert_eq!(snapshot.len(), 4);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.resolution(), &resolution);
        assert_eq!(snapshot.meta().sequence, 7);
        assert_eq!(snapshot.to_string(), "MJPG 640x480 #7 (4 bytes)");
        assert_eq!(snapshot.into_data(), bytes.to_vec());
    }
}
