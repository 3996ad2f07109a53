use std::fmt;

use crate::Timestamp;

bitflags::bitflags! {
    /// Buffer state flags (`V4L2_BUF_FLAG_*`)
    #[allow(clippy::unreadable_literal)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u32 {
        /// Buffer is mapped
        const MAPPED                = 0x00000001;
        /// Buffer is queued for processing
        const QUEUED                = 0x00000002;
        /// Buffer is ready
        const DONE                  = 0x00000004;
        /// Image is a keyframe (I-frame)
        const KEYFRAME              = 0x00000008;
        /// Image is a P-frame
        const PFRAME                = 0x00000010;
        /// Image is a B-frame
        const BFRAME                = 0x00000020;
        /// Buffer is ready, but the data contained within is corrupted
        const ERROR                 = 0x00000040;
        /// Timecode field is valid
        const TIMECODE              = 0x00000100;
        /// Buffer is prepared for queuing
        const PREPARED              = 0x00000400;
        /// Timestamp type
        const TIMESTAMP_MONOTONIC   = 0x00002000;
        const TIMESTAMP_COPY        = 0x00004000;
        /// Timestamp taken at start of exposure rather than end of frame
        const TSTAMP_SRC_SOE        = 0x00010000;
        /// Last buffer produced by the hardware
        const LAST                  = 0x00100000;
    }
}

impl From<u32> for Flags {
    fn from(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Buffer metadata filled in by the driver on dequeue
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// Number of bytes occupied by the frame
    pub bytesused: u32,
    /// Buffer flags
    pub flags: Flags,
    /// Time of capture
    pub timestamp: Timestamp,
    /// Sequence number, counting the frames
    pub sequence: u32,
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sequence  : {}", self.sequence)?;
        writeln!(f, "timestamp : {}", self.timestamp)?;
        writeln!(f, "flags     : {}", self.flags)?;
        writeln!(f, "bytesused : {}", self.bytesused)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_are_dropped() {
        let flags = Flags::from(0x0000_2001 | 0x8000_0000);
        assert_eq!(flags, Flags::MAPPED | Flags::TIMESTAMP_MONOTONIC);
        assert_eq!(flags.to_string(), "MAPPED | TIMESTAMP_MONOTONIC");
    }
}
