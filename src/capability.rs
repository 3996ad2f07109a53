use std::fmt;

use crate::v4l2::videodev::v4l2_capability;

bitflags::bitflags! {
    /// Device capability flags (`V4L2_CAP_*`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        const VIDEO_CAPTURE         = 0x00000001;
        const VIDEO_OUTPUT          = 0x00000002;
        const VIDEO_OVERLAY         = 0x00000004;
        const VBI_CAPTURE           = 0x00000010;
        const VBI_OUTPUT            = 0x00000020;
        const SLICED_VBI_CAPTURE    = 0x00000040;
        const SLICED_VBI_OUTPUT     = 0x00000080;
        const RDS_CAPTURE           = 0x00000100;
        const VIDEO_OUTPUT_OVERLAY  = 0x00000200;
        const HW_FREQ_SEEK          = 0x00000400;
        const RDS_OUTPUT            = 0x00000800;

        const VIDEO_CAPTURE_MPLANE  = 0x00001000;
        const VIDEO_OUTPUT_MPLANE   = 0x00002000;
        const VIDEO_M2M_MPLANE      = 0x00004000;
        const VIDEO_M2M             = 0x00008000;

        const TUNER                 = 0x00010000;
        const AUDIO                 = 0x00020000;
        const RADIO                 = 0x00040000;
        const MODULATOR             = 0x00080000;

        const SDR_CAPTURE           = 0x00100000;
        const EXT_PIX_FORMAT        = 0x00200000;
        const SDR_OUTPUT            = 0x00400000;
        const META_CAPTURE          = 0x00800000;

        const READWRITE             = 0x01000000;
        const ASYNCIO               = 0x02000000;
        const STREAMING             = 0x04000000;
        const META_OUTPUT           = 0x08000000;

        const TOUCH                 = 0x10000000;
        const IO_MC                 = 0x20000000;

        const DEVICE_CAPS           = 0x80000000;
    }
}

impl Flags {
    /// `V4L2_CAP_*` names of the set flags, in bit order
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::capability::Flags;
    ///
    /// let flags = Flags::VIDEO_CAPTURE | Flags::STREAMING;
    /// assert_eq!(flags.names(), vec!["V4L2_CAP_VIDEO_CAPTURE", "V4L2_CAP_STREAMING"]);
    /// ```
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names()
            .map(|(name, _)| match NAMES.iter().find(|(n, _)| *n == name) {
                Some((_, full)) => *full,
                None => name,
            })
            .collect()
    }
}

static NAMES: &[(&str, &str)] = &[
    ("VIDEO_CAPTURE", "V4L2_CAP_VIDEO_CAPTURE"),
    ("VIDEO_OUTPUT", "V4L2_CAP_VIDEO_OUTPUT"),
    ("VIDEO_OVERLAY", "V4L2_CAP_VIDEO_OVERLAY"),
    ("VBI_CAPTURE", "V4L2_CAP_VBI_CAPTURE"),
    ("VBI_OUTPUT", "V4L2_CAP_VBI_OUTPUT"),
    ("SLICED_VBI_CAPTURE", "V4L2_CAP_SLICED_VBI_CAPTURE"),
    ("SLICED_VBI_OUTPUT", "V4L2_CAP_SLICED_VBI_OUTPUT"),
    ("RDS_CAPTURE", "V4L2_CAP_RDS_CAPTURE"),
    ("VIDEO_OUTPUT_OVERLAY", "V4L2_CAP_VIDEO_OUTPUT_OVERLAY"),
    ("HW_FREQ_SEEK", "V4L2_CAP_HW_FREQ_SEEK"),
    ("RDS_OUTPUT", "V4L2_CAP_RDS_OUTPUT"),
    ("VIDEO_CAPTURE_MPLANE", "V4L2_CAP_VIDEO_CAPTURE_MPLANE"),
    ("VIDEO_OUTPUT_MPLANE", "V4L2_CAP_VIDEO_OUTPUT_MPLANE"),
    ("VIDEO_M2M_MPLANE", "V4L2_CAP_VIDEO_M2M_MPLANE"),
    ("VIDEO_M2M", "V4L2_CAP_VIDEO_M2M"),
    ("TUNER", "V4L2_CAP_TUNER"),
    ("AUDIO", "V4L2_CAP_AUDIO"),
    ("RADIO", "V4L2_CAP_RADIO"),
    ("MODULATOR", "V4L2_CAP_MODULATOR"),
    ("SDR_CAPTURE", "V4L2_CAP_SDR_CAPTURE"),
    ("EXT_PIX_FORMAT", "V4L2_CAP_EXT_PIX_FORMAT"),
    ("SDR_OUTPUT", "V4L2_CAP_SDR_OUTPUT"),
    ("META_CAPTURE", "V4L2_CAP_META_CAPTURE"),
    ("READWRITE", "V4L2_CAP_READWRITE"),
    ("ASYNCIO", "V4L2_CAP_ASYNCIO"),
    ("STREAMING", "V4L2_CAP_STREAMING"),
    ("META_OUTPUT", "V4L2_CAP_META_OUTPUT"),
    ("TOUCH", "V4L2_CAP_TOUCH"),
    ("IO_MC", "V4L2_CAP_IO_MC"),
    ("DEVICE_CAPS", "V4L2_CAP_DEVICE_CAPS"),
];

impl From<u32> for Flags {
    fn from(flags: u32) -> Self {
        Self::from_bits_retain(flags)
    }
}

impl From<Flags> for u32 {
    fn from(flags: Flags) -> Self {
        flags.bits()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prefix = "";
        for (name, _) in self.iter_names() {
            write!(f, "{}{}", prefix, name)?;
            prefix = " | ";
        }

        // bits we do not know a name for
        let unknown = self.bits() & !Flags::all().bits();
        if unknown != 0 {
            write!(f, "{}{:#x}", prefix, unknown)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Device capabilities as reported by `VIDIOC_QUERYCAP`
pub struct Capabilities {
    /// Driver name, e.g. uvcvideo for usb video class devices
    pub driver: String,
    /// Card name
    pub card: String,
    /// Bus name, e.g. usb-0000:00:14.0-1
    pub bus: String,
    /// Version number MAJOR.MINOR.PATCH
    pub version: (u8, u8, u8),

    /// Capabilities of the physical device as a whole
    pub capabilities: Flags,
    /// Capabilities of the opened device node
    pub device_caps: Flags,
}

impl Capabilities {
    /// Capabilities that apply to this particular device node
    ///
    /// A single camera often exposes several nodes (video, metadata). The driver only fills in
    /// `device_caps` when it sets [`Flags::DEVICE_CAPS`].
    pub fn effective(&self) -> Flags {
        if self.capabilities.contains(Flags::DEVICE_CAPS) {
            self.device_caps
        } else {
            self.capabilities
        }
    }

    /// Whether the device node supports all of the given capabilities
    pub fn has(&self, flags: Flags) -> bool {
        self.effective().contains(flags)
    }

    /// `V4L2_CAP_*` names of all capabilities of the device node
    pub fn names(&self) -> Vec<&'static str> {
        self.effective().names()
    }

    /// String identifying the physical device behind a node
    ///
    /// Nodes of the same camera report the same identity.
    pub fn identity(&self) -> String {
        format!(
            "{}|{}|{}|{}.{}.{}",
            self.driver, self.card, self.bus, self.version.0, self.version.1, self.version.2
        )
    }
}

fn c_string(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

impl From<v4l2_capability> for Capabilities {
    fn from(cap: v4l2_capability) -> Self {
        Capabilities {
            driver: c_string(&cap.driver),
            card: c_string(&cap.card),
            bus: c_string(&cap.bus_info),
            version: (
                ((cap.version >> 16) & 0xff) as u8,
                ((cap.version >> 8) & 0xff) as u8,
                (cap.version & 0xff) as u8,
            ),
            capabilities: Flags::from(cap.capabilities),
            device_caps: Flags::from(cap.device_caps),
        }
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Capabilities[driver={},card={},bus={},version={}.{}.{},caps={}]",
            self.driver,
            self.card,
            self.bus,
            self.version.0,
            self.version.1,
            self.version.2,
            self.effective()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(capabilities: u32, device_caps: u32) -> v4l2_capability {
        let mut cap = v4l2_capability {
            driver: [0; 16],
            card: [0; 32],
            bus_info: [0; 32],
            version: 0x0006_0802,
            capabilities,
            device_caps,
            reserved: [0; 3],
        };
        cap.driver[..8].copy_from_slice(b"uvcvideo");
        cap.card[..10].copy_from_slice(b"HD Webcam\xff");
        cap.bus_info[..5].copy_from_slice(b"usb-1");
        cap
    }

    #[test]
    fn from_raw() {
        let caps = Capabilities::from(raw(0x0400_0001, 0));
        assert_eq!(caps.driver, "uvcvideo");
        assert_eq!(caps.card, "HD Webcam\u{fffd}");
        assert_eq!(caps.bus, "usb-1");
        assert_eq!(caps.version, (6, 8, 2));
        assert!(caps.has(Flags::VIDEO_CAPTURE | Flags::STREAMING));
    }

    #[test]
    fn device_caps_take_precedence() {
        let physical = Flags::VIDEO_CAPTURE | Flags::META_CAPTURE | Flags::STREAMING;
        let caps = Capabilities::from(raw(
            (physical | Flags::DEVICE_CAPS).bits(),
            (Flags::META_CAPTURE | Flags::STREAMING).bits(),
        ));

        assert!(!caps.has(Flags::VIDEO_CAPTURE));
        assert!(caps.has(Flags::META_CAPTURE));
        assert_eq!(caps.names(), vec!["V4L2_CAP_META_CAPTURE", "V4L2_CAP_STREAMING"]);
    }

    #[test]
    fn display_lists_flags() {
        let flags = Flags::from(0x0400_0001 | 0x4000_0000);
        assert_eq!(flags.to_string(), "VIDEO_CAPTURE | STREAMING | 0x40000000");

        let caps = Capabilities::from(raw(0x0400_0001, 0));
        assert_eq!(
            caps.to_string(),
            "Capabilities[driver=uvcvideo,card=HD Webcam\u{fffd},bus=usb-1,version=6.8.2,caps=VIDEO_CAPTURE | STREAMING]"
        );
    }

    #[test]
    fn nodes_of_one_camera_share_identity() {
        let video = Capabilities::from(raw(0x8480_0001 | 0x0400_0000, 0x0400_0001));
        let meta = Capabilities::from(raw(0x8480_0001 | 0x0400_0000, 0x0480_0000));
        assert_eq!(video.identity(), meta.identity());
    }
}
