use std::{fmt, str};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
/// Four character code representing a pixelformat
pub struct FourCC {
    pub repr: [u8; 4],
}

impl FourCC {
    pub const MJPEG: FourCC = FourCC::new(b"MJPG");
    pub const JPEG: FourCC = FourCC::new(b"JPEG");
    pub const YUYV: FourCC = FourCC::new(b"YUYV");
    pub const UYVY: FourCC = FourCC::new(b"UYVY");
    pub const NV12: FourCC = FourCC::new(b"NV12");
    pub const YUV420: FourCC = FourCC::new(b"YU12");
    pub const RGB24: FourCC = FourCC::new(b"RGB3");
    pub const BGR24: FourCC = FourCC::new(b"BGR3");
    pub const GREY: FourCC = FourCC::new(b"GREY");
    pub const H264: FourCC = FourCC::new(b"H264");

    /// Returns a pixelformat as four character code
    ///
    /// # Arguments
    ///
    /// * `repr` - Four characters as raw bytes
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::FourCC;
    /// let fourcc = FourCC::new(b"YUYV");
    /// ```
    pub const fn new(repr: &[u8; 4]) -> FourCC {
        FourCC { repr: *repr }
    }

    /// Returns the four characters as a string slice, if they are valid UTF-8
    pub fn str(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.repr)
    }

    /// Name of the matching `V4L2_PIX_FMT_*` constant, if the code is a known one
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::FourCC;
    /// assert_eq!(FourCC::MJPEG.name(), Some("V4L2_PIX_FMT_MJPEG"));
    /// ```
    pub fn name(&self) -> Option<&'static str> {
        NAMES
            .iter()
            .find(|(repr, _)| *repr == &self.repr)
            .map(|(_, name)| *name)
    }

    /// Parses either a `V4L2_PIX_FMT_*` constant name or a literal four character code
    ///
    /// Codes shorter than four characters are padded with spaces, the way the kernel spells
    /// e.g. `Y10 `.
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::FourCC;
    /// assert_eq!(FourCC::from_name("V4L2_PIX_FMT_YUYV"), Some(FourCC::YUYV));
    /// assert_eq!(FourCC::from_name("MJPG"), Some(FourCC::MJPEG));
    /// ```
    pub fn from_name(name: &str) -> Option<FourCC> {
        if let Some((repr, _)) = NAMES.iter().find(|(_, n)| *n == name) {
            return Some(FourCC::new(repr));
        }

        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 || !bytes.iter().all(u8::is_ascii_graphic) {
            return None;
        }

        let mut repr = [b' '; 4];
        repr[..bytes.len()].copy_from_slice(bytes);
        Some(FourCC::new(&repr))
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.str() {
            Ok(string) => write!(f, "{}", string),
            Err(_) => write!(f, "{:#010x}", u32::from(*self)),
        }
    }
}

impl From<u32> for FourCC {
    fn from(code: u32) -> Self {
        FourCC::new(&code.to_le_bytes())
    }
}

impl From<FourCC> for u32 {
    fn from(fourcc: FourCC) -> Self {
        Self::from_le_bytes(fourcc.repr)
    }
}

#[rustfmt::skip]
static NAMES: &[(&[u8; 4], &str)] = &[
    (b"RGB1", "V4L2_PIX_FMT_RGB332"),
    (b"R444", "V4L2_PIX_FMT_RGB444"),
    (b"AR12", "V4L2_PIX_FMT_ARGB444"),
    (b"XR12", "V4L2_PIX_FMT_XRGB444"),
    (b"RGBO", "V4L2_PIX_FMT_RGB555"),
    (b"AR15", "V4L2_PIX_FMT_ARGB555"),
    (b"XR15", "V4L2_PIX_FMT_XRGB555"),
    (b"RGBP", "V4L2_PIX_FMT_RGB565"),
    (b"RGBQ", "V4L2_PIX_FMT_RGB555X"),
    (b"RGBR", "V4L2_PIX_FMT_RGB565X"),
    (b"BGRH", "V4L2_PIX_FMT_BGR666"),
    (b"BGR3", "V4L2_PIX_FMT_BGR24"),
    (b"RGB3", "V4L2_PIX_FMT_RGB24"),
    (b"BGR4", "V4L2_PIX_FMT_BGR32"),
    (b"AR24", "V4L2_PIX_FMT_ABGR32"),
    (b"XR24", "V4L2_PIX_FMT_XBGR32"),
    (b"RGB4", "V4L2_PIX_FMT_RGB32"),
    (b"BA24", "V4L2_PIX_FMT_ARGB32"),
    (b"BX24", "V4L2_PIX_FMT_XRGB32"),

    (b"GREY", "V4L2_PIX_FMT_GREY"),
    (b"Y04 ", "V4L2_PIX_FMT_Y4"),
    (b"Y06 ", "V4L2_PIX_FMT_Y6"),
    (b"Y10 ", "V4L2_PIX_FMT_Y10"),
    (b"Y12 ", "V4L2_PIX_FMT_Y12"),
    (b"Y16 ", "V4L2_PIX_FMT_Y16"),
    (&[b'Y', b'1', b'6', b' ' | 0x80], "V4L2_PIX_FMT_Y16_BE"),
    (b"Y10B", "V4L2_PIX_FMT_Y10BPACK"),
    (b"PAL8", "V4L2_PIX_FMT_PAL8"),
    (b"UV8 ", "V4L2_PIX_FMT_UV8"),

    (b"YUYV", "V4L2_PIX_FMT_YUYV"),
    (b"YYUV", "V4L2_PIX_FMT_YYUV"),
    (b"YVYU", "V4L2_PIX_FMT_YVYU"),
    (b"UYVY", "V4L2_PIX_FMT_UYVY"),
    (b"VYUY", "V4L2_PIX_FMT_VYUY"),
    (b"Y41P", "V4L2_PIX_FMT_Y41P"),
    (b"Y444", "V4L2_PIX_FMT_YUV444"),
    (b"YUVO", "V4L2_PIX_FMT_YUV555"),
    (b"YUVP", "V4L2_PIX_FMT_YUV565"),
    (b"YUV4", "V4L2_PIX_FMT_YUV32"),
    (b"HI24", "V4L2_PIX_FMT_HI240"),
    (b"HM12", "V4L2_PIX_FMT_HM12"),
    (b"M420", "V4L2_PIX_FMT_M420"),

    (b"NV12", "V4L2_PIX_FMT_NV12"),
    (b"NV21", "V4L2_PIX_FMT_NV21"),
    (b"NV16", "V4L2_PIX_FMT_NV16"),
    (b"NV61", "V4L2_PIX_FMT_NV61"),
    (b"NV24", "V4L2_PIX_FMT_NV24"),
    (b"NV42", "V4L2_PIX_FMT_NV42"),
    (b"NM12", "V4L2_PIX_FMT_NV12M"),
    (b"NM21", "V4L2_PIX_FMT_NV21M"),
    (b"NM16", "V4L2_PIX_FMT_NV16M"),
    (b"NM61", "V4L2_PIX_FMT_NV61M"),
    (b"TM12", "V4L2_PIX_FMT_NV12MT"),
    (b"VM12", "V4L2_PIX_FMT_NV12MT_16X16"),

    (b"YUV9", "V4L2_PIX_FMT_YUV410"),
    (b"YVU9", "V4L2_PIX_FMT_YVU410"),
    (b"411P", "V4L2_PIX_FMT_YUV411P"),
    (b"YU12", "V4L2_PIX_FMT_YUV420"),
    (b"YV12", "V4L2_PIX_FMT_YVU420"),
    (b"422P", "V4L2_PIX_FMT_YUV422P"),
    (b"YM12", "V4L2_PIX_FMT_YUV420M"),
    (b"YM21", "V4L2_PIX_FMT_YVU420M"),
    (b"YM16", "V4L2_PIX_FMT_YUV422M"),
    (b"YM61", "V4L2_PIX_FMT_YVU422M"),
    (b"YM24", "V4L2_PIX_FMT_YUV444M"),
    (b"YM42", "V4L2_PIX_FMT_YVU444M"),

    (b"BA81", "V4L2_PIX_FMT_SBGGR8"),
    (b"GBRG", "V4L2_PIX_FMT_SGBRG8"),
    (b"GRBG", "V4L2_PIX_FMT_SGRBG8"),
    (b"RGGB", "V4L2_PIX_FMT_SRGGB8"),
    (b"BG10", "V4L2_PIX_FMT_SBGGR10"),
    (b"GB10", "V4L2_PIX_FMT_SGBRG10"),
    (b"BA10", "V4L2_PIX_FMT_SGRBG10"),
    (b"RG10", "V4L2_PIX_FMT_SRGGB10"),
    (b"pBAA", "V4L2_PIX_FMT_SBGGR10P"),
    (b"pGAA", "V4L2_PIX_FMT_SGBRG10P"),
    (b"pgAA", "V4L2_PIX_FMT_SGRBG10P"),
    (b"pRAA", "V4L2_PIX_FMT_SRGGB10P"),
    (b"aBA8", "V4L2_PIX_FMT_SBGGR10ALAW8"),
    (b"aGA8", "V4L2_PIX_FMT_SGBRG10ALAW8"),
    (b"agA8", "V4L2_PIX_FMT_SGRBG10ALAW8"),
    (b"aRA8", "V4L2_PIX_FMT_SRGGB10ALAW8"),
    (b"bBA8", "V4L2_PIX_FMT_SBGGR10DPCM8"),
    (b"bGA8", "V4L2_PIX_FMT_SGBRG10DPCM8"),
    (b"BD10", "V4L2_PIX_FMT_SGRBG10DPCM8"),
    (b"bRA8", "V4L2_PIX_FMT_SRGGB10DPCM8"),
    (b"BG12", "V4L2_PIX_FMT_SBGGR12"),
    (b"GB12", "V4L2_PIX_FMT_SGBRG12"),
    (b"BA12", "V4L2_PIX_FMT_SGRBG12"),
    (b"RG12", "V4L2_PIX_FMT_SRGGB12"),
    (b"BYR2", "V4L2_PIX_FMT_SBGGR16"),

    (b"MJPG", "V4L2_PIX_FMT_MJPEG"),
    (b"JPEG", "V4L2_PIX_FMT_JPEG"),
    (b"dvsd", "V4L2_PIX_FMT_DV"),
    (b"MPEG", "V4L2_PIX_FMT_MPEG"),
    (b"H264", "V4L2_PIX_FMT_H264"),
    (b"AVC1", "V4L2_PIX_FMT_H264_NO_SC"),
    (b"M264", "V4L2_PIX_FMT_H264_MVC"),
    (b"H263", "V4L2_PIX_FMT_H263"),
    (b"MPG1", "V4L2_PIX_FMT_MPEG1"),
    (b"MPG2", "V4L2_PIX_FMT_MPEG2"),
    (b"MPG4", "V4L2_PIX_FMT_MPEG4"),
    (b"XVID", "V4L2_PIX_FMT_XVID"),
    (b"VC1G", "V4L2_PIX_FMT_VC1_ANNEX_G"),
    (b"VC1L", "V4L2_PIX_FMT_VC1_ANNEX_L"),
    (b"VP80", "V4L2_PIX_FMT_VP8"),
    (b"VP90", "V4L2_PIX_FMT_VP9"),
    (b"HEVC", "V4L2_PIX_FMT_HEVC"),

    (b"CPIA", "V4L2_PIX_FMT_CPIA1"),
    (b"WNVA", "V4L2_PIX_FMT_WNVA"),
    (b"S910", "V4L2_PIX_FMT_SN9C10X"),
    (b"S920", "V4L2_PIX_FMT_SN9C20X_I420"),
    (b"PWC1", "V4L2_PIX_FMT_PWC1"),
    (b"PWC2", "V4L2_PIX_FMT_PWC2"),
    (b"E625", "V4L2_PIX_FMT_ET61X251"),
    (b"S501", "V4L2_PIX_FMT_SPCA501"),
    (b"S505", "V4L2_PIX_FMT_SPCA505"),
    (b"S508", "V4L2_PIX_FMT_SPCA508"),
    (b"S561", "V4L2_PIX_FMT_SPCA561"),
    (b"P207", "V4L2_PIX_FMT_PAC207"),
    (b"M310", "V4L2_PIX_FMT_MR97310A"),
    (b"JL20", "V4L2_PIX_FMT_JL2005BCD"),
    (b"SONX", "V4L2_PIX_FMT_SN9C2028"),
    (b"905C", "V4L2_PIX_FMT_SQ905C"),
    (b"PJPG", "V4L2_PIX_FMT_PJPG"),
    (b"O511", "V4L2_PIX_FMT_OV511"),
    (b"O518", "V4L2_PIX_FMT_OV518"),
    (b"S680", "V4L2_PIX_FMT_STV0680"),
    (b"TM60", "V4L2_PIX_FMT_TM6000"),
    (b"CITV", "V4L2_PIX_FMT_CIT_YYVYUY"),
    (b"KONI", "V4L2_PIX_FMT_KONICA420"),
    (b"JPGL", "V4L2_PIX_FMT_JPGL"),
    (b"S401", "V4L2_PIX_FMT_SE401"),
    (b"S5CI", "V4L2_PIX_FMT_S5C_UYVY_JPG"),
    (b"Y8I ", "V4L2_PIX_FMT_Y8I"),
    (b"Y12I", "V4L2_PIX_FMT_Y12I"),
    (b"Z16 ", "V4L2_PIX_FMT_Z16"),
];
