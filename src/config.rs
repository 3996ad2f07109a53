use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::FourCC;

/// Settings shared by device probing and capture
///
/// # Example
///
/// ```
/// use webcam::{Config, FourCC};
///
/// let config = Config {
///     buffer_count: 2,
///     default_format: FourCC::YUYV,
///     ..Config::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the device nodes
    pub device_dir: PathBuf,
    /// File name prefix of video device nodes
    pub device_prefix: String,
    /// Number of mmap buffers requested for streams
    pub buffer_count: u32,
    /// Pixel format preferred when none is asked for explicitly
    pub default_format: FourCC,
    /// How long to wait for a frame before giving up, forever if unset
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device_dir: PathBuf::from("/dev"),
            device_prefix: String::from("video"),
            buffer_count: 4,
            default_format: FourCC::MJPEG,
            timeout: None,
        }
    }
}

impl Config {
    /// Defaults overridden by `WEBCAM_*` environment variables
    ///
    /// Recognized: `WEBCAM_DEVICE_DIR`, `WEBCAM_DEVICE_PREFIX`, `WEBCAM_BUFFERS`,
    /// `WEBCAM_FORMAT` (constant name or fourcc) and `WEBCAM_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Config::from_env`], reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(dir) = lookup("WEBCAM_DEVICE_DIR") {
            config.device_dir = PathBuf::from(dir);
        }

        if let Some(prefix) = lookup("WEBCAM_DEVICE_PREFIX") {
            config.device_prefix = prefix;
        }

        if let Some(count) = lookup("WEBCAM_BUFFERS") {
            match count.trim().parse::<u32>() {
                Ok(count) if count > 0 => config.buffer_count = count,
                _ => warn!("ignoring WEBCAM_BUFFERS={:?}, expected a positive integer", count),
            }
        }

        if let Some(format) = lookup("WEBCAM_FORMAT") {
            match FourCC::from_name(format.trim()) {
                Some(fourcc) => config.default_format = fourcc,
                None => warn!("ignoring WEBCAM_FORMAT={:?}, not a pixel format", format),
            }
        }

        if let Some(timeout) = lookup("WEBCAM_TIMEOUT_MS") {
            match timeout.trim().parse::<u64>() {
                Ok(0) => config.timeout = None,
                Ok(ms) => config.timeout = Some(Duration::from_millis(ms)),
                Err(_) => warn!("ignoring WEBCAM_TIMEOUT_MS={:?}, expected milliseconds", timeout),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.device_dir, PathBuf::from("/dev"));
        assert_eq!(config.buffer_count, 4);
        assert_eq!(config.default_format, FourCC::MJPEG);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("WEBCAM_DEVICE_DIR", "/tmp/dev"),
            ("WEBCAM_DEVICE_PREFIX", "v4l-"),
            ("WEBCAM_BUFFERS", "2"),
            ("WEBCAM_FORMAT", "V4L2_PIX_FMT_YUYV"),
            ("WEBCAM_TIMEOUT_MS", "1500"),
        ]));

        assert_eq!(config.device_dir, PathBuf::from("/tmp/dev"));
        assert_eq!(config.device_prefix, "v4l-");
        assert_eq!(config.buffer_count, 2);
        assert_eq!(config.default_format, FourCC::YUYV);
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn invalid_values_are_ignored() {
        let config = Config::from_lookup(lookup(&[
            ("WEBCAM_BUFFERS", "0"),
            ("WEBCAM_FORMAT", "not a format"),
            ("WEBCAM_TIMEOUT_MS", "soon"),
        ]));

        assert_eq!(config, Config::default());
    }
}
