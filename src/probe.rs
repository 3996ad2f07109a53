//! Searching the system for capture devices

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::{fs, thread};

use tracing::debug;

use crate::{Capabilities, Config, Device, Result};

/// Returns the capture devices found in `/dev`
///
/// Cameras exposing several nodes are listed once, by their first node.
///
/// # Example
///
/// ```
/// use webcam::search_video_devices;
///
/// for path in search_video_devices().unwrap_or_default() {
///     println!("{}", path.display());
/// }
/// ```
pub fn search_video_devices() -> Result<Vec<PathBuf>> {
    search_with(&Config::default())
}

/// Returns the capture devices found in the configured device directory
///
/// Every candidate node is opened on its own thread. Nodes that fail to open as a capture
/// device are skipped.
pub fn search_with(config: &Config) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(&config.device_dir)? {
        let entry = entry?;
        if entry
            .file_name()
            .to_string_lossy()
            .starts_with(config.device_prefix.as_str())
        {
            paths.push(entry.path());
        }
    }
    paths.sort_by(|a, b| node_order(a).cmp(&node_order(b)));

    let probed: Vec<(PathBuf, Capabilities)> = thread::scope(|scope| {
        let workers: Vec<_> = paths
            .iter()
            .map(|path| {
                scope.spawn(move || probe_with(path, config).map(|caps| (path.clone(), caps)))
            })
            .collect();

        workers
            .into_iter()
            .filter_map(|worker| worker.join().ok().flatten())
            .collect()
    });

    Ok(dedup(probed))
}

/// Capabilities of the capture device at `path`, if it is one
pub fn probe<P: AsRef<Path>>(path: P) -> Option<Capabilities> {
    probe_with(path.as_ref(), &Config::default())
}

fn probe_with(path: &Path, config: &Config) -> Option<Capabilities> {
    match Device::with_config(path, config) {
        Ok(dev) => {
            let caps = dev.capabilities().clone();
            if let Err(e) = dev.close() {
                debug!(path = %path.display(), error = %e, "failed to close probed device");
            }
            debug!(path = %path.display(), caps = %caps, "found capture device");
            Some(caps)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "not a capture device");
            None
        }
    }
}

/// Returns the device name the kernel publishes in sysfs
///
/// # Example
///
/// ```
/// use webcam::probe::sysfs_name;
///
/// if let Some(name) = sysfs_name("/dev/video0") {
///     println!("{}", name);
/// }
/// ```
pub fn sysfs_name<P: AsRef<Path>>(path: P) -> Option<String> {
    let node = path.as_ref().file_name()?;
    let name = fs::read_to_string(Path::new("/sys/class/video4linux").join(node).join("name"));
    match name {
        Ok(name) => Some(name.trim().to_string()),
        Err(_) => None,
    }
}

// Sorts video2 before video10.
fn node_order(path: &Path) -> (Option<u32>, &Path) {
    let index = path.file_name().and_then(|name| {
        let name = name.to_str()?;
        let digits = name.trim_start_matches(|c: char| !c.is_ascii_digit());
        digits.parse::<u32>().ok()
    });

    (index, path)
}

// Keeps the first node of each physical device, `probed` has to be in node order.
fn dedup(probed: Vec<(PathBuf, Capabilities)>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for (path, caps) in probed {
        if seen.insert(caps.identity()) {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "skipping another node of the same device");
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Flags;

    fn caps(card: &str, bus: &str) -> Capabilities {
        Capabilities {
            driver: "uvcvideo".to_string(),
            card: card.to_string(),
            bus: bus.to_string(),
            version: (6, 8, 0),
            capabilities: Flags::VIDEO_CAPTURE | Flags::STREAMING,
            device_caps: Flags::empty(),
        }
    }

    #[test]
    fn nodes_sort_numerically() {
        let mut paths = vec![
            PathBuf::from("/dev/video10"),
            PathBuf::from("/dev/video2"),
            PathBuf::from("/dev/video0"),
        ];
        paths.sort_by(|a, b| node_order(a).cmp(&node_order(b)));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/dev/video0"),
                PathBuf::from("/dev/video2"),
                PathBuf::from("/dev/video10"),
            ]
        );
    }

    #[test]
    fn same_device_is_listed_once() {
        let probed = vec![
            (PathBuf::from("/dev/video0"), caps("HD Webcam", "usb-1")),
            (PathBuf::from("/dev/video1"), caps("HD Webcam", "usb-1")),
            (PathBuf::from("/dev/video2"), caps("HD Webcam", "usb-2")),
        ];
        assert_eq!(
            dedup(probed),
            vec![PathBuf::from("/dev/video0"), PathBuf::from("/dev/video2")]
        );
    }

    #[test]
    fn empty_directory() {
        let dir = std::env::temp_dir().join(format!("webcam-probe-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("video0"), b"").unwrap();
        fs::write(dir.join("audio0"), b"").unwrap();

        let config = Config {
            device_dir: dir.clone(),
            ..Config::default()
        };
        // a regular file fails QUERYCAP and is dropped
        assert!(search_with(&config).unwrap().is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory() {
        let config = Config {
            device_dir: PathBuf::from("/nonexistent/dev"),
            ..Config::default()
        };
        assert!(search_with(&config).is_err());
    }
}
