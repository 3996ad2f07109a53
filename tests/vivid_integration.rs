//! Integration tests using the vivid virtual camera.
//!
//! These tests require:
//! - The `integration` feature flag: `cargo test --features integration`
//! - The vivid kernel module: `sudo modprobe vivid`
//! - Access to /dev/video* devices (may require the video group)
//!
//! Tests fail, rather than skip, when vivid is missing.

#![cfg(feature = "integration")]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serial_test::serial;
use webcam::capability::Flags;
use webcam::{Capture, Config, Device, Error, FourCC, Resolution};

/// Finds the capture nodes vivid registered, by their sysfs name.
fn find_vivid_devices() -> Vec<PathBuf> {
    let video4linux = Path::new("/sys/class/video4linux");
    let Ok(entries) = fs::read_dir(video4linux) else {
        return Vec::new();
    };

    let mut devices = Vec::new();
    for entry in entries.flatten() {
        let Ok(name) = fs::read_to_string(entry.path().join("name")) else {
            continue;
        };
        if !name.to_lowercase().contains("vivid") {
            continue;
        }

        let node = Path::new("/dev").join(entry.file_name());
        if Device::open(&node).is_ok() {
            devices.push(node);
        }
    }

    devices.sort();
    devices
}

macro_rules! require_vivid {
    () => {
        match find_vivid_devices().into_iter().next() {
            Some(path) => path,
            None => panic!(
                "vivid virtual camera not available.\n\
                 Load vivid with: sudo modprobe vivid\n\
                 Or run unit tests only: cargo test --lib"
            ),
        }
    };
}

fn config() -> Config {
    Config {
        timeout: Some(Duration::from_secs(5)),
        ..Config::default()
    }
}

fn yuyv_vga() -> Resolution {
    Resolution::new(FourCC::YUYV, 640, 480)
}

#[test]
#[serial]
fn capabilities() {
    let path = require_vivid!();
    let dev = Device::with_config(&path, &config()).unwrap();

    let caps = dev.capabilities();
    assert_eq!(caps.driver, "vivid");
    assert!(caps.has(Flags::VIDEO_CAPTURE | Flags::STREAMING));
    assert_eq!(&dev.query_capabilities().unwrap(), caps);

    dev.close().unwrap();
}

#[test]
#[serial]
fn formats_and_sizes() {
    let path = require_vivid!();
    let dev = Device::with_config(&path, &config()).unwrap();

    let formats = dev.enum_formats().unwrap();
    assert!(!formats.is_empty());
    assert!(dev.supports_format(FourCC::YUYV).unwrap());

    let sizes = dev.frame_sizes(FourCC::YUYV).unwrap();
    assert!(!sizes.is_empty());
    assert!(sizes.supports(640, 480));
}

#[test]
#[serial]
fn select_and_set_format() {
    let path = require_vivid!();
    let dev = Device::with_config(&path, &config()).unwrap();

    let res = dev
        .frame_size()
        .pixel_format(FourCC::YUYV)
        .width(640)
        .height(480)
        .select()
        .unwrap();
    assert_eq!(res, yuyv_vga());

    let applied = dev.set_resolution(&res).unwrap();
    assert_eq!(applied.fourcc, FourCC::YUYV);
    assert_eq!((applied.width, applied.height), (640, 480));
    assert_eq!(dev.format().unwrap().fourcc, FourCC::YUYV);

    match dev.frame_size().pixel_format(FourCC::new(b"ZZZZ")).select() {
        Err(Error::UnsupportedFormat(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
#[serial]
fn snapshot() {
    let path = require_vivid!();
    let dev = Device::with_config(&path, &config()).unwrap();

    let snapshot = dev.snapshot(&yuyv_vga()).unwrap();
    // YUYV is 2 bytes per pixel
    assert_eq!(snapshot.len(), 640 * 480 * 2);
    assert_eq!(snapshot.resolution(), &yuyv_vga());

    let mut seen = 0;
    dev.snapshot_with(&yuyv_vga(), |snap| seen = snap.len()).unwrap();
    assert_eq!(seen, 640 * 480 * 2);

    // buffers are torn down after each snapshot, so this works repeatedly
    let (tx, rx) = mpsc::channel();
    assert!(dev.snapshot_to(&yuyv_vga(), &tx).unwrap());
    assert_eq!(rx.recv().unwrap().len(), 640 * 480 * 2);
}

#[test]
#[serial]
fn stream_sequence() {
    let path = require_vivid!();
    let dev = Device::with_config(&path, &config()).unwrap();

    let mut stream = dev.stream(&yuyv_vga()).unwrap();
    assert!(stream.buffer_count() > 0);

    let mut last = None;
    for _ in 0..10 {
        let frame = stream.next().unwrap();
        assert_eq!(frame.data.len(), 640 * 480 * 2);
        if let Some(last) = last {
            assert!(frame.meta.sequence > last);
        }
        last = Some(frame.meta.sequence);
    }

    stream.stop().unwrap();
    assert!(!stream.is_active());
}

#[test]
#[serial]
fn stream_to_writer_stops_on_flag() {
    let path = require_vivid!();
    let dev = Device::with_config(&path, &config()).unwrap();
    let stop = AtomicBool::new(false);

    let mut sink = Vec::new();
    let frames = thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(500));
            stop.store(true, Ordering::Relaxed);
        });
        dev.stream_to_writer(&yuyv_vga(), &mut sink, &stop).unwrap()
    });

    assert!(frames > 0);
    assert_eq!(sink.len() as u64, frames * 640 * 480 * 2);
}

#[test]
#[serial]
fn stream_by_ticks() {
    let path = require_vivid!();
    let dev = Device::with_config(&path, &config()).unwrap();

    let (tick_tx, tick_rx) = mpsc::channel();
    let (snap_tx, snap_rx) = mpsc::channel();
    for _ in 0..3 {
        tick_tx.send(()).unwrap();
    }
    drop(tick_tx);

    let sent = dev.stream_by_ticks(&yuyv_vga(), tick_rx, snap_tx).unwrap();
    assert_eq!(sent, 3);
    assert_eq!(snap_rx.iter().count(), 3);
}

fn monotonic_now() -> Duration {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    assert_eq!(unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) }, 0);
    Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
}

#[test]
#[serial]
fn ticked_snapshots_are_fresh() {
    let path = require_vivid!();
    let dev = Device::with_config(&path, &config()).unwrap();

    let (tick_tx, tick_rx) = mpsc::channel();
    let (snap_tx, snap_rx) = mpsc::channel();

    thread::scope(|scope| {
        let worker = scope.spawn(|| dev.stream_by_ticks(&yuyv_vga(), tick_rx, snap_tx));

        for _ in 0..3 {
            // several frame periods pass, stale buffers would pile up meanwhile
            thread::sleep(Duration::from_millis(300));
            let sent_at = monotonic_now();
            tick_tx.send(()).unwrap();

            let snapshot = snap_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            let captured_at = Duration::from(snapshot.meta().timestamp);
            assert!(
                captured_at >= sent_at,
                "frame from {:?} handed out for a tick at {:?}",
                captured_at,
                sent_at
            );
        }
        drop(tick_tx);

        assert_eq!(worker.join().unwrap().unwrap(), 3);
    });
}

#[test]
#[serial]
fn search_finds_vivid() {
    let path = require_vivid!();
    assert!(webcam::probe::probe(&path).is_some());

    let found = webcam::search_video_devices().unwrap();
    assert!(found.iter().any(|node| {
        webcam::probe::sysfs_name(node)
            .map(|name| name.to_lowercase().contains("vivid"))
            .unwrap_or(false)
    }));
}
