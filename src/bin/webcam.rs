use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use webcam::probe::{probe, sysfs_name};
use webcam::{Capture, Config, Device, FourCC, Resolution};

#[derive(Parser)]
#[command(name = "webcam")]
#[command(about = "Query and capture from video4linux webcams")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Target {
    /// Device node to open
    #[arg(short, long, default_value = "/dev/video0")]
    device: PathBuf,
}

#[derive(clap::Args)]
struct Select {
    #[command(flatten)]
    target: Target,

    /// Pixel format, as fourcc (MJPG) or constant name (V4L2_PIX_FMT_MJPEG)
    #[arg(short, long)]
    format: Option<String>,

    /// Desired width, 0 takes the first offered size
    #[arg(long, default_value = "0")]
    width: u32,

    /// Desired height, 0 takes the first size offered for the width
    #[arg(long, default_value = "0")]
    height: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// List capture devices, one line per camera
    List,

    /// Show the capabilities of a device
    Info {
        #[command(flatten)]
        target: Target,
    },

    /// List the pixel formats a device offers
    Formats {
        #[command(flatten)]
        target: Target,
    },

    /// List the frame sizes offered for a pixel format
    Sizes {
        #[command(flatten)]
        target: Target,

        /// Pixel format, as fourcc or constant name
        #[arg(short, long, default_value = "MJPG")]
        format: String,
    },

    /// Capture a single frame into a file
    Snapshot {
        #[command(flatten)]
        select: Select,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Append captured frames to a file
    Stream {
        #[command(flatten)]
        select: Select,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of frames to capture
        #[arg(long, default_value = "30")]
        frames: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG controls the log level, e.g. RUST_LOG=webcam=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::List => list(&config),
        Commands::Info { target } => {
            let dev = Device::with_config(&target.device, &config)?;
            let caps = dev.capabilities();
            println!("Driver   : {}", caps.driver);
            println!("Card     : {}", caps.card);
            println!("Bus      : {}", caps.bus);
            println!(
                "Version  : {}.{}.{}",
                caps.version.0, caps.version.1, caps.version.2
            );
            for name in caps.names() {
                println!("           {}", name);
            }
            Ok(dev.close()?)
        }
        Commands::Formats { target } => {
            let dev = Device::with_config(&target.device, &config)?;
            for desc in dev.enum_formats()? {
                println!("{}", desc);
            }
            Ok(())
        }
        Commands::Sizes { target, format } => {
            let fourcc = FourCC::from_name(&format)
                .ok_or_else(|| format!("not a pixel format: {}", format))?;
            let dev = Device::with_config(&target.device, &config)?;
            for size in dev.enum_framesizes(fourcc)? {
                println!("{}", size);
            }
            Ok(())
        }
        Commands::Snapshot { select, output } => {
            let dev = Device::with_config(&select.target.device, &config)?;
            let res = resolution(&dev, &select)?;
            let snapshot = dev.snapshot(&res)?;
            std::fs::write(&output, snapshot.data())?;
            info!(output = %output.display(), snapshot = %snapshot, "snapshot written");
            println!("{}", snapshot);
            Ok(())
        }
        Commands::Stream {
            select,
            output,
            frames,
        } => {
            let dev = Device::with_config(&select.target.device, &config)?;
            let res = resolution(&dev, &select)?;
            let mut writer = BufWriter::new(File::create(&output)?);

            let mut stream = dev.stream(&res)?;
            for _ in 0..frames {
                let frame = stream.next()?;
                writer.write_all(frame.data)?;
            }
            writer.flush()?;
            stream.stop()?;

            println!("{} frames of {} written to {}", frames, res, output.display());
            Ok(())
        }
    }
}

fn list(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    for path in webcam::search_with(config)? {
        let name = match sysfs_name(&path) {
            Some(name) => name,
            None => probe(&path).map(|caps| caps.card).unwrap_or_default(),
        };
        println!("{}\t{}", path.display(), name);
    }
    Ok(())
}

fn resolution(dev: &Device, select: &Select) -> webcam::Result<Resolution> {
    let mut selector = dev.frame_size().width(select.width).height(select.height);
    if let Some(format) = &select.format {
        selector = selector.pixel_format_name(format);
    }
    selector.select()
}
