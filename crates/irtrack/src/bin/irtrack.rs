//! irtrack CLI: replay frames through the tracking pipeline, or listen for
//! coordinate packets.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use irtrack::protocol::{decode, UdpCoordinateReceiver};
use irtrack::{AppConfig, FrameSource, ImageSequenceSource, MarkerDetectorParams, Session};
use nalgebra::Point2;

#[cfg(not(feature = "tracing"))]
use log::LevelFilter;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "irtrack")]
#[command(about = "Track infrared point markers and stream rectified coordinates over UDP")]
#[command(version)]
struct Cli {
    /// Log debug output.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit JSON log lines (with the `tracing` feature).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded frames through detection, calibration and sending.
    Track(TrackArgs),

    /// Listen for coordinate packets and print them.
    Receive(ReceiveArgs),

    /// Write the default settings as JSON.
    InitConfig {
        /// Destination path.
        path: PathBuf,
    },
}

#[derive(Debug, Args)]
struct TrackArgs {
    /// Directory of grayscale frames, replayed in file name order.
    #[arg(long)]
    frames: PathBuf,

    /// Settings JSON (see `init-config`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Marker detector parameters JSON.
    #[arg(long)]
    detector: Option<PathBuf>,

    /// Override the destination address.
    #[arg(long)]
    ip: Option<String>,

    /// Override the destination port.
    #[arg(long)]
    port: Option<u16>,

    /// Calibration corners TL;TR;BR;BL in raw pixels, e.g. "10,10;630,10;630,470;10,470".
    #[arg(long)]
    calibration: Option<String>,

    /// Start over at the first frame after the last one.
    #[arg(long = "loop")]
    looping: bool,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Run the pipeline without publishing packets.
    #[arg(long)]
    no_send: bool,

    /// Write one JSON report line per frame.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Save the combined overview/detail panel of each frame as PNG.
    #[arg(long)]
    save_panels: Option<PathBuf>,

    /// Pause between frames in milliseconds.
    #[arg(long, default_value_t = 10)]
    interval_ms: u64,
}

#[derive(Debug, Args)]
struct ReceiveArgs {
    /// Local address to listen on.
    #[arg(long, default_value = "0.0.0.0:7777")]
    bind: String,

    /// Stop after this many seconds.
    #[arg(long)]
    duration_secs: Option<f64>,

    /// Stop after this many packets.
    #[arg(long)]
    max_packets: Option<u64>,

    /// Poll interval in milliseconds.
    #[arg(long, default_value_t = 10)]
    interval_ms: u64,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json)?;

    match cli.command {
        Commands::Track(args) => run_track(&args),
        Commands::Receive(args) => run_receive(&args),
        Commands::InitConfig { path } => run_init_config(&path),
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: bool, _json: bool) -> CliResult<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    irtrack::core::init_with_level(level)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(_verbose: bool, json: bool) -> CliResult<()> {
    // Ignore errors if a logger was already installed.
    let _ = tracing_log::LogTracer::init();
    irtrack::core::init_tracing(json);
    Ok(())
}

// ── track ─────────────────────────────────────────────────────────────

fn run_track(args: &TrackArgs) -> CliResult<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(ip) = &args.ip {
        config.ip = ip.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    let params: MarkerDetectorParams = match &args.detector {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => MarkerDetectorParams::default(),
    };

    let mut source = ImageSequenceSource::open_dir(&args.frames, args.looping)?;
    let mut session = Session::new(config, params)?;
    session.set_sending(!args.no_send);

    if let Some(corners) = &args.calibration {
        let packet = decode(corners);
        if packet.len() != 4 {
            return Err(format!(
                "--calibration needs exactly 4 corners, got {}",
                packet.len()
            )
            .into());
        }
        for p in &packet.points {
            session.click(Point2::new(p.x as f32, p.y as f32))?;
        }
    }

    let mut report = match &args.report {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };
    if let Some(dir) = &args.save_panels {
        fs::create_dir_all(dir)?;
    }

    let interval = Duration::from_millis(args.interval_ms);
    let mut processed = 0u64;
    let mut sent = 0u64;
    loop {
        if args.max_frames.is_some_and(|max| processed >= max) {
            break;
        }
        let Some(tick) = session.tick(&mut source)? else {
            if source.is_finished() {
                break;
            }
            thread::sleep(interval);
            continue;
        };

        if let Some(out) = report.as_mut() {
            serde_json::to_writer(&mut *out, &tick.report)?;
            out.write_all(b"\n")?;
        }
        if let Some(dir) = &args.save_panels {
            let path = dir.join(format!("frame_{:06}.png", tick.report.frame));
            tick.result.side_by_side().save(&path)?;
        }
        if tick.report.sent_bytes > 0 {
            sent += 1;
        }
        processed += 1;
        thread::sleep(interval);
    }

    if let Some(mut out) = report {
        out.flush()?;
    }
    println!("processed {processed} frame(s), sent {sent} packet(s)");
    Ok(())
}

// ── receive ───────────────────────────────────────────────────────────

fn run_receive(args: &ReceiveArgs) -> CliResult<()> {
    let mut receiver = UdpCoordinateReceiver::bind(args.bind.as_str())?;
    let started = Instant::now();
    let deadline = args
        .duration_secs
        .map(|s| started + Duration::from_secs_f64(s.max(0.0)));
    let interval = Duration::from_millis(args.interval_ms);
    let mut was_connected = false;

    loop {
        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            break;
        }
        if args
            .max_packets
            .is_some_and(|max| receiver.total_packets() >= max)
        {
            break;
        }

        match receiver.poll(now)? {
            Some(packet) => {
                let points: Vec<String> = packet
                    .packet
                    .points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("#{}: ({}, {})", i + 1, p.x, p.y))
                    .collect();
                println!("{} | {}", packet.raw, points.join("   |   "));
            }
            None => thread::sleep(interval),
        }

        let connected = receiver.is_connected_at(Instant::now());
        if connected != was_connected {
            if connected {
                log::info!("connected");
            } else {
                log::warn!("no packets for 3 s, waiting");
            }
            was_connected = connected;
        }
    }

    println!("received {} packet(s)", receiver.total_packets());
    Ok(())
}

// ── init-config ───────────────────────────────────────────────────────

fn run_init_config(path: &Path) -> CliResult<()> {
    AppConfig::default().write(path)?;
    println!("wrote default settings to {}", path.display());
    Ok(())
}
