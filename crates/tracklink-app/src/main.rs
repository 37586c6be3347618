//! Tracklink command-line tool
//!
//! Inspects a tracking service through the controller API. Without a
//! fixture the built-in demo scene is served.
//!
//! # Usage
//!
//! ```bash
//! # Newest frame of the demo scene
//! tracklink frame
//!
//! # Devices from a recorded fixture
//! tracklink --fixture session.json devices
//!
//! # Distance from a point to the first device's sensing volume
//! tracklink boundary 0 300 0
//!
//! # Read and write configuration
//! tracklink config get power_saving_adapter
//! tracklink config set robust_mode_enabled true
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tracklink_core::Vector;
use tracklink_native::{ConfigValue, Controller, ControllerSettings, SimulatedService};

/// Tracklink command-line tool
#[derive(Parser, Debug)]
#[command(name = "tracklink")]
#[command(author, version, about = "Inspect a hand tracking service", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON fixture to serve instead of the demo scene
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// JSON controller settings
    #[arg(short, long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a frame with its hands and fingers
    Frame {
        /// Frames back from the newest
        #[arg(long, default_value = "0")]
        history: usize,
    },

    /// List connected and failed devices
    Devices,

    /// Distance from a point to a device's sensing volume
    Boundary {
        /// Point x, millimetres
        #[arg(allow_hyphen_values = true)]
        x: f32,
        /// Point y, millimetres
        #[arg(allow_hyphen_values = true)]
        y: f32,
        /// Point z, millimetres
        #[arg(allow_hyphen_values = true)]
        z: f32,
        /// Index of the device in the device list
        #[arg(long, default_value = "0")]
        device: usize,
    },

    /// Read or write service configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the value of a key
    Get {
        /// Configuration key
        key: String,
    },
    /// Store a value; `true`, `42` and `1.5` are typed, anything else is a string
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Tracklink v{}", env!("CARGO_PKG_VERSION"));

    let service = Arc::new(match &cli.fixture {
        Some(path) => SimulatedService::load(path)?,
        None => SimulatedService::demo(),
    });
    let settings = match &cli.settings {
        Some(path) => ControllerSettings::load(path)?,
        None => ControllerSettings::default(),
    };
    let controller = Controller::with_settings(service.clone(), settings);

    match cli.command {
        Commands::Frame { history } => print_frame(&controller, history)?,
        Commands::Devices => print_devices(&controller),
        Commands::Boundary { x, y, z, device } => print_boundary(&controller, Vector::new(x, y, z), device)?,
        Commands::Config { action } => run_config(&service, &controller, action)?,
    }

    Ok(())
}

/// Print one frame, its hands and their fingers
fn print_frame(controller: &Controller, history: usize) -> anyhow::Result<()> {
    let frame = controller.try_frame(history)?;
    println!(
        "{} at {} us, {:.1} fps",
        frame,
        frame.timestamp(),
        frame.current_frames_per_second()
    );

    for hand in &frame.hands() {
        let palm = hand.palm_position();
        println!(
            "  {} palm ({:.1}, {:.1}, {:.1}) grab {:.2} pinch {:.2}",
            hand, palm.x, palm.y, palm.z, hand.grab_strength(), hand.pinch_strength()
        );
        for finger in &hand.fingers() {
            let tip = finger.tip_position();
            println!(
                "    {} tip ({:.1}, {:.1}, {:.1}){}",
                finger,
                tip.x,
                tip.y,
                tip.z,
                if finger.is_extended() { " extended" } else { "" }
            );
        }
    }

    for image in &frame.images() {
        println!(
            "  {} {}x{} {}",
            image,
            image.width(),
            image.height(),
            if image.data().is_some() { "buffered" } else { "released" }
        );
    }

    Ok(())
}

/// Print connected and failed devices
fn print_devices(controller: &Controller) {
    let devices = controller.devices();
    println!("{} device(s)", devices.count());
    for device in &devices {
        println!(
            "  {} range {:.0} mm, baseline {:.0} mm{}{}",
            device,
            device.range(),
            device.baseline(),
            if device.is_streaming() { ", streaming" } else { "" },
            if device.is_smudged() { ", smudged" } else { "" }
        );
    }

    for failed in &controller.failed_devices() {
        println!("  failed {} ({:?})", failed.pnp_id(), failed.failure());
    }
}

/// Print the distance from `point` to a device's sensing volume
fn print_boundary(controller: &Controller, point: Vector, index: usize) -> anyhow::Result<()> {
    let devices = controller.devices();
    if index >= devices.count() {
        anyhow::bail!("No device at index {} ({} connected)", index, devices.count());
    }
    let device = devices.get(index);
    println!(
        "{}: {:.3} mm from ({}, {}, {})",
        device,
        device.distance_to_boundary(&point),
        point.x,
        point.y,
        point.z
    );
    Ok(())
}

/// Run a configuration round-trip against the service
fn run_config(service: &Arc<SimulatedService>, controller: &Controller, action: ConfigAction) -> anyhow::Result<()> {
    use tokio::runtime::Runtime;

    let rt = Runtime::new()?;
    rt.block_on(async {
        let _server = service.spawn_config_server();
        let config = controller.config();
        match action {
            ConfigAction::Get { key } => {
                let value = config.get(&key).await?;
                println!("{key} = {value}");
            }
            ConfigAction::Set { key, value } => {
                let value: ConfigValue = value.parse()?;
                config.set_value(&key, value.clone()).await?;
                println!("{key} = {value}");
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}
