//! Hand tracking to servo control: tracker, serial sender, and launcher.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hand_servo::{
    app::{build_sender, TrackerApp},
    config::{Config, SenderMode},
    constants::{DEMO_PAUSE_MS, EXIT_SERIAL_UNAVAILABLE},
    hand_landmarks::JsonLinesSource,
    launcher::{run_launcher, LaunchOptions},
    sender::{resolve_sender_program, SenderOptions},
    serial::{default_port, demo_sequence, parse_serve_line, plan_commands, SerialLink},
    utils::lossy_lines::LossyLines,
};
use log::{error, info, warn};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read landmark frames and print smoothed hand angles
    Track {
        /// Landmark file in JSON-lines format (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print angles but never send servo commands
        #[arg(long)]
        no_send: bool,

        /// Smooth and gate all hands together
        #[arg(long)]
        shared_state: bool,

        /// Servo channel for every hand
        #[arg(long)]
        channel: Option<u8>,

        /// Serial port handed to the sender
        #[arg(long)]
        port: Option<String>,

        /// Sender transport (spawn, pipe)
        #[arg(long)]
        mode: Option<String>,
    },

    /// Send commands to the servo board over serial
    Send {
        /// Serial port
        #[arg(long)]
        port: Option<String>,

        /// Baud rate
        #[arg(long)]
        baud: Option<u32>,

        /// Servo channel
        #[arg(long)]
        channel: Option<u8>,

        /// Target angle
        #[arg(long, allow_negative_numbers = true)]
        angle: Option<f64>,

        /// Speed in degrees per second
        #[arg(long)]
        speed: Option<f64>,

        /// Keep the port open and read `<angle>` or `<ch> <angle>` lines from stdin
        #[arg(long)]
        serve: bool,
    },

    /// Run the tracker as a child process and relay its angles
    Launch {
        /// Forward angles to the servo board
        #[arg(long)]
        live: bool,

        /// Tracker program (default: this executable's `track` subcommand)
        #[arg(long)]
        tracker: Option<PathBuf>,

        /// Arguments passed to a custom tracker program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };

    info!("Loading configuration from: {}", path.display());
    match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config file: {}. Using defaults.", e);
            Config::default()
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_track(
    mut config: Config,
    config_path: Option<&Path>,
    input: Option<&Path>,
    no_send: bool,
    shared_state: bool,
    channel: Option<u8>,
    port: Option<String>,
    mode: Option<&str>,
) -> Result<()> {
    if shared_state {
        config.smoothing.shared_state = true;
    }
    if let Some(channel) = channel {
        config.dispatch.channels = vec![channel];
    }
    if port.is_some() {
        config.dispatch.port = port;
    }
    if let Some(mode) = mode {
        config.dispatch.mode = match mode {
            "pipe" => SenderMode::Pipe,
            "spawn" => SenderMode::Spawn,
            other => anyhow::bail!("Unknown sender mode: {other}"),
        };
    }

    let sender = build_sender(&config, config_path, no_send)?;
    let mut app = TrackerApp::new(config, sender, io::stdout().lock())?;

    let stats = match input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            app.run(&mut JsonLinesSource::new(BufReader::new(file)))?
        }
        None => app.run(&mut JsonLinesSource::new(io::stdin().lock()))?,
    };
    info!("Processed {} frames", stats.frames);
    Ok(())
}

fn run_send(
    mut config: Config,
    port: Option<String>,
    baud: Option<u32>,
    channel: Option<u8>,
    angle: Option<f64>,
    speed: Option<f64>,
    serve: bool,
) -> Result<()> {
    if port.is_some() {
        config.serial.port = port;
    }
    if let Some(baud) = baud {
        config.serial.baud = baud;
    }
    config.validate()?;

    // Resolve what to send before touching the hardware
    let commands = if serve {
        None
    } else {
        plan_commands(channel, angle, speed)?
    };

    let mut link = match SerialLink::open(&config.serial) {
        Ok(link) => link,
        Err(e) => {
            let name = config.serial.port.as_deref().unwrap_or(default_port());
            error!("ERROR: cannot open serial {}: {}", name, e);
            std::process::exit(EXIT_SERIAL_UNAVAILABLE);
        }
    };

    if serve {
        let default_channel = channel.unwrap_or_else(|| config.dispatch.channel_for_hand(0));
        info!("Serving commands from stdin (default channel {})", default_channel);
        for line in LossyLines::new(io::stdin().lock()) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_serve_line(&line, default_channel) {
                Ok(command) => {
                    link.send(&command)?;
                }
                Err(e) => warn!("Ignoring line: {}", e),
            }
        }
        info!("Input closed, stopping");
        return Ok(());
    }

    match commands {
        Some(commands) => {
            for command in &commands {
                link.send(command)?;
            }
        }
        None => link.run_steps(&demo_sequence(DEMO_PAUSE_MS))?,
    }
    Ok(())
}

fn run_launch(
    config: Config,
    config_path: Option<&Path>,
    live: bool,
    tracker: Option<PathBuf>,
    args: Vec<String>,
) -> Result<()> {
    let this_exe = std::env::current_exe().context("Failed to locate the current executable")?;

    let (tracker_program, tracker_args) = match tracker {
        Some(program) => (program, args),
        None => {
            let mut tracker_args = Vec::new();
            if let Some(path) = config_path {
                tracker_args.push("--config".to_string());
                tracker_args.push(path.display().to_string());
            }
            tracker_args.push("track".to_string());
            // The launcher does the sending itself when live
            if live {
                tracker_args.push("--no-send".to_string());
            }
            tracker_args.extend(args);
            (this_exe, tracker_args)
        }
    };

    let sender_program = resolve_sender_program(config.dispatch.sender_program.as_deref())?;
    let options = LaunchOptions {
        tracker_program,
        tracker_args,
        live,
        sender: SenderOptions::from_config(&config, config_path),
    };
    run_launcher(config, &sender_program, &options)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Hand Servo {} ({})", env!("CARGO_PKG_VERSION"), env!("BUILD_TARGET"));

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Track {
            input,
            no_send,
            shared_state,
            channel,
            port,
            mode,
        } => run_track(
            config,
            cli.config.as_deref(),
            input.as_deref(),
            no_send,
            shared_state,
            channel,
            port,
            mode.as_deref(),
        ),
        Commands::Send {
            port,
            baud,
            channel,
            angle,
            speed,
            serve,
        } => run_send(config, port, baud, channel, angle, speed, serve),
        Commands::Launch { live, tracker, args } => run_launch(config, cli.config.as_deref(), live, tracker, args),
    }
}
