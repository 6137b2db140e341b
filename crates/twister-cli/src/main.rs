//! twister - bind a parameter bank to a 16-knob MIDI controller
//!
//! Reads the bank from the config file, binds it to the encoders and keeps
//! the controller and the parameters in sync until interrupted.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use twister_core::{
    config::Config,
    midi,
    param::{Parameter, Subscription},
    InboundQueue, Twister,
};

#[derive(Parser)]
#[command(name = "twister")]
#[command(author, version, long_about = None)]
#[command(about = "Bind a parameter bank to a 16-knob MIDI controller")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (default: ~/.config/twister/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port name prefix of the controller
    #[arg(short, long)]
    port: Option<String>,

    /// Poll interval in milliseconds
    #[arg(long)]
    frame_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
    /// List available MIDI ports
    ListPorts,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            let path = Config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
            return Ok(());
        }
        Some(Commands::ConfigPath) => {
            let path = Config::config_path()?;
            println!("{}", path.display());
            return Ok(());
        }
        Some(Commands::ListPorts) => {
            let ports = midi::list_ports()?;
            print_ports("input", &ports.inputs);
            print_ports("output", &ports.outputs);
            return Ok(());
        }
        None => {}
    }

    // Load config
    let mut config = if let Some(path) = cli.config {
        Config::load_from(&path).with_context(|| format!("loading {}", path.display()))?
    } else {
        Config::load_or_default()
    };

    // Apply CLI overrides
    if let Some(port) = cli.port {
        config.device.port_prefix = port;
    }
    if let Some(frame_ms) = cli.frame_ms {
        config.engine.frame_ms = frame_ms.max(1);
    }

    run(config)
}

fn print_ports(kind: &str, ports: &[String]) {
    if ports.is_empty() {
        println!("No MIDI {} ports found", kind);
    } else {
        println!("Available MIDI {} ports:", kind);
        for (index, port) in ports.iter().enumerate() {
            println!("  {}: {}", index, port);
        }
    }
}

fn run(config: Config) -> Result<()> {
    let group = config.parameter_group();
    if group.is_empty() {
        log::warn!("No parameters configured, run `twister init` for an example");
    }

    let queue = InboundQueue::bounded(config.engine.queue_capacity);
    let connection = midi::connect(&config.device, queue.sender())?;
    if !connection.has_input() || !connection.has_output() {
        log::warn!(
            "Controller '{}' only partly connected (input: {}, output: {})",
            config.device.port_prefix,
            connection.has_input(),
            connection.has_output()
        );
    }
    let mut twister = Twister::new(connection.output(), queue);

    let report = twister.set_params(&group);
    log::info!(
        "{} bound, {} disabled, {} ignored",
        report.bound,
        report.disabled,
        report.ignored
    );

    // Keep alive for the whole session
    let _subscriptions: Vec<Subscription> = group.iter().filter_map(log_changes).collect();

    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&term))?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&term))?;

    let interval = config.engine.frame_interval();
    while !term.load(Ordering::Relaxed) {
        twister.update();
        thread::sleep(interval);
    }

    log::info!("Shutting down");
    twister.clear();
    Ok(())
}

fn log_changes(param: &Parameter) -> Option<Subscription> {
    let name = param.name().to_string();
    match param {
        Parameter::Numeric(p) => Some(p.subscribe(move |v| log::info!("{} = {:.3}", name, v))),
        Parameter::Boolean(p) => Some(p.subscribe(move |v| log::info!("{} = {}", name, v))),
        Parameter::Text(_) => None,
    }
}
