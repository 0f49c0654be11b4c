use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};
use urtsi_bridge::config::{BindingFile, Config, ConfigLoader};
use urtsi_bridge::logging::init_logging;
use urtsi_bridge::port::{PortOpener, SystemPortOpener};
use urtsi_bridge::{Command, Item, ItemBinding, UrtsiBinding};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drives URTSI roller shutter controllers from up/down/stop commands.",
    long_about = "Binds rollershutter items to URTSI serial ports and channels, then translates UP/DOWN/STOP commands into the URTSI wire format. Each binding file is one configuration context."
)]
struct Args {
    /// Configuration file (defaults to the standard resolution order)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Load binding files and dispatch "<item> <COMMAND>" lines read from stdin
    Run {
        /// Additional binding files, each loaded as its own context
        #[arg(short, long = "bindings")]
        bindings: Vec<PathBuf>,
    },
    /// List the serial ports present on this machine
    Ports,
    /// Validate binding files without opening any port
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Send a single command to one channel
    Send {
        /// Serial port, e.g. /dev/ttyUSB0 or COM3
        #[arg(short, long)]
        port: String,
        /// Channel number (0-99)
        #[arg(short = 'n', long)]
        channel: u32,
        /// UP, DOWN or STOP
        command: Command,
    },
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => ConfigLoader::load_from(path)?.into_config(),
        None => match ConfigLoader::load() {
            Ok(loader) => loader.into_config(),
            Err(e) => {
                eprintln!("Warning: Failed to load config, using defaults: {}", e);
                ConfigLoader::with_defaults().into_config()
            }
        },
    };

    init_logging(&config.logging, args.verbose);

    match args.command.unwrap_or(Action::Run {
        bindings: Vec::new(),
    }) {
        Action::Run { bindings } => run(config, bindings).await,
        Action::Ports => list_ports(&config),
        Action::Check { files } => check(&files),
        Action::Send {
            port,
            channel,
            command,
        } => send(&config, &port, channel, command).await,
    }
}

fn system_opener(config: &Config) -> SystemPortOpener {
    let opener = SystemPortOpener::new(config.serial.port_configuration());
    if config.serial.verify_port_exists {
        opener
    } else {
        opener.without_verification()
    }
}

fn context_name(path: &std::path::Path) -> String {
    path.display().to_string()
}

async fn run(config: Config, extra: Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let binding = UrtsiBinding::new(Arc::new(system_opener(&config)));

    for path in config.bindings.iter().chain(extra.iter()) {
        let context = context_name(path);
        match BindingFile::load(path) {
            Ok(file) => {
                let report = binding.load_context(&context, &file);
                info!(
                    "Loaded {}: {} item(s) bound, {} rejected",
                    context,
                    report.registered.len(),
                    report.failures.len()
                );
            }
            Err(e) => error!("{}", e),
        }
    }

    info!("Ready; open ports: {:?}", binding.open_ports());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&binding, &line),
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            },
            _ = &mut shutdown => break,
        }
    }

    binding.shutdown();
    Ok(())
}

/// Dispatch one "<item> <COMMAND>" line.
fn handle_line(binding: &UrtsiBinding, line: &str) {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return;
    }

    let mut parts = line.split_whitespace();
    let (Some(item), Some(command), None) = (parts.next(), parts.next(), parts.next()) else {
        warn!("Expected '<item> <COMMAND>', got '{}'", line);
        return;
    };

    match command.parse::<Command>() {
        // Fire and forget; the port worker logs write failures.
        Ok(command) => {
            if binding.dispatch(item, command).is_none() {
                info!("Nothing sent for {} {}", item, command);
            }
        }
        Err(e) => warn!("{}", e),
    }
}

fn list_ports(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let ports = system_opener(config).available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}

fn check(files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let mut problems = 0usize;

    for path in files {
        let file = match BindingFile::load(path) {
            Ok(file) => file,
            Err(e) => {
                println!("{}: {}", path.display(), e);
                problems += 1;
                continue;
            }
        };

        for (entry, item) in file.checked_items() {
            let result = item
                .and_then(|item| UrtsiBinding::validate_item_type(&item))
                .and_then(|()| ItemBinding::parse(&entry.urtsi));
            match result {
                Ok(binding) => println!(
                    "{}: {} -> {} channel {}",
                    path.display(),
                    entry.name,
                    binding.port,
                    binding.channel
                ),
                Err(e) => {
                    println!("{}: {}: {}", path.display(), entry.name, e);
                    problems += 1;
                }
            }
        }
    }

    if problems > 0 {
        return Err(format!("{} problem(s) found", problems).into());
    }
    Ok(())
}

async fn send(
    config: &Config,
    port: &str,
    channel: u32,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    let binding = UrtsiBinding::new(Arc::new(system_opener(config)));
    let item = Item::rollershutter("cli");
    binding.register("cli", &item, &format!("{}:{}", port, channel))?;

    let ticket = binding.dispatch(&item.name, command);
    let result: Result<(), Box<dyn std::error::Error>> = match ticket {
        Some(ticket) => ticket.outcome().await.map_err(Into::into),
        None => {
            println!("{} does not translate to a URTSI command; nothing sent.", command);
            Ok(())
        }
    };

    binding.shutdown();
    result
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, shutting down");
}
