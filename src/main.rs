//! Binary entrypoint for the tamapet CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `run [--name <name>] [--seed <n>]` - hatch a pet and look after it from the terminal
//! - `status` - print a freshly hatched pet from the current config as JSON
//!
//! See the library crate docs for module-level details: `tamapet::`.
use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::sync::mpsc;

use tamapet::config::Config;
use tamapet::display;
use tamapet::pet::{Attribute, LifeStage, Pet};

#[derive(Parser)]
#[command(name = "tamapet")]
#[command(about = "Look after a virtual pet from your terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Hatch a pet and run until it dies or you quit
    Run {
        /// Pet name (overrides config)
        #[arg(short, long)]
        name: Option<String>,
        /// Seed for the decay draws (overrides config)
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Print a newly hatched pet as JSON
    Status,
}

enum PetEvent {
    Stage(LifeStage),
    Attributes,
}

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Run { name, seed } => {
            let mut config = load_or_default(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            if let Some(name) = name {
                config.pet.name = name;
            }
            if seed.is_some() {
                config.pet.seed = seed;
            }
            info!("Starting tamapet v{}", env!("CARGO_PKG_VERSION"));
            run_pet(&config).await?;
        }
        Commands::Status => {
            let config = load_or_default(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let pet = Pet::manual(&config.pet);
            println!("{}", serde_json::to_string_pretty(&pet.snapshot())?);
        }
    }

    Ok(())
}

async fn load_or_default(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::load(path).await
    } else {
        Ok(Config::default())
    }
}

async fn run_pet(config: &Config) -> Result<()> {
    let pet = Pet::spawn(&config.pet);
    let (tx, mut rx) = mpsc::unbounded_channel::<PetEvent>();

    let stage_tx = tx.clone();
    pet.on_stage_changed(move |stage| {
        let _ = stage_tx.send(PetEvent::Stage(stage));
    });
    pet.on_attributes_changed(move || {
        let _ = tx.send(PetEvent::Attributes);
    });

    println!("{}", display::render(&pet.snapshot()));
    println!("Commands: feed, play, teach, set <attribute> <0-4>, status, rename <name>, quit");

    let mut lines = spawn_stdin_reader();
    loop {
        tokio::select! {
            Some(event) = rx.recv() => match event {
                PetEvent::Stage(stage) => {
                    println!("{}", display::stage_line(&pet.name(), stage));
                    if stage.is_terminal() {
                        println!("{}", display::render(&pet.snapshot()));
                        break;
                    }
                }
                PetEvent::Attributes => println!("{}", display::render(&pet.snapshot())),
            },
            line = lines.recv() => match line {
                Some(line) => {
                    if let Flow::Quit = handle_command(&pet, line.trim()) {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    pet.shutdown().await;
    info!("Goodbye");
    Ok(())
}

/// Read stdin on a plain thread; a blocked read never holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        use std::io::BufRead;
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn handle_command(pet: &Pet, line: &str) -> Flow {
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    match verb.to_lowercase().as_str() {
        "" => {}
        "feed" | "f" => {
            if !pet.feed() {
                println!("{} is not hungry.", pet.name());
            }
        }
        "play" | "p" => {
            if !pet.play() {
                println!("{} is as happy as can be.", pet.name());
            }
        }
        "teach" | "t" => {
            if !pet.teach() {
                println!("{} cannot learn any more right now.", pet.name());
            }
        }
        "status" | "s" => println!("{}", display::render(&pet.snapshot())),
        "rename" => {
            if rest.is_empty() {
                println!("Usage: rename <name>");
            } else {
                pet.rename(rest);
            }
        }
        "set" => set_attribute(pet, rest),
        "quit" | "q" | "exit" => return Flow::Quit,
        other => println!("Unknown command '{}'", other),
    }
    Flow::Continue
}

fn set_attribute(pet: &Pet, args: &str) {
    let mut parts = args.split_whitespace();
    let attribute = parts.next().and_then(Attribute::parse);
    let value = parts.next().and_then(|v| v.parse::<i32>().ok());
    match (attribute, value) {
        (Some(attribute), Some(value)) => {
            if let Err(e) = pet.try_set(attribute, value) {
                println!("Not changed: {}", e);
            }
        }
        _ => println!("Usage: set <hunger|happiness|intelligence> <0-4>"),
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // Base level from config; CLI verbosity raises it
    let config_level = config
        .as_ref()
        .and_then(|cfg| cfg.logging.level_filter().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => config_level,
        1 => config_level.max(log::LevelFilter::Debug),
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config.as_ref().and_then(|cfg| cfg.logging.file.clone());
    if let Some(file) = log_file {
        match std::fs::OpenOptions::new().create(true).append(true).open(&file) {
            Ok(f) => {
                let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
                // Echo to the console only when attached to a terminal
                let is_tty = atty::is(atty::Stream::Stdout);
                builder.format(move |fmt, record| {
                    let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                    let line = format!("{} [{}] {}", ts, record.level(), record.args());
                    if let Ok(mut guard) = write_mutex.lock() {
                        let _ = writeln!(guard, "{}", line);
                    }
                    if is_tty {
                        writeln!(fmt, "{}", line)
                    } else {
                        Ok(())
                    }
                });
            }
            Err(e) => {
                eprintln!("Cannot open log file {}: {} (logging to console)", file, e);
                builder.format(console_format);
            }
        }
    } else {
        builder.format(console_format);
    }
    let _ = builder.try_init();
}

fn console_format(
    fmt: &mut env_logger::fmt::Formatter,
    record: &log::Record<'_>,
) -> std::io::Result<()> {
    use std::io::Write;
    writeln!(
        fmt,
        "{} [{}] {}",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
        record.level(),
        record.args()
    )
}
