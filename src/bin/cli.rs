//! linekv CLI
//!
//! One-shot create/read/delete against a store file, plus an interactive
//! shell that accepts `create "key" {...} [ttl]`, `read "key"` and
//! `delete "key"` lines.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use linekv::protocol::{parse_command, ttl_from_secs, Response};
use linekv::{Config, Engine, LineKvError};
use tracing_subscriber::{fmt, EnvFilter};

/// linekv CLI
#[derive(Parser, Debug)]
#[command(name = "linekv")]
#[command(about = "Minimal persistent JSON key-value store")]
#[command(version)]
struct Args {
    /// Backing data file
    #[arg(short, long, env = "LINEKV_DB", default_value = "./linekv.db")]
    db: PathBuf,

    /// Hash modulus (bounds the highest home line)
    #[arg(long, default_value_t = linekv::index::DEFAULT_MODULUS)]
    modulus: u64,

    /// Lines probed per key when its home line is taken
    #[arg(long, default_value_t = 8)]
    probe_window: u64,

    /// Skip fsync of each rewritten file
    #[arg(long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a record
    Create {
        /// The key (at most 32 characters)
        key: String,

        /// The value, a JSON object
        value: String,

        /// Expire the record after this many seconds (waits before exiting)
        #[arg(long, value_parser = parse_ttl)]
        ttl: Option<Duration>,
    },

    /// Print a record's value
    Read {
        /// The key to read
        key: String,
    },

    /// Delete a record
    Delete {
        /// The key to delete
        key: String,
    },

    /// Read commands from stdin until EOF or `exit`
    Shell,
}

fn main() {
    // Initialize tracing/logging (stderr, so stdout only carries results)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,linekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("linekv v{}", linekv::VERSION);

    let config = Config::builder()
        .path(&args.db)
        .hash_modulus(args.modulus)
        .probe_window(args.probe_window)
        .sync_writes(!args.no_sync)
        .build();

    if let Err(e) = run(config, args.command) {
        eprintln!("error {:03}: {}", e.code(), e);
        std::process::exit(1);
    }
}

fn run(config: Config, command: Commands) -> Result<(), LineKvError> {
    let engine = Engine::open(config)?;

    match command {
        Commands::Create { key, value, ttl } => {
            engine.create(&key, &value, ttl)?;
            println!("ok");

            if let Some(ttl) = ttl {
                tracing::info!("Waiting {:.3}s for {:?} to expire", ttl.as_secs_f64(), key);
                return engine.close_after_expiries();
            }
        }
        Commands::Read { key } => {
            println!("{}", engine.read_json(&key)?);
        }
        Commands::Delete { key } => {
            engine.delete(&key)?;
            println!("ok");
        }
        Commands::Shell => {
            shell(&engine)?;
        }
    }

    engine.close()
}

fn shell(engine: &Engine) -> Result<(), LineKvError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    prompt(&mut stdout)?;
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();

        match line {
            "" => {}
            "exit" | "quit" => break,
            _ => {
                let response = match parse_command(line) {
                    Ok(command) => {
                        tracing::trace!(
                            command = command.command_type().as_str(),
                            key = %command.key(),
                            "Executing"
                        );
                        Response::from_result(engine.execute(command))
                    }
                    Err(e) => Response::error(&e),
                };
                writeln!(stdout, "{}", response)?;
            }
        }
        prompt(&mut stdout)?;
    }

    let pending = engine.pending_expiries();
    if pending > 0 {
        tracing::warn!(pending, "Leaving shell, pending expiries are cancelled");
    }
    Ok(())
}

fn prompt(stdout: &mut io::Stdout) -> io::Result<()> {
    write!(stdout, "linekv> ")?;
    stdout.flush()
}

fn parse_ttl(text: &str) -> Result<Duration, String> {
    let secs: f64 = text
        .parse()
        .map_err(|_| format!("{:?} is not a number of seconds", text))?;
    ttl_from_secs(secs).map_err(|e| e.to_string())
}
