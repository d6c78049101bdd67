//! SeqLog CLI Client
//!
//! Command-line interface for interacting with a SeqLog server.

use std::io::Write;

use clap::{Parser, Subcommand};
use seqlog::network::Client;
use tracing_subscriber::{fmt, EnvFilter};

/// SeqLog CLI
#[derive(Parser, Debug)]
#[command(name = "seqlog-cli")]
#[command(about = "CLI for the SeqLog append-only store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a value and print its key
    Insert {
        /// The value to store
        value: String,
    },

    /// Print the value stored under a key
    Get {
        /// The key to look up
        key: u64,
    },

    /// Ping the server
    Ping,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> seqlog::Result<()> {
    let mut client = Client::connect(args.server.as_str())?;

    match args.command {
        Commands::Insert { value } => {
            let key = client.insert(value.as_bytes())?;
            println!("{}", key);
        }
        Commands::Get { key } => match client.get(key)? {
            Some(value) => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&value)?;
                stdout.write_all(b"\n")?;
            }
            None => {
                eprintln!("(not found)");
                std::process::exit(2);
            }
        },
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }

    Ok(())
}
