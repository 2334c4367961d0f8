//! redline CLI Client
//!
//! One-shot command-line client for any RESP server.

use clap::{Parser, Subcommand};
use redline::{Client, Config, RedlineError};
use tracing_subscriber::{fmt, EnvFilter};

/// redline CLI
#[derive(Parser, Debug)]
#[command(name = "redline-cli")]
#[command(about = "Pipelined Redis protocol client")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    addr: String,

    /// Password for AUTH
    #[arg(short, long)]
    password: Option<String>,

    /// Database index to SELECT
    #[arg(short = 'n', long, default_value = "0")]
    db: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete one or more keys
    Del {
        /// The keys to delete
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Check whether a key exists
    Exists {
        /// The key to check
        key: String,
    },

    /// Increment an integer value
    Incr {
        /// The key to increment
        key: String,

        /// Amount to add
        #[arg(short, long, default_value = "1", allow_hyphen_values = true)]
        by: i64,
    },

    /// Ping the server
    Ping,

    /// Echo a message
    Echo {
        /// The message to echo
        message: String,
    },
}

fn main() {
    // Logs go to stderr so command output stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,redline=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("(error) {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), RedlineError> {
    let mut builder = Config::builder().address(&args.addr).database(args.db);
    if let Some(password) = args.password {
        builder = builder.password(password);
    }

    let client = Client::connect(builder.build())?;
    tracing::debug!("connected to {}", args.addr);

    match args.command {
        Commands::Get { key } => match client.get_str(&key).wait()? {
            Some(value) => println!("\"{}\"", value),
            None => println!("(nil)"),
        },
        Commands::Set { key, value } => println!("{}", client.set_str(&key, value).wait()?),
        Commands::Del { keys } => println!("(integer) {}", client.del_many(&keys).wait()?),
        Commands::Exists { key } => {
            let found = client.exists(&key).wait()?;
            println!("(integer) {}", i64::from(found));
        }
        Commands::Incr { key, by } => {
            let value = if by == 1 {
                client.incr(&key).wait()?
            } else {
                client.incr_by(&key, by).wait()?
            };
            println!("(integer) {}", value);
        }
        Commands::Ping => println!("{}", client.ping().wait()?),
        Commands::Echo { message } => println!("\"{}\"", client.echo(&message).wait()?),
    }

    client.close();
    Ok(())
}
