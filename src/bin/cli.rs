//! PrefStore CLI
//!
//! Inspect and edit a preferences file from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use prefstore::storage::FileStore;
use prefstore::{Config, LoadMode, Preferences, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// PrefStore CLI
#[derive(Parser, Debug)]
#[command(name = "prefstore-cli")]
#[command(about = "Inspect and edit a PrefStore preferences file")]
#[command(version)]
struct Args {
    /// Preferences file
    #[arg(short, long, default_value = "./prefstore.prefs")]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every entry
    Dump,

    /// Print a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key to a value
    Set {
        /// The key to set
        key: String,

        /// The value to set (comma-separated for a set)
        value: String,

        /// How to interpret the value
        #[arg(short, long, value_enum, default_value = "string")]
        kind: Kind,
    },

    /// Delete a key
    Remove {
        /// The key to delete
        key: String,
    },

    /// Delete every key
    Clear,

    /// Report the file state without modifying it
    Check,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Bool,
    String,
    Int,
    Long,
    Float,
    Set,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,prefstore=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::builder()
        .path(&args.file)
        .load_mode(LoadMode::Inline)
        .worker_threads(1)
        .build();

    // Checking must not trigger recovery, so it bypasses the store
    if let Commands::Check = args.command {
        let result = FileStore::new(&config).verify()?;
        println!("backup present:   {}", result.backup_found);
        println!("snapshot missing: {}", result.file_missing);
        println!("entries:          {}", result.entries_loaded);
        return Ok(ExitCode::SUCCESS);
    }

    let prefs = Preferences::open(config)?;

    match args.command {
        Commands::Dump => {
            let mut entries: Vec<_> = prefs.get_all().into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, value) in entries {
                println!("{} ({}) = {}", key, value.kind(), value);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Get { key } => match prefs.get(&key) {
            Some(value) => {
                println!("{}", value);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("{}: not found", key);
                Ok(ExitCode::from(2))
            }
        },
        Commands::Set { key, value, kind } => {
            let value = parse_value(kind, &value)?;
            Ok(persisted(prefs.edit().put(key, value).commit()))
        }
        Commands::Remove { key } => Ok(persisted(prefs.edit().remove(key).commit())),
        Commands::Clear => Ok(persisted(prefs.edit().clear().commit())),
        Commands::Check => unreachable!("handled before opening the store"),
    }
}

fn parse_value(kind: Kind, raw: &str) -> Result<Value, String> {
    let value = match kind {
        Kind::Bool => Value::Bool(raw.parse().map_err(|e| format!("bad bool {:?}: {}", raw, e))?),
        Kind::String => Value::String(raw.to_string()),
        Kind::Int => Value::Int(raw.parse().map_err(|e| format!("bad int {:?}: {}", raw, e))?),
        Kind::Long => Value::Long(raw.parse().map_err(|e| format!("bad long {:?}: {}", raw, e))?),
        Kind::Float => {
            Value::Float(raw.parse().map_err(|e| format!("bad float {:?}: {}", raw, e))?)
        }
        Kind::Set => Value::StringSet(
            raw.split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
    };
    Ok(value)
}

fn persisted(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        eprintln!("write failed; see log output");
        ExitCode::FAILURE
    }
}
