//! Decodes a patchwire message and prints it as JSON.
//!
//! ```text
//! patchwire-dump patch frame.bin
//! RUST_LOG=debug patchwire-dump node - < initial.bin
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use patchwire::{Config, RenderError};
use patchwire_protocol::{decode_message, EventRecord, Node, PatchNode};
use serde::Serialize;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    /// Initial tree (`Node`).
    Node,
    /// Incremental patch (`PatchNode`).
    Patch,
    /// Outbound event record.
    Event,
}

#[derive(Parser)]
#[command(name = "patchwire-dump", about = "Decode a patchwire message to JSON")]
struct Args {
    /// Message grammar to decode with.
    kind: Kind,
    /// Input file, or `-` for stdin.
    input: PathBuf,
    /// JSON config; only `maxMessageLen` is used.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print compact JSON.
    #[arg(long)]
    compact: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!("{message}");
            eprintln!("patchwire-dump: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String, String> {
    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
            Config::from_json(&text).map_err(|e| e.to_string())?
        }
        None => Config::default(),
    };
    let bytes = read_input(&args.input).map_err(|e| format!("{}: {e}", args.input.display()))?;
    debug!(len = bytes.len(), kind = ?args.kind, "decoding");
    if bytes.len() > config.max_message_len {
        let err = RenderError::MessageTooLarge {
            len: bytes.len(),
            max: config.max_message_len,
        };
        return Err(describe(&err));
    }
    match args.kind {
        Kind::Node => render::<Node>(&bytes, args.compact),
        Kind::Patch => render::<PatchNode>(&bytes, args.compact),
        Kind::Event => render::<EventRecord>(&bytes, args.compact),
    }
}

fn render<T>(bytes: &[u8], compact: bool) -> Result<String, String>
where
    T: patchwire_protocol::Decode + Serialize,
{
    let value: T = decode_message(bytes).map_err(|e| describe(&RenderError::from(e)))?;
    let json = if compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    };
    json.map_err(|e| e.to_string())
}

fn describe(err: &RenderError) -> String {
    format!("{:?} error: {err}", err.class())
}

fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(path)
    }
}
