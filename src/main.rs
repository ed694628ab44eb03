use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use downlink::{default_registry, Message};

#[derive(Parser)]
#[command(name = "downlink")]
#[command(about = "Decode ACARS messages into structured JSON records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode messages from a file or stdin, one JSON result per line
    ///
    /// Input lines are either a JSON message object ({"id":..,"label":..,
    /// "text":..}) or the shorthand `LABEL<TAB>TEXT`.
    Decode {
        /// Read from this file instead of stdin
        #[arg(long)]
        file: Option<String>,
        /// Only decode messages carrying this label
        #[arg(long)]
        label: Option<String>,
        /// Collect results from every matching decoder instead of the first
        #[arg(long)]
        all: bool,
    },
    /// Decode the built-in demonstration messages
    Sample,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Decode { file, label, all } => decode_stream(file, label, all),
        Commands::Sample => run_sample(),
    }
}

fn decode_stream(file: Option<String>, label_filter: Option<String>, all: bool) -> Result<()> {
    let reader: Box<dyn BufRead> = match file {
        Some(path) => {
            let f = File::open(&path).with_context(|| format!("failed to open {path}"))?;
            Box::new(BufReader::new(f))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let registry = default_registry();
    let mut total = 0u64;
    let mut decoded_count = 0u64;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input line")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let msg = match parse_input_line(line, line_no as i64 + 1) {
            Some(msg) => msg,
            None => {
                debug!(line_no, "skipping unparseable input line");
                continue;
            }
        };
        if let Some(ref wanted) = label_filter {
            if msg.label != *wanted {
                continue;
            }
        }
        total += 1;

        if all {
            for result in registry.dispatch_all(&msg) {
                print_result(&result)?;
                decoded_count += 1;
            }
        } else if let Some(result) = registry.dispatch_first(&msg) {
            print_result(&result)?;
            decoded_count += 1;
        }
    }

    info!(total, decoded = decoded_count, "finished decoding");
    Ok(())
}

/// A line is either a JSON message object or `LABEL<TAB>TEXT` shorthand.
fn parse_input_line(line: &str, fallback_id: i64) -> Option<Message> {
    if line.starts_with('{') {
        return serde_json::from_str(line).ok();
    }
    let (label, text) = line.split_once('\t')?;
    Some(Message::new(fallback_id, label.trim(), text))
}

fn print_result(result: &downlink::Decoded) -> Result<()> {
    let mut value = serde_json::to_value(result).context("failed to serialise result")?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "decoded_at".to_string(),
            serde_json::Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }
    println!("{value}");
    Ok(())
}

fn run_sample() -> Result<()> {
    let samples: &[(&str, &str)] = &[
        (
            "27",
            "POS01AFL1866 /16180720UUEEUDYZ FUEL 140 TEMP- 32 WDIR26631 WSPD 36 LATN 55.164 LONE 38.545 ETA1013 TUR ALT 21728",
        ),
        (
            "15",
            "FST01EGLLWSSSN452140E0249275330 854 242 M54C 6235410711950911600009590004",
        ),
        (
            "16",
            r"BEGLA  ,N 47.555,E 18.028,40025,490,1934,030\TS180357,311225",
        ),
        (
            "B6",
            "/NYCODYA.ADS.C-FGDT070EF0E6A6C28908B7001F0D0CCCCEB05B090885A90B1F6EB5060908800E35F0FE3FFC0F3749A33FFC0258",
        ),
        (
            "H1",
            "FPN/RI:DA:KDFW:AA:KLAS:CR:DFWLAS01:F:TRISS..N31490E035327..BLD",
        ),
        ("ZZ", "UNKNOWN DIALECT, ENVELOPE CATCHES IT"),
    ];

    let registry = default_registry();
    for (i, (label, text)) in samples.iter().enumerate() {
        let msg = Message::new(i as i64 + 1, *label, *text);
        if let Some(result) = registry.dispatch_first(&msg) {
            print_result(&result)?;
        }
    }
    Ok(())
}
