//! `occurrences`: interpret, expand and merge event recurrences from the shell.
//!
//! Every subcommand reads one event document (a stored recurrence descriptor,
//! optionally with the event's base display fields) from `--input` or stdin
//! and writes JSON to stdout. Logs go to stderr.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use occurrence_engine::{
    index_overrides, parse_date_key, BaseFields, Confidence, Diagnostic, EngineConfig,
    OccurrenceEngine, OccurrenceOverride, RawDescriptor, Recurrence, Window,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "occurrences", version, about = "Event recurrence interpreter and occurrence expander")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Event JSON file (reads stdin when omitted)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Engine configuration JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// IANA timezone, overriding the configuration
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Maximum occurrences per expansion, overriding the configuration
    #[arg(long, global = true)]
    cap: Option<usize>,

    /// Treat this date (YYYY-MM-DD) as today instead of reading the clock
    #[arg(long, global = true)]
    today: Option<String>,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the canonical recurrence, its label and any diagnostics
    Interpret,
    /// List occurrence dates in a window (default: today .. today + display_days)
    Expand {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Show the next occurrence on or after a date (default: today)
    Next {
        #[arg(long)]
        from: Option<String>,
    },
    /// Print the human-readable schedule label
    Label,
    /// Apply per-date overrides to generated occurrences
    Merge {
        /// JSON array of overrides
        #[arg(long)]
        overrides: PathBuf,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Resolve a single selected date instead of a window
        #[arg(long, conflicts_with_all = ["start", "end"])]
        date: Option<String>,
    },
}

/// A stored descriptor plus the event's display fields.
#[derive(Debug, Default, Deserialize)]
struct EventInput {
    #[serde(flatten)]
    descriptor: RawDescriptor,
    #[serde(default)]
    base: BaseFields,
}

#[derive(Debug, Serialize)]
struct InterpretOutput<'a> {
    recurrence: &'a Recurrence,
    label: String,
    confidence: Confidence,
    diagnostics: &'a [Diagnostic],
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let engine = OccurrenceEngine::new(load_config(&cli)?)?;
    let event = read_event(cli.input.as_deref())?;
    let interpretation = engine.interpret_raw(&event.descriptor);
    let recurrence = &interpretation.recurrence;
    let today = match cli.today.as_deref() {
        Some(key) => parse_key(key, "--today")?,
        None => engine.today(),
    };

    match &cli.command {
        Command::Interpret => print_json(&InterpretOutput {
            recurrence,
            label: engine.label(recurrence),
            confidence: interpretation.confidence(),
            diagnostics: &interpretation.diagnostics,
        }),
        Command::Expand { start, end } => {
            let window = window_for(&engine, today, start.as_deref(), end.as_deref())?;
            print_json(&engine.generate(recurrence, &window))
        }
        Command::Next { from } => {
            let reference = match from.as_deref() {
                Some(key) => parse_key(key, "--from")?,
                None => today,
            };
            let next = engine.next_occurrence(recurrence, reference);
            print_json(&serde_json::json!({
                "occurrence": next.occurrence(),
                "is_confident": next.is_confident(),
            }))
        }
        Command::Label => {
            println!("{}", engine.label(recurrence));
            Ok(())
        }
        Command::Merge {
            overrides,
            start,
            end,
            date,
        } => {
            let overrides = index_overrides(read_overrides(overrides)?);
            match date.as_deref() {
                Some(key) => {
                    let date = parse_key(key, "--date")?;
                    print_json(&engine.occurrence_on(recurrence, date, &overrides, &event.base))
                }
                None => {
                    let window = window_for(&engine, today, start.as_deref(), end.as_deref())?;
                    let generation = engine.generate(recurrence, &window);
                    print_json(&occurrence_engine::merge_overrides(
                        &generation.occurrences,
                        &overrides,
                        &event.base,
                    ))
                }
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_json_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(timezone) = &cli.timezone {
        config.timezone = timezone.clone();
    }
    if let Some(cap) = cli.cap {
        config.cap = cap;
    }
    tracing::debug!(timezone = %config.timezone, cap = config.cap, "engine configured");
    Ok(config)
}

fn read_event(path: Option<&Path>) -> Result<EventInput> {
    let text = match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading event from stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        return Ok(EventInput::default());
    }
    serde_json::from_str(&text).context("parsing event JSON")
}

fn read_overrides(path: &Path) -> Result<Vec<OccurrenceOverride>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing overrides {}", path.display()))
}

fn window_for(
    engine: &OccurrenceEngine,
    today: NaiveDate,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Window> {
    let start = match start {
        Some(key) => parse_key(key, "--start")?,
        None => today,
    };
    let window = match end {
        Some(key) => Window::new(start, parse_key(key, "--end")?)?,
        None => Window::starting_at(engine.calendar(), start, engine.config().display_days),
    };
    Ok(window)
}

fn parse_key(key: &str, flag: &str) -> Result<NaiveDate> {
    parse_date_key(key).with_context(|| format!("{flag} expects YYYY-MM-DD"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{json}");
    Ok(())
}
