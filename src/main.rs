//! Lampctl — host entry point.
//!
//! Runs the controller against simulated outputs and a simulated sensor,
//! taking intents from stdin. Useful for exercising blink supervision and
//! the phrase tables without a board attached.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  stdin console (structured / free text)                  │
//! │            │                                             │
//! │            ▼                                             │
//! │  IntentExecutor ──▶ ActuatorRegistry ──▶ SimActuator × N │
//! │            │               │                             │
//! │            ▼               └──────────▶ SimClimateSensor │
//! │     LogEventSink                                         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Console syntax:
//!
//! - `<channel> <action> [interval=S] [times=N] [duration=S]`
//!   e.g. `red blink interval=0.2`, `all off`, `buzzer pulse duration=0.3`
//! - `say <free text>` e.g. `say turn on the blue light`
//! - `status`, `sensor`, `quit`
#![deny(unused_must_use)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use lampctl::adapters::log_sink::LogEventSink;
use lampctl::adapters::sim::SimActuator;
use lampctl::app::commands::IntentParams;
use lampctl::app::phrases::Locale;
use lampctl::app::ports::Actuator;
use lampctl::app::service::IntentResult;
use lampctl::config::SystemConfig;
use lampctl::drivers::channel::LedColour;
use lampctl::sensors::climate::SimClimateSensor;
use lampctl::{ActuatorRegistry, IntentExecutor};

#[derive(Parser)]
#[command(name = "lampctl")]
#[command(about = "Indicator light and buzzer controller (simulated outputs)", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Locale for free-text commands (en, es); overrides the config
    #[arg(long)]
    locale: Option<String>,
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lampctl=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    info!("lampctl v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config (file or defaults) ──────────────────────────
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => match SystemConfig::load(path) {
            Ok(config) => {
                info!("config loaded from {}", path.display());
                config
            }
            Err(e) => {
                warn!("config {}: {:#}; using defaults", path.display(), e);
                SystemConfig::default()
            }
        },
        None => {
            info!("no config file given, using defaults");
            SystemConfig::default()
        }
    };
    if let Some(code) = &cli.locale {
        match Locale::parse(code) {
            Some(locale) => config.locale = locale,
            None => warn!("unknown locale '{}', keeping {:?}", code, config.locale),
        }
    }

    // ── 3. Outputs and sensor ─────────────────────────────────
    let leds: Vec<(LedColour, Box<dyn Actuator>)> = config
        .leds
        .iter()
        .map(|led| {
            info!("{} LED on GPIO {} (simulated)", led.colour, led.gpio);
            let (act, _) = SimActuator::new(led.colour.as_str());
            (led.colour, Box::new(act) as Box<dyn Actuator>)
        })
        .collect();
    let (buzzer, _) = SimActuator::new("buzzer");
    let (sensor, _) = SimClimateSensor::new();

    let registry = ActuatorRegistry::new(
        leds,
        Box::new(buzzer),
        Box::new(sensor),
        Duration::from_millis(u64::from(config.cancel_timeout_ms)),
    )?;
    let executor = IntentExecutor::new(registry, config);
    let mut sink = LogEventSink::new();

    info!("ready; type 'quit' or send EOF to exit");

    // ── 4. Console loop ───────────────────────────────────────
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match handle_line(&executor, line, &mut sink, &mut out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => writeln!(out, "error: {e:#}")?,
        }
    }

    // ── 5. Shutdown ───────────────────────────────────────────
    executor.shutdown(&mut sink)?;
    Ok(())
}

/// Run one console line. Returns `false` when the user asked to quit.
fn handle_line(
    executor: &IntentExecutor,
    line: &str,
    sink: &mut LogEventSink,
    out: &mut impl Write,
) -> Result<bool> {
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match head.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return Ok(false),
        "status" => {
            writeln!(out, "{}", serde_json::to_string(&executor.snapshot())?)?;
        }
        "sensor" => {
            let result = executor.read_sensor(sink);
            writeln!(out, "{}", serde_json::to_string(&result)?)?;
        }
        "say" => {
            report(executor.execute_text(rest, sink), out)?;
        }
        channel => {
            let mut words = rest.split_whitespace();
            let Some(action) = words.next() else {
                bail!("usage: <channel> <action> [interval=S] [times=N] [duration=S]");
            };
            let params = parse_params(words)?;
            report(executor.execute_raw(channel, action, params, sink), out)?;
        }
    }
    Ok(true)
}

fn parse_params<'a>(words: impl Iterator<Item = &'a str>) -> Result<IntentParams> {
    let mut params = IntentParams::default();
    for word in words {
        let Some((key, value)) = word.split_once('=') else {
            bail!("expected key=value, got '{word}'");
        };
        match key {
            "interval" => params.interval = Some(value.parse().context("interval")?),
            "duration" => params.duration = Some(value.parse().context("duration")?),
            "times" => params.times = Some(value.parse().context("times")?),
            other => bail!("unknown parameter '{other}'"),
        }
    }
    Ok(params)
}

fn report(result: IntentResult, out: &mut impl Write) -> Result<()> {
    match result {
        Ok(snapshot) => writeln!(out, "ok {}", serde_json::to_string(&snapshot)?)?,
        Err(failure) => writeln!(
            out,
            "failed: {} {}",
            failure.error,
            serde_json::to_string(&failure.snapshot)?
        )?,
    }
    Ok(())
}
