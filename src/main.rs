//! # Tello Link
//!
//! Replays a capture of inbound Tello datagrams and writes the decoded
//! flight status and log telemetry to a file.
//!
//! ```bash
//! tello-link capture.bin [config.toml]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tello_link::capture::{read_capture, split_datagrams, Replay, ReplayEvent, ReplayStats};
use tello_link::config::{Config, LoggingConfig};
use tello_link::protocol::log_data::LogData;
use tello_link::telemetry::TelemetryWriter;

/// Number of packets between progress log messages
const LOG_INTERVAL_PACKETS: u64 = 1000;

/// Replay a Tello capture and write the decoded telemetry
#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "tello-link")]
#[command(version, about, long_about = None)]
struct Args {
    /// Capture file of concatenated inbound packets
    capture: PathBuf,

    /// TOML configuration file (built-in defaults when omitted)
    config: Option<PathBuf>,
}

/// Set up console logging, plus a non-blocking file writer when configured
///
/// The returned guard must be kept alive for file logs to be flushed.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level: tracing::Level = config
        .level
        .parse()
        .with_context(|| format!("invalid log level: {}", config.level))?;

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let (file_layer, guard) = match &config.file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().context("log file must name a file")?;

            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Decode every packet in the capture and write the results
async fn replay_capture(args: &Args, config: &Config) -> Result<ReplayStats> {
    let data = read_capture(&args.capture).await?;
    let packets = split_datagrams(&data)?;
    info!("Replaying {} packets", packets.len());

    let file = File::create(&config.output.path)
        .with_context(|| format!("failed to create {}", config.output.path))?;
    let mut writer = TelemetryWriter::new(BufWriter::new(file), config.output.format);

    let log = LogData::new().verify_checksums(config.demux.verify_checksums);
    let mut replay = Replay::new(log);

    for (index, packet) in packets.iter().enumerate() {
        match replay.handle(packet) {
            Ok(ReplayEvent::Flight(status)) => writer.write_flight_status(&status)?,
            Ok(ReplayEvent::Log(samples)) => writer.write_log_update(replay.log(), &samples)?,
            Ok(ReplayEvent::Ignored(_)) => {}
            Err(e) => warn!("Packet {}: {}", index, e),
        }

        let handled = index as u64 + 1;
        if handled % LOG_INTERVAL_PACKETS == 0 {
            info!("Replayed {} packets, {} records written", handled, writer.records_written());
            tokio::task::yield_now().await;
        }
    }

    writer.flush()?;
    debug!("Last telemetry: {}", replay.log());
    info!(
        "Wrote {} {} records to {}",
        writer.records_written(),
        config.output.format,
        config.output.path
    );

    Ok(replay.stats())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let _guard = init_logging(&config.logging)?;
    info!("Tello Link v{} starting...", env!("CARGO_PKG_VERSION"));

    tokio::select! {
        result = replay_capture(&args, &config) => {
            let stats = result?;
            info!(
                "Done: {} packets ({} flight, {} log, {} ignored)",
                stats.packets, stats.flight, stats.log_data, stats.ignored
            );
        }

        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_capture_only() {
        let args = Args::try_parse_from(["tello-link", "capture.bin"]).unwrap();
        assert_eq!(args.capture, PathBuf::from("capture.bin"));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_with_config() {
        let args = Args::try_parse_from(["tello-link", "capture.bin", "tello.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("tello.toml")));
    }

    #[test]
    fn test_args_rejects_missing_and_extra() {
        assert!(Args::try_parse_from(["tello-link"]).is_err());
        assert!(Args::try_parse_from(["tello-link", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_log_interval_constant() {
        assert_eq!(LOG_INTERVAL_PACKETS, 1000);
    }
}
