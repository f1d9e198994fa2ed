use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use port_scan_rs::types::{ScanConfig, ScanOutcome};
use port_scan_rs::{ports, scanner};

use anyhow::{Context, Result};
use clap::Parser;

/// port-scan-rs — Concurrent TCP connect port scanner with optional banner grabbing.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "port-scan-rs",
    version,
    about = "Concurrent TCP connect port scanner with optional banner grabbing.",
    long_about = None
)]
struct Cli {
    /// Target host or IP address.
    #[arg(long)]
    host: String,

    /// Ports to scan (e.g., '80', '1-1000', '22,80,443').
    #[arg(short = 'p', long)]
    ports: String,

    /// Per-probe timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 500)]
    timeout_ms: u64,

    /// Limit of concurrently running probes (0 = unbounded).
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Collect banners from open ports.
    #[arg(long, default_value_t = false)]
    banner: bool,

    /// Write open-port results as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let port_list = ports::parse_ports(&cli.ports)
        .with_context(|| format!("failed to parse port specification: {}", cli.ports))?;

    let config = ScanConfig {
        host: cli.host,
        ports: port_list,
        timeout: Duration::from_millis(cli.timeout_ms),
        concurrency: cli.workers,
        grab_banner: cli.banner,
    };

    let results = scanner::scan(&config).await;

    for outcome in &results {
        if cli.banner && !outcome.banner.is_empty() {
            println!(
                "{}/tcp open {} {}",
                outcome.port, outcome.service, outcome.banner
            );
        } else {
            println!("{}/tcp open", outcome.port);
        }
    }

    if let Some(path) = cli.output.as_deref() {
        write_results_json(path, &results)
            .with_context(|| format!("failed to write JSON to {}", path.display()))?;
        eprintln!("Wrote JSON results to {}", path.display());
    }

    Ok(())
}

fn write_results_json(path: &std::path::Path, results: &[ScanOutcome]) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}
