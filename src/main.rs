//! tracemap - streaming system-traceroute with per-hop geolocation.
//!
//! This is the command-line interface for the tracemap library.

use anyhow::Result;
use clap::Parser;
use std::collections::HashMap;
use std::time::Duration;
use tracemap::{
    EnrichmentResult, EnrichmentStatus, Hop, SessionStatus, TraceConfig, TraceController,
    TraceEvent,
};

/// Get the version string for tracemap
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments for the trace tool.
#[derive(Parser, Debug)]
#[clap(version = get_version(), about = "Streaming system traceroute with per-hop geolocation", long_about = None)]
struct Args {
    /// Target hostname or IPv4 address
    host: String,

    /// Maximum number of hops
    #[clap(short = 'm', long, default_value_t = 20)]
    max_hops: u32,

    /// Per-probe wait timeout in milliseconds
    #[clap(long, default_value_t = 1000)]
    probe_timeout_ms: u64,

    /// Disable geolocation enrichment
    #[clap(long)]
    no_geo: bool,

    /// Disable reverse DNS lookups
    #[clap(long)]
    no_rdns: bool,

    /// Output the final hop list in JSON format
    #[clap(long)]
    json: bool,

    /// Print progress messages to stderr
    #[clap(short, long)]
    verbose: bool,
}

/// JSON output structure for a single hop with merged enrichment
#[derive(Debug, serde::Serialize)]
struct JsonHop {
    hop: u32,
    host: String,
    ip: String,
    rtt_ms: f64,
    enrichment: Option<String>,
    country_code: Option<String>,
    country: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// JSON output structure for the whole session
#[derive(Debug, serde::Serialize)]
struct JsonOutput {
    version: String,
    target: String,
    status: String,
    hops: Vec<JsonHop>,
}

fn merge_json(
    target: &str,
    status: SessionStatus,
    hops: Vec<Hop>,
    enrichments: &HashMap<usize, EnrichmentResult>,
) -> JsonOutput {
    let hops = hops
        .into_iter()
        .enumerate()
        .map(|(index, hop)| {
            let result = enrichments.get(&index);
            let geo = result.and_then(|r| r.geo.as_ref());
            JsonHop {
                hop: hop.hop,
                host: hop.host,
                ip: hop.ip,
                rtt_ms: hop.rtt_ms,
                enrichment: result.map(|r| {
                    match r.status {
                        EnrichmentStatus::Success => "success",
                        EnrichmentStatus::Failed => "failed",
                    }
                    .to_string()
                }),
                country_code: geo.map(|g| g.country_code.clone()),
                country: geo.map(|g| g.country.clone()),
                city: geo.map(|g| g.city.clone()),
                lat: geo.map(|g| g.lat),
                lon: geo.map(|g| g.lon),
            }
        })
        .collect();

    JsonOutput {
        version: get_version().to_string(),
        target: target.to_string(),
        status: status.to_string(),
        hops,
    }
}

fn print_hop(hop: &Hop) {
    if hop.is_timeout() {
        println!("{:>3}  *", hop.hop);
    } else if hop.host == Hop::UNKNOWN_HOST {
        println!("{:>3}  {:>8.2} ms  {}", hop.hop, hop.rtt_ms, hop.ip);
    } else {
        println!(
            "{:>3}  {:>8.2} ms  {} ({})",
            hop.hop, hop.rtt_ms, hop.host, hop.ip
        );
    }
}

fn print_enrichment(hop: &Hop, result: &EnrichmentResult) {
    match &result.geo {
        Some(geo) => println!(
            "     hop {}: {}, {} [{}]",
            hop.hop, geo.city, geo.country, geo.country_code
        ),
        None => println!("     hop {}: location unknown", hop.hop),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TraceConfig::builder()
        .max_hops(args.max_hops)
        .probe_timeout(Duration::from_millis(args.probe_timeout_ms))
        .enable_geo(!args.no_geo)
        .enable_rdns(!args.no_rdns)
        .build()
        .map_err(|e| anyhow::anyhow!(e))?;

    let mut controller = TraceController::new();
    let mut handle = controller.start_trace(&args.host, config).await?;

    let mut seen: Vec<Hop> = Vec::new();
    let mut enrichments: HashMap<usize, EnrichmentResult> = HashMap::new();
    let mut final_hops: Vec<Hop> = Vec::new();
    let mut failure: Option<String> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("interrupted, cancelling trace...");
                controller.cancel_trace().await;
            }
            event = handle.next_event() => match event {
                Some(TraceEvent::Progress(message)) => {
                    if args.verbose {
                        eprintln!("{message}");
                    }
                }
                Some(TraceEvent::Hop(hop)) => {
                    if !args.json {
                        print_hop(&hop);
                    }
                    seen.push(hop);
                }
                Some(TraceEvent::Enrichment { hop_index, result }) => {
                    if !args.json {
                        if let Some(hop) = seen.get(hop_index) {
                            print_enrichment(hop, &result);
                        }
                    }
                    enrichments.insert(hop_index, result);
                }
                Some(TraceEvent::Error(message)) => {
                    failure = Some(message);
                }
                Some(TraceEvent::Completed(hops)) => {
                    final_hops = hops;
                }
                None => break,
            }
        }
    }

    if let Some(message) = failure {
        anyhow::bail!(message);
    }

    let status = handle.status();
    if args.json {
        let output = merge_json(&args.host, status, final_hops, &enrichments);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match status {
            SessionStatus::Cancelled => println!("trace cancelled"),
            _ => println!("{} hops, {}", final_hops.len(), status),
        }
    }

    Ok(())
}
