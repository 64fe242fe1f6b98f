// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! onvif-discovery-dump - Probe for ONVIF cameras
//!
//! Sends a WS-Discovery probe, lists every device that answers and,
//! given credentials, asks each one for its identity and stream URIs.

use clap::Parser;
use colored::*;
use onvif::services::{DeviceInformation, TransportProtocol};
use onvif::{discover_with, Camera, ClientConfig, DeviceDescriptor, DiscoveryConfig};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Probe the local network for ONVIF cameras
#[derive(Parser, Debug)]
#[command(name = "onvif-discovery-dump")]
#[command(version = "0.1.0")]
#[command(about = "Dump ONVIF devices found by WS-Discovery")]
struct Args {
    /// Listening window in seconds
    #[arg(long, default_value = "3")]
    timeout: u64,

    /// Local IPv4 address to bind (0.0.0.0 = all interfaces)
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Send the probe to this address instead of the multicast group
    #[arg(long)]
    target: Option<SocketAddr>,

    /// Probe types filter
    #[arg(long, default_value = "wsdp:Device")]
    types: String,

    /// Re-send the probe every N milliseconds within the window
    #[arg(long)]
    reprobe: Option<u64>,

    /// Username for querying each device
    #[arg(short, long)]
    user: Option<String>,

    /// Password for querying each device
    #[arg(short, long, default_value = "")]
    password: String,

    /// Output format: pretty, json
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Continuous monitoring mode (re-probe every N seconds)
    #[arg(short = 'w', long)]
    watch: Option<u64>,

    /// Quiet mode - compact output
    #[arg(long)]
    quiet: bool,

    /// Log protocol traffic (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(OutputFormat::Pretty),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// What one device told us beyond its probe match.
#[derive(Debug, Default)]
struct Details {
    information: Option<DeviceInformation>,
    streams: Vec<(String, String)>,
    error: Option<String>,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "onvif=debug",
        _ => "onvif=trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = discovery_config(args);

    if !args.quiet {
        eprintln!(
            "{} ONVIF discovery (bind={}, target={})",
            ">>>".green().bold(),
            args.bind,
            config.target
        );
    }

    if let Some(interval) = watch_interval(args) {
        // Only watch mode traps Ctrl+C; one-shot runs keep the default SIGINT.
        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })?;

        while running.load(Ordering::SeqCst) {
            print!("\x1B[2J\x1B[1;1H"); // Clear screen
            dump(&config, args)?;
            std::thread::sleep(interval);
        }
    } else {
        dump(&config, args)?;
    }

    Ok(())
}

/// Environment defaults (`ONVIF_REPROBE_MS`, `ONVIF_MULTICAST_IF`), then flags.
fn discovery_config(args: &Args) -> DiscoveryConfig {
    let mut config = DiscoveryConfig::from_env()
        .with_timeout(Duration::from_secs(args.timeout))
        .with_bind_address(args.bind.as_str())
        .with_probe_types(args.types.as_str());
    if let Some(target) = args.target {
        config = config.with_target(target);
    }
    if let Some(ms) = args.reprobe {
        config = config.with_reprobe_interval(Duration::from_millis(ms.max(1)));
    }
    config
}

/// Refresh period in watch mode; `None` for a one-shot dump.
fn watch_interval(args: &Args) -> Option<Duration> {
    args.watch.map(|secs| Duration::from_secs(secs.max(1)))
}

fn dump(config: &DiscoveryConfig, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if !args.quiet {
        eprintln!(
            "{}",
            format!("    Listening for {} seconds...", args.timeout).dimmed()
        );
    }

    let devices = discover_with(config)?;
    let details: Vec<Details> = devices.iter().map(|d| query(d, args)).collect();

    match args.format {
        OutputFormat::Pretty => print_pretty(&devices, &details, args),
        OutputFormat::Json => print_json(&devices, &details)?,
    }
    Ok(())
}

fn query(device: &DeviceDescriptor, args: &Args) -> Details {
    let Some(user) = args.user.as_deref() else {
        return Details::default();
    };
    let config = ClientConfig::with_credentials(user, args.password.as_str());

    let mut details = Details::default();
    if let Err(e) = query_into(device, config, &mut details) {
        log::debug!("query {} failed: {}", device.address, e);
        details.error = Some(e.to_string());
    }
    details
}

fn query_into(
    device: &DeviceDescriptor,
    config: ClientConfig,
    details: &mut Details,
) -> onvif::Result<()> {
    let mut camera = Camera::from_descriptor(device, config)?;
    camera.sync_clock()?;
    camera.resolve_services()?;

    details.information = Some(camera.device().get_device_information()?);
    for profile in camera.media().get_profiles()? {
        let uri = camera
            .media()
            .get_stream_uri(&profile.token, TransportProtocol::Rtsp)?;
        details.streams.push((profile.name, uri.uri));
    }
    Ok(())
}

fn print_pretty(devices: &[DeviceDescriptor], details: &[Details], args: &Args) {
    println!();
    println!("{}", "=== ONVIF Devices ===".bold());
    println!();
    println!(
        "{} {} device(s) discovered",
        "Devices:".cyan().bold(),
        devices.len()
    );
    println!();

    for (i, (d, extra)) in devices.iter().zip(details).enumerate() {
        let name = d.name().unwrap_or("-");

        if args.quiet {
            println!("  [{}] {}:{} {}", i + 1, d.address, d.port, name);
            continue;
        }

        println!(
            "  {} {} {}",
            format!("[{}]", i + 1).yellow(),
            format!("{}:{}", d.address, d.port).green(),
            name.white().bold()
        );
        if let Some(hw) = d.hardware() {
            println!("      Hardware: {}", hw);
        }
        if let Some(loc) = d.location() {
            println!("      Location: {}", loc);
        }
        println!("      XAddrs: {}", d.service_addresses.join(" "));
        println!("      Types: {}", d.types.join(" ").dimmed());
        for scope in &d.scopes {
            println!("      Scope: {}", scope.to_string().dimmed());
        }

        if let Some(info) = &extra.information {
            println!(
                "      Device: {} {} (fw {}, s/n {})",
                info.manufacturer, info.model, info.firmware_version, info.serial_number
            );
        }
        for (profile, uri) in &extra.streams {
            println!("        {} {} -> {}", "S".blue(), profile, uri);
        }
        if let Some(err) = &extra.error {
            println!("      {} {}", "Query failed:".red(), err);
        }
        println!();
    }

    println!("{}", "--- Summary ---".dimmed());
    let queried = details.iter().filter(|d| d.information.is_some()).count();
    println!(
        "  Devices: {}  Queried: {}",
        devices.len().to_string().white(),
        queried.to_string().green()
    );
    println!();
}

fn print_json(
    devices: &[DeviceDescriptor],
    details: &[Details],
) -> Result<(), Box<dyn std::error::Error>> {
    let entries: Vec<serde_json::Value> = devices
        .iter()
        .zip(details)
        .map(|(d, extra)| {
            let mut entry = serde_json::to_value(d)?;
            if let Some(obj) = entry.as_object_mut() {
                if let Some(info) = &extra.information {
                    obj.insert("information".into(), serde_json::to_value(info)?);
                }
                if !extra.streams.is_empty() {
                    let streams: serde_json::Map<String, serde_json::Value> = extra
                        .streams
                        .iter()
                        .map(|(p, u)| (p.clone(), serde_json::Value::String(u.clone())))
                        .collect();
                    obj.insert("streams".into(), serde_json::Value::Object(streams));
                }
                if let Some(err) = &extra.error {
                    obj.insert("error".into(), serde_json::Value::String(err.clone()));
                }
            }
            Ok(entry)
        })
        .collect::<Result<_, serde_json::Error>>()?;

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
