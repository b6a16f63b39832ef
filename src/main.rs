//! Voipprobe - active UDP voice-quality probe
//!
//! Entry point. `probe` mode drives the measurement loop against an echo
//! responder; `responder` mode runs the stateless echo service.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use voipprobe::metrics::codec;
use voipprobe::{ProbeConfig, ProbeSession, Responder};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("voipprobe=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let Some(mode) = args.get(1) else {
        print_help();
        return Ok(());
    };

    match mode.as_str() {
        "probe" => run_probe(&args[2..]),
        "responder" => run_responder(&args[2..]),
        "--list-codecs" | "-l" => {
            list_codecs();
            Ok(())
        }
        "--version" | "-v" => {
            println!("voipprobe {}", voipprobe::VERSION);
            Ok(())
        }
        "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown mode: {}", other);
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Usage: voipprobe <MODE> [OPTIONS]");
    println!();
    println!("Modes:");
    println!("  probe       Send timestamped probes and measure quality");
    println!("  responder   Echo incoming datagrams back to their sender");
    println!();
    println!("Probe options:");
    println!("  --host HOST           Responder host (default: 127.0.0.1)");
    println!("  --port PORT           Responder port (default: 5005)");
    println!("  --pps N               Probe rate in packets/sec (default: 50)");
    println!("  --duration SECS       Stop after SECS seconds (default: run until Ctrl+C)");
    println!("  --csv PATH            Append per-sample rows to a CSV file");
    println!("  --codec NAME          Codec profile for MOS (default: g711)");
    println!("  --burst R             E-model burst ratio (default: 1.0)");
    println!("  --warmup SECS         Withhold MOS for SECS seconds (default: 3)");
    println!("  --report-every SECS   Summary interval (default: 5)");
    println!("  --timeout-ms MS       Receive poll timeout (default: 200)");
    println!("  --config PATH         Load options from a JSON file (flags override)");
    println!();
    println!("Responder options:");
    println!("  --bind ADDR           Bind address (default: 0.0.0.0)");
    println!("  --port PORT           Bind port (default: 5005)");
    println!();
    println!("Other:");
    println!("  -l, --list-codecs     List known codec profiles");
    println!("  -v, --version         Show version");
    println!("  -h, --help            Show this help");
    println!();
    println!("Examples:");
    println!("  voipprobe responder --port 5005");
    println!("  voipprobe probe --host 1.2.3.4 --pps 50 --codec g711 --duration 60 --csv out.csv");
}

fn list_codecs() {
    println!("Known codec profiles:");
    for name in codec::codec_names() {
        let profile = codec::profile_for(name);
        println!("  {:<6} Ie={:<5} Bpl={}", name, profile.ie, profile.bpl);
    }
}

/// Install the Ctrl+C handler feeding the shared cancellation flag
fn cancel_flag() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let c = cancel.clone();
    ctrlc::set_handler(move || {
        c.store(true, Ordering::SeqCst);
    })
    .ok();
    cancel
}

fn run_probe(args: &[String]) -> Result<()> {
    // First pass: pick up --config so flags can override file values
    let mut config = match find_value(args, "--config") {
        Some(path) => ProbeConfig::load(&PathBuf::from(path)),
        None => ProbeConfig::default(),
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" => {
                i += 2;
                continue;
            }
            "--host" | "--port" | "--pps" | "--duration" | "--csv" | "--codec" | "--burst"
            | "--warmup" | "--report-every" | "--timeout-ms" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("Error: {} requires a value", flag);
                    return Ok(());
                };
                if !apply_flag(&mut config, flag, value) {
                    eprintln!("Error: invalid value for {}: {}", flag, value);
                    return Ok(());
                }
                i += 2;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                return Ok(());
            }
        }
    }

    let cancel = cancel_flag();
    let session = ProbeSession::new(config, cancel)?;
    let summary = session.run()?;

    println!();
    println!(
        "[probe] stopped after {:.1}s: sent={} recv={} loss_total={:.2}%",
        summary.elapsed.as_secs_f64(),
        summary.sent,
        summary.received,
        summary.cumulative_loss_pct
    );
    if let (Some(min), Some(max)) = (summary.min_rtt_ms, summary.max_rtt_ms) {
        println!(
            "[probe] rtt min/avg/max = {:.2}/{:.2}/{:.2} ms, jitter={:.2} ms",
            min, summary.mean_rtt_ms, max, summary.jitter_ms
        );
    }
    if let Some(est) = summary.mos {
        println!("[probe] mos~{:.2} (R={:.1})", est.mos, est.r_factor);
    }

    Ok(())
}

/// Apply one probe flag; false on an unparseable value
fn apply_flag(config: &mut ProbeConfig, flag: &str, value: &str) -> bool {
    match flag {
        "--host" => {
            config.host = value.to_string();
            true
        }
        "--port" => parse_into(value, |v| config.port = v),
        "--pps" => parse_into(value, |v| config.pps = v),
        "--duration" => parse_into(value, |v| config.duration_secs = Some(v)),
        "--csv" => {
            config.csv_path = Some(PathBuf::from(value));
            true
        }
        "--codec" => {
            config.codec = value.to_string();
            true
        }
        "--burst" => parse_into(value, |v| config.burst_r = v),
        "--warmup" => parse_into(value, |v| config.warmup_secs = v),
        "--report-every" => parse_into(value, |v| config.report_interval_secs = v),
        "--timeout-ms" => parse_into(value, |v| config.timeout_ms = v),
        _ => false,
    }
}

fn parse_into<T: std::str::FromStr>(value: &str, mut apply: impl FnMut(T)) -> bool {
    match value.parse() {
        Ok(v) => {
            apply(v);
            true
        }
        Err(_) => false,
    }
}

fn find_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn run_responder(args: &[String]) -> Result<()> {
    let mut bind = "0.0.0.0".to_string();
    let mut port = voipprobe::DEFAULT_PORT;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("Error: --bind requires a value");
                    return Ok(());
                };
                bind = value.clone();
                i += 2;
            }
            "--port" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("Error: --port requires a value");
                    return Ok(());
                };
                match value.parse() {
                    Ok(p) => port = p,
                    Err(_) => {
                        eprintln!("Error: invalid port: {}", value);
                        return Ok(());
                    }
                }
                i += 2;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                return Ok(());
            }
        }
    }

    let responder = Responder::bind(&bind, port)?;
    println!("[responder] listening on {}", responder.local_addr()?);
    println!("[responder] press Ctrl+C to stop");

    let cancel = cancel_flag();
    responder.run(cancel);

    info!("responder_shutdown");
    println!("[responder] shutting down");
    Ok(())
}
