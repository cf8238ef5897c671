//! forward-cli: 以限定频率批量抓取目标并逐行输出 JSON 结果
//!
//! Usage:
//!   forward-cli [--max-frequency F] [--max-attempts N] [--batch-size N] [--config FILE] [URL ...]
//!
//! With no URLs, targets are read from stdin, one per line.

use anyhow::{bail, Context};
use futures::StreamExt;
use rate_forwarder::{Forwarder, ForwarderConfig};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct CliArgs {
    max_frequency: Option<f64>,
    max_attempts: Option<u32>,
    batch_size: Option<usize>,
    config: Option<PathBuf>,
    targets: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("forward-cli {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let (forwarder, targets) = match parse_args(&args).and_then(prepare) {
        Ok(ready) => ready,
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(forwarder, targets).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    eprintln!(
        r#"forward-cli: rate-limited, retrying batch fetcher

USAGE:
    forward-cli [OPTIONS] [URL ...]

OPTIONS:
    --max-frequency <F>     Requests per second ceiling (0 = unlimited)
    --max-attempts <N>      Attempts per target (0 = unlimited)
    --batch-size <N>        Input targets per batch
    --config <FILE>         YAML/JSON config file
    -h, --help              Show this help message
    -V, --version           Show version information

With no URLs, targets are read from stdin (one per line, '#' comments skipped).

ENVIRONMENT:
    FORWARDER_MAX_FREQUENCY, FORWARDER_MAX_ATTEMPTS, FORWARDER_BATCH_SIZE
    FORWARDER_HTTP_TIMEOUT_SECS, FORWARDER_PROXY_URL
    RUST_LOG                    Log filter (default: info)"#
    );
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--max-frequency" => {
                let v = value(arg.as_str())?;
                parsed.max_frequency =
                    Some(v.parse().with_context(|| format!("invalid --max-frequency {v:?}"))?);
            }
            "--max-attempts" => {
                let v = value(arg.as_str())?;
                parsed.max_attempts =
                    Some(v.parse().with_context(|| format!("invalid --max-attempts {v:?}"))?);
            }
            "--batch-size" => {
                let v = value(arg.as_str())?;
                parsed.batch_size =
                    Some(v.parse().with_context(|| format!("invalid --batch-size {v:?}"))?);
            }
            "--config" => parsed.config = Some(PathBuf::from(value(arg.as_str())?)),
            flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
            target => parsed.targets.push(target.to_string()),
        }
    }
    Ok(parsed)
}

/// Resolve configuration (flags > file > env > defaults) and gather targets.
fn prepare(args: CliArgs) -> anyhow::Result<(Forwarder, Vec<String>)> {
    let mut config = ForwarderConfig::from_env()?;
    if let Some(path) = &args.config {
        config = config
            .overlay_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
    }
    if let Some(f) = args.max_frequency {
        config.max_frequency = f;
    }
    if let Some(n) = args.max_attempts {
        config.max_attempts = n;
    }
    if let Some(s) = args.batch_size {
        config.batch_size = s;
    }

    let targets = if args.targets.is_empty() {
        read_targets(std::io::stdin().lock())?
    } else {
        args.targets
    };
    Ok((Forwarder::new(config)?, targets))
}

fn read_targets(reader: impl BufRead) -> anyhow::Result<Vec<String>> {
    let mut targets = Vec::new();
    for line in reader.lines() {
        let line = line.context("reading targets from stdin")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        targets.push(trimmed.to_string());
    }
    Ok(targets)
}

async fn run(forwarder: Forwarder, targets: Vec<String>) -> anyhow::Result<()> {
    let stats = forwarder.stats();
    let mut batches = forwarder.collect_at_rate(targets);
    let stdout = std::io::stdout();

    while let Some(batch) = batches.next().await {
        let mut out = stdout.lock();
        for record in batch.iter() {
            writeln!(out, "{}", record.to_json())?;
        }
        out.flush()?;
        eprintln!(
            "batch {}: {} records, {} ok, {} failed, {} rounds, {:?}",
            batch.index,
            batch.len(),
            batch.success_count(),
            batch.failure_count(),
            batch.rounds,
            batch.elapsed
        );
    }

    let snap = stats.snapshot();
    eprintln!(
        "done: {} dispatched, {} succeeded, {} exhausted",
        snap.dispatched, snap.succeeded, snap.exhausted
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags_and_targets() {
        let parsed = parse_args(&args(&[
            "--max-frequency",
            "2.5",
            "https://a.example/1",
            "--batch-size",
            "4",
            "https://a.example/2",
        ]))
        .unwrap();
        assert_eq!(parsed.max_frequency, Some(2.5));
        assert_eq!(parsed.batch_size, Some(4));
        assert!(parsed.max_attempts.is_none());
        assert_eq!(parsed.targets.len(), 2);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(&args(&["--max-attempts"])).is_err());
        assert!(parse_args(&args(&["--max-attempts", "many"])).is_err());
        assert!(parse_args(&args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_read_targets_skips_blanks_and_comments() {
        let input = "https://a.example/1\n\n  # skipped\n  https://a.example/2  \n";
        let targets = read_targets(input.as_bytes()).unwrap();
        assert_eq!(targets, vec!["https://a.example/1", "https://a.example/2"]);
    }
}
