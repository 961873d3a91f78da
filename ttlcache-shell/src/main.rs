mod command;

use command::Command;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ttlcache_core::{Store, StoreConfig};

const PROMPT: &str = "ttlcache> ";

/// Reads a duration from the environment, falling back to `default`
fn env_duration(name: &str, default: &str) -> anyhow::Result<Duration> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    command::parse_duration(&raw).map_err(|e| anyhow::anyhow!("{}: {}", name, e))
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(PROMPT.as_bytes())?;
    stdout.flush()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttlcache_shell=info,ttlcache_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Configuration from environment variables
    let default_ttl = env_duration("TTLCACHE_DEFAULT_TTL", "30m")?;
    let sweep_interval = env_duration("TTLCACHE_SWEEP_INTERVAL", "3s")?;
    let snapshot = std::env::var("TTLCACHE_SNAPSHOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("ttlcache.snapshot.json"));
    let autosave = std::env::var("TTLCACHE_AUTOSAVE").is_ok_and(|v| v == "1" || v == "true");

    let mut config = StoreConfig::default()
        .with_default_ttl(default_ttl)
        .with_sweep_interval(sweep_interval);
    if autosave {
        config = config.with_autosave(&snapshot);
    }
    let store = Store::with_config(config);

    tracing::info!("ttlcache shell starting");
    tracing::info!("   Default TTL: {:?}", default_ttl);
    tracing::info!("   Sweep interval: {:?}", sweep_interval);
    tracing::info!("   Snapshot: {} (autosave: {})", snapshot.display(), autosave);

    if snapshot.exists() {
        match store.load_file(&snapshot) {
            Ok(merged) => tracing::info!("Restored {} entries", merged),
            Err(e) => tracing::warn!("Could not restore snapshot: {}", e),
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(cmd) => match command::dispatch(&store, cmd, &snapshot).await {
                Ok(output) if output.is_empty() => {}
                Ok(output) => println!("{}", output),
                Err(e) => println!("(error) {}", e),
            },
            Err(e) => println!("(error) {}", e),
        }
    }

    store.stop_sweeper();
    println!("Bye.");
    Ok(())
}
