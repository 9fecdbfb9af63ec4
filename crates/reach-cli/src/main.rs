use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reach_core::clock::SystemClock;
use reach_engine::config::load_config;
use reach_engine::query::QueryApi;
use reach_engine::store::{parse_retention, KvStore, Tsdb};

#[derive(Parser, Debug)]
#[command(name = "reachwatch", about = "Query tool for a running reachwatchd instance")]
struct Args {
    /// Path to the YAML config file the daemon is using.
    #[arg(short, long, default_value = "config/reachwatch.yaml", env = "REACHWATCH_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every configured host.
    Hosts,
    /// Current status and latest metrics for every host.
    Status,
    /// Historical metric series for a single host.
    History {
        host: String,
        /// How far back to look, in minutes.
        #[arg(long, default_value_t = 60)]
        minutes: i64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    let kv_path = PathBuf::from(&config.db.path).join("kv.sqlite3");
    let tsdb_path = PathBuf::from(&config.db.path).join("tsdb.sqlite3");
    let retention_ms = parse_retention(&config.db.retention)?;
    let kv = KvStore::open(&kv_path)?;
    let tsdb = Tsdb::open(&tsdb_path, retention_ms)?;
    let clock = SystemClock;
    let query = QueryApi::new(
        &kv,
        &tsdb,
        &clock,
        config.db.expire,
        config.effective_interval_secs() as i64,
    );

    match args.command {
        Commands::Hosts => {
            println!("Hosts");
            println!("══════════════════════════════");
            for host in query.list_hosts(&config.hosts) {
                println!("  {} — {}", host.address, host.description);
            }
        }
        Commands::Status => {
            println!("Host Status");
            println!("══════════════════════════════");
            for row in query.status_with_hosts(&config.hosts)? {
                println!(
                    "  {:<20} {:<10} min/avg/max={:.1}/{:.1}/{:.1}ms loss={:.1}%",
                    row.host, row.status, row.min_latency, row.avg_latency, row.max_latency, row.packet_loss
                );
            }
        }
        Commands::History { host, minutes } => {
            use reach_core::Clock;
            let now_ms = clock.now_ms();
            let start_ms = now_ms - minutes * 60 * 1000;
            let hosts: Vec<_> = config
                .hosts
                .iter()
                .filter(|h| h.address == host)
                .cloned()
                .collect();
            if hosts.is_empty() {
                anyhow::bail!("host {host} is not in the config");
            }
            println!("History for {host} (last {minutes}m)");
            println!("══════════════════════════════");
            for row in query.history_with_hosts(&hosts, start_ms, now_ms)? {
                for (metric, points) in &row.series {
                    println!("  [{metric}] {} points", points.len());
                    for point in points {
                        println!("    {} -> {:.2}", point.timestamp, point.value);
                    }
                }
            }
        }
    }

    Ok(())
}
