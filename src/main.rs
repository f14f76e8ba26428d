use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crypto_tracker::{api, Config, FetchRequest, Tracker, TrackerResponse};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "crypto-tracker")]
#[command(about = "Concurrent crypto price and history lookups")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "LISTEN_ADDR")]
        listen: Option<SocketAddr>,
    },
    /// Fetch once and print a table
    Fetch {
        /// Comma-separated coin ids, e.g. bitcoin,ethereum
        ids: String,

        /// One of 24h, 7d, 30d, 1y
        #[arg(short, long, default_value = "24h")]
        range: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crypto_tracker=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    let tracker = Tracker::new(&config)?;

    match args.command {
        Command::Serve { listen } => {
            let addr = listen.unwrap_or(config.listen_addr);
            tracing::info!("Upstream: {} ({})", config.api_url, config.quote_currency);
            tracing::info!("Concurrency: {}, timeout: {:?}", config.concurrency, config.timeout);
            api::start_server(tracker, addr).await
        }
        Command::Fetch { ids, range } => {
            let request = FetchRequest::parse(&ids, Some(range.as_str()));
            let response = tracker
                .track(request, &CancellationToken::new())
                .await
                .context("fetch failed")?;
            print_table(&response, &config.quote_currency);
            Ok(())
        }
    }
}

fn print_table(response: &TrackerResponse, currency: &str) {
    let price_header = format!("Price({})", currency.to_uppercase());
    let change_header = format!("{}%", response.time_range.as_str());

    println!("{:<20} {:<8} {:>16} {:>20} {:>18} {:>10}", "Name", "Symbol", price_header, "MktCap", "Volume", change_header);
    println!("{}", "-".repeat(97));
    for q in &response.crypto_data {
        println!(
            "{:<20} {:<8} {:>16} {:>20} {:>18} {:>10}",
            q.name,
            q.symbol.to_uppercase(),
            format!("{:.2}", q.current_price),
            q.market_cap.map(|x| format!("{:.0}", x)).unwrap_or_else(|| "-".into()),
            q.total_volume.map(|x| format!("{:.0}", x)).unwrap_or_else(|| "-".into()),
            q.change_pct().map(|x| format!("{:+.2}", x)).unwrap_or_else(|| "-".into()),
        );
    }

    let failures: Vec<_> = response.failures().collect();
    if !failures.is_empty() {
        println!("\nFailed lookups:");
        for f in failures {
            println!(
                "  {:<20} {:?}: {}",
                f.id,
                f.phase,
                f.reason.as_deref().unwrap_or("unknown")
            );
        }
    }
}
