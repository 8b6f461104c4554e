//! Solana keypair generation service
//!
//! Usage:
//!   sol_vanity_pool                                   # pumpfun=pump, letbonk=bonk on :3000
//!   sol_vanity_pool -t moon=moon -t sun=Sun -p 8080   # custom vanity targets
//!   DB_URL=sqlite:///var/lib/wallets sol_vanity_pool  # custom database directory

use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sol_vanity_pool::api::{self, AppState};
use sol_vanity_pool::{
    Config, Ed25519Generator, Error, GenerationScheduler, Inventory, SqliteInventory,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sol_vanity_pool=info")),
        )
        .init();

    let config = Config::parse();

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_count())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(config: Config) -> sol_vanity_pool::Result<()> {
    let location = config.store_location()?;
    let inventory: Arc<dyn Inventory> = Arc::new(SqliteInventory::open(&location)?);
    info!(store = %location, "connected to inventory");

    let categories = config.categories();
    for category in &categories {
        let available = inventory.available(category).await?;
        info!(category = %category, available, "inventory partition");
    }

    info!(
        workers = config.worker_count(),
        yield_every = config.yield_every,
        "starting wallet generation services"
    );
    let scheduler = GenerationScheduler::start(
        Arc::clone(&inventory),
        config.stream_specs(),
        Ed25519Generator,
        config.yield_every,
    );

    let stop = scheduler.stop_handle();
    ctrlc::set_handler(move || stop.stop())?;

    let listener = TcpListener::bind(config.listen_addr()).await?;
    let mut server = tokio::spawn(api::serve(
        listener,
        AppState::new(Arc::clone(&inventory), categories),
        scheduler.stop_signal(),
    ));

    // The server returns once the stop signal fires.
    let reporting = config.report_interval();
    let mut ticker = tokio::time::interval(reporting.unwrap_or(Duration::from_secs(3600)));
    ticker.tick().await;
    let served = loop {
        tokio::select! {
            result = &mut server => break result,
            _ = ticker.tick(), if reporting.is_some() => print_progress(&scheduler),
        }
    };

    if !scheduler.is_stopped() {
        error!("API server exited before shutdown was requested");
    }
    info!("shutting down, waiting for in-flight appends");
    let total_keys = scheduler.total_keys();
    let total_appended = scheduler.total_appended();
    let elapsed = scheduler.elapsed();
    let rate = scheduler.keys_per_second();
    scheduler.join().await;

    info!(
        keys = %format_number(total_keys),
        stored = total_appended,
        elapsed_secs = elapsed.as_secs(),
        rate = %format!("{}/s", format_number(rate as u64)),
        "final statistics"
    );

    served.map_err(|e| Error::Io(std::io::Error::other(e)))??;
    Ok(())
}

fn print_progress(scheduler: &GenerationScheduler) {
    for (category, stats) in scheduler.streams() {
        info!(
            category = %category,
            state = %stats.state(),
            keys = %format_number(stats.total_keys()),
            stored = stats.total_appended(),
            failures = stats.total_failures(),
            "stream progress"
        );
    }

    info!(
        elapsed_secs = scheduler.elapsed().as_secs(),
        keys = %format_number(scheduler.total_keys()),
        rate = %format!("{}/s", format_number(scheduler.keys_per_second() as u64)),
        "generation progress"
    );
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
