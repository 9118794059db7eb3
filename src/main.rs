use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use lotofacil_client::{AppConfig, server::HttpServer};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("lotofacil")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lotofácil results mirror")
        .subcommand(Command::new("serve").about("Serve the HTTP API (default)"))
        .subcommand(Command::new("sync").about("Run one synchronization and exit"))
        .subcommand(Command::new("config-check").about("Check configuration and exit"))
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(clap::ArgAction::Count)
                .help("Set verbose output level"),
        )
        .get_matches();

    lotofacil_client::setup(log_level(&matches));

    let config = AppConfig::from_env()?;

    match matches.subcommand_name() {
        Some("sync") => sync_once(&config).await,
        Some("config-check") => config_check(&config),
        _ => serve(&config).await,
    }
}

/// Without `-v` the `RUST_LOG` filter is left alone
fn log_level(matches: &ArgMatches) -> Option<log::LevelFilter> {
    match matches.get_count("verbose") {
        0 => None,
        1 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

async fn serve(config: &AppConfig) -> Result<()> {
    let store = config.open_datastore()?;
    let synchronizer = config.build_synchronizer(store.clone())?;
    let server = HttpServer::new(store, synchronizer, &config.http);

    server
        .serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
            log::info!("Shutdown signal received");
        })
        .await
}

async fn sync_once(config: &AppConfig) -> Result<()> {
    let store = config.open_datastore()?;
    let synchronizer = config.build_synchronizer(store.clone())?;

    let summary = synchronizer.sync().await?;
    log::info!(
        "{}: {} added, last known draw {}",
        summary.message,
        summary.records_added,
        summary.last_known_draw
    );

    for result in &summary.results {
        match store.get_draw(result.draw_number)? {
            Some(draw) => println!("{draw}"),
            None => println!("{} {:?}", result.draw_number, result.outcome),
        }
    }

    let missing: Vec<i64> = summary.missing().collect();
    if !missing.is_empty() {
        log::warn!("Still missing: {missing:?}");
    }
    Ok(())
}

fn config_check(config: &AppConfig) -> Result<()> {
    log::info!("Checking configuration...");

    let store = config.open_datastore()?;
    log::info!("Database: OK ({} draws stored)", store.count_draws()?);

    config.build_synchronizer(store)?;
    log::info!("Provider {}: OK", config.provider);

    log::info!("HTTP server will listen on {}", config.http.socket_addr());
    Ok(())
}
