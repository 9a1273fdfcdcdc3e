use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;
use tourtrack::domain::BatchOutcome;
use tourtrack::providers::{HttpLocator, HttpRewardPoints, HttpTripPricer, Locator, RewardPoints, RewardsService};
use tourtrack::registry::UserRegistry;
use tourtrack::service::{Collaborators, ServiceSettings, TourGuideService};

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tourtrack")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("tourtrack.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    let default_level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn build_service(config: &Config) -> Result<TourGuideService> {
    let timeout = config.services.request_timeout();

    let locator = Arc::new(HttpLocator::new(&config.services.gps_url, timeout)?);
    let reward_points: Arc<dyn RewardPoints> = Arc::new(HttpRewardPoints::new(&config.services.rewards_url, timeout)?);
    let trip_pricer = Arc::new(HttpTripPricer::new(&config.services.preferences_url, timeout)?);
    let scorer = RewardsService::new(reward_points.clone())
        .with_proximity_buffer(config.rewards.proximity_buffer_miles)
        .with_attraction_proximity_range(config.rewards.attraction_proximity_range_miles);

    // The catalog is fixed for the lifetime of the process
    let attractions = locator
        .fetch_attractions()
        .await
        .context(format!("Failed to load attractions from {}", locator.base_url()))?;
    info!("Loaded {} attractions", attractions.len());

    let registry = if config.internal_users.enabled {
        UserRegistry::with_internal_users(config.internal_users.count)
    } else {
        UserRegistry::new()
    };
    info!("Registry holds {} users", registry.len());

    let service = TourGuideService::new(
        Arc::new(registry),
        attractions,
        Collaborators {
            locator,
            scorer: Arc::new(scorer),
            reward_points,
            trip_pricer,
        },
        ServiceSettings {
            worker_count: config.tracker.worker_count,
            tracker: config.tracker.to_tracker_config(),
            trip_pricer_api_key: config.trip_pricer.api_key.clone(),
        },
    )?;
    Ok(service)
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let service = build_service(config).await.context("Failed to start tourtrack")?;

    match &cli.command {
        None | Some(Commands::Run) => handle_run_command(&service).await,
        Some(Commands::TrackOnce { budget_secs }) => {
            let budget = budget_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| service.tracker().config().batch_budget());
            handle_track_once_command(&service, budget).await
        }
        Some(Commands::Nearby { user }) => handle_nearby_command(&service, user).await,
    }
}

async fn handle_run_command(service: &TourGuideService) -> Result<()> {
    let tracker = service.tracker();
    tracker.start();
    println!(
        "{} {} users every {}s (Ctrl+C to stop)",
        "Tracking".green(),
        service.get_all_users().len(),
        tracker.config().interval.as_secs()
    );

    wait_for_shutdown().await?;

    println!("{}", "Stopping tracker...".cyan());
    tracker.stop().await;

    let stats = tracker.stats();
    println!("{} {} cycles", "Stopped after".green(), stats.cycles);
    if let Some(outcome) = stats.last_outcome {
        print_outcome(&outcome);
    }
    Ok(())
}

async fn handle_track_once_command(service: &TourGuideService, budget: Duration) -> Result<()> {
    info!("Running a single batch with budget {:?}", budget);
    let outcome = service.track_all_users(budget).await;
    print_outcome(&outcome);
    Ok(())
}

async fn handle_nearby_command(service: &TourGuideService, user_name: &str) -> Result<()> {
    let user = service.get_user(user_name)?;
    let nearby = service.get_nearby_attractions(&user).await?;

    println!("{} {}", "Nearest attractions for".green(), user_name.bold());
    for (i, attraction) in nearby.iter().enumerate() {
        println!(
            "  {}. {} - {:.1} mi, {} points",
            i + 1,
            attraction.attraction_name,
            attraction.distance,
            attraction.reward_points
        );
    }
    Ok(())
}

fn print_outcome(outcome: &BatchOutcome) {
    println!(
        "  dispatched {}, {} succeeded, {} partial, {} failed, {} timed out, {} skipped in {:.2?}",
        outcome.dispatched,
        outcome.succeeded.to_string().green(),
        outcome.partial.to_string().yellow(),
        outcome.failed.to_string().red(),
        outcome.timed_out.to_string().red(),
        outcome.skipped,
        outcome.elapsed
    );
    if !outcome.within_budget {
        println!("  {}", "Batch exceeded its budget".yellow());
    }
}

/// Resolve on SIGINT or SIGTERM
async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.context("Failed to install Ctrl+C handler")?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
