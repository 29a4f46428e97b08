mod refresh;
mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tgtg_client::{Discovery, Location, TgtgClient};
use tgtg_core::ConfigOverrides;
use tgtg_notify::{IftttWebhook, Notifier};
use tracing_subscriber::EnvFilter;

use crate::store::SnapshotStore;

#[derive(Debug, Parser)]
#[command(name = "tgtg-watch")]
#[command(about = "Watch Too Good To Go for items coming back in stock")]
struct Cli {
    /// Longitude of the search origin.
    #[arg(long = "longitude", visible_alias = "lng", allow_negative_numbers = true)]
    longitude: Option<f64>,

    /// Latitude of the search origin.
    #[arg(long = "latitude", visible_alias = "lat", allow_negative_numbers = true)]
    latitude: Option<f64>,

    /// Search radius in kilometres.
    #[arg(short = 'r', long = "radius")]
    radius: Option<f64>,

    /// Minutes to sleep between refreshes.
    #[arg(short = 't', long = "timeout")]
    timeout: Option<u64>,

    /// Path of the JSON snapshot cache.
    #[arg(short = 'c', long = "cache")]
    cache: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            longitude: self.longitude,
            latitude: self.latitude,
            radius_km: self.radius,
            refresh_minutes: self.timeout,
            cache_path: self.cache.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = tgtg_core::load_app_config(&cli.overrides())?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let client = TgtgClient::with_base_url(
        &config.api_base_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?
    .with_retry(config.max_retries, config.retry_backoff_base_ms)
    .with_login_polling(
        Duration::from_secs(config.login_poll_secs),
        config.login_max_polls,
    );
    let location = Location {
        longitude: config.longitude,
        latitude: config.latitude,
        radius_km: config.radius_km,
    };
    let mut discovery = Discovery::new(client, config.credentials.clone(), location);

    let webhook = IftttWebhook::new(
        &config.webhook_base_url,
        &config.ifttt_event,
        &config.ifttt_key,
        config.request_timeout_secs,
    )?;
    let notifier = Notifier::start(
        Arc::new(webhook),
        Duration::from_millis(config.notify_interval_ms),
    );
    let store = SnapshotStore::new(config.cache_path.clone());
    tracing::info!(cache = %store.path().display(), "using snapshot cache");

    notifier.send_test();
    tracing::info!(
        "Notification sent. If you don't receive a notification within a minute, you may have misconfigured IFTTT."
    );

    let period = Duration::from_secs(config.refresh_minutes.saturating_mul(60));
    let outcome = tokio::select! {
        result = refresh::run_forever(&mut discovery, &store, &notifier, period) => result,
        () = shutdown_signal() => Ok(()),
    };

    notifier.flush().await;
    outcome?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, draining notifications");
}
