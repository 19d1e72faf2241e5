use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::db::DbPool;
use crate::repo;

/// Runs one checkout sweep
///
/// ### Returns
///
/// The number of guests deactivated
#[instrument(skip(pool))]
pub async fn run_checkout_sweep(pool: Arc<DbPool>) -> anyhow::Result<usize> {
    let affected = tokio::task::spawn_blocking(move || repo::deactivate_checked_out_guests(&pool, Utc::now())).await??;
    Ok(affected)
}

/// Starts the background task that deactivates checked-out guests
///
/// The first sweep runs immediately, then once per `interval`. A failed
/// sweep is logged and retried on the next tick.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `interval` - Time between sweeps, must be non-zero
///
/// ### Returns
///
/// The handle of the spawned task; abort it to stop sweeping
pub fn start_checkout_scheduler(pool: Arc<DbPool>, interval: Duration) -> JoinHandle<()> {
    info!("Starting checkout scheduler, sweeping every {:?}", interval);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = run_checkout_sweep(pool.clone()).await {
                error!("Checkout sweep failed: {:#}", e);
            }
        }
    })
}
