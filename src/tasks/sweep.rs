//! Rate Limit Sweep Task
//!
//! Background task that periodically removes ended rate-limit windows.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::ratelimit::WindowTable;

/// Spawns a background task that periodically drops ended windows.
///
/// The task sleeps for `interval` between runs and takes the table lock only
/// for the duration of one sweep. It exits on its own once the table has
/// been halted past `epoch`; aborting the handle stops it immediately.
///
/// # Arguments
/// * `table` - Window table shared with the limiter
/// * `clock` - Time source used to decide which windows have ended
/// * `interval` - Wall-clock time between sweeps
/// * `epoch` - Table epoch this sweep belongs to
pub fn spawn_sweep_task(
    table: Arc<WindowTable>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    epoch: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting rate limit sweep with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            match table.sweep(clock.now_ms(), epoch) {
                Some(0) => debug!("Rate limit sweep: no ended windows"),
                Some(removed) => info!("Rate limit sweep: removed {} ended windows", removed),
                None => {
                    debug!("Rate limit sweep halted");
                    break;
                }
            }
        }
    })
}
