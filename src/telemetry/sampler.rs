//! Periodic system sampling.
//!
//! # Responsibilities
//! - On a fixed cadence, reduce the recent request buffer into a
//!   `SystemSnapshot` and append it to the bounded history
//! - Exit cleanly when the shutdown signal fires
//!
//! # Design Decisions
//! - Background task, never request-driven; quiet periods still produce
//!   (empty) snapshots
//! - The immediate first tick is consumed so no snapshot exists until one
//!   full interval has passed; health reads report `unknown` until then

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::telemetry::recorder::TelemetryHub;

pub struct Sampler {
    hub: Arc<TelemetryHub>,
    interval: Duration,
}

impl Sampler {
    pub fn new(hub: Arc<TelemetryHub>, interval: Duration) -> Self {
        Self { hub, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "System sampler starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        // An interval's first tick completes immediately; consume it so the
        // first sample lands one full interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.hub.take_sample();
                    tracing::debug!(
                        requests_per_minute = snapshot.requests_per_minute,
                        avg_response_ms = snapshot.average_response_time_ms,
                        error_rate = snapshot.error_rate_percent,
                        "System snapshot taken"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("System sampler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelemetryConfig;
    use crate::lifecycle::Shutdown;

    #[tokio::test]
    async fn samples_on_cadence_and_stops_on_shutdown() {
        let hub = Arc::new(TelemetryHub::new(&TelemetryConfig {
            request_buffer_size: 10,
            snapshot_history_size: 10,
            sample_interval_secs: 60,
        }));
        let shutdown = Shutdown::new();
        let sampler = Sampler::new(hub.clone(), Duration::from_millis(30));
        let handle = tokio::spawn(sampler.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(hub.latest_snapshot().is_some(), "sampler should have ticked");

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sampler should exit on shutdown")
            .expect("sampler task should not panic");
    }

    #[tokio::test]
    async fn no_snapshot_before_first_interval() {
        let hub = Arc::new(TelemetryHub::new(&TelemetryConfig {
            request_buffer_size: 10,
            snapshot_history_size: 10,
            sample_interval_secs: 60,
        }));
        let shutdown = Shutdown::new();
        let sampler = Sampler::new(hub.clone(), Duration::from_secs(3600));
        let handle = tokio::spawn(sampler.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(hub.latest_snapshot().is_none());

        shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
    }
}
