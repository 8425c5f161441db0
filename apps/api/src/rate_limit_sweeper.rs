use std::time::Duration;

use schedly_application::RateLimitService;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Background task that periodically drops expired rate limit counters.
pub struct RateLimitSweeper {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RateLimitSweeper {
    pub fn spawn(service: RateLimitService, interval: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(error) = service.cleanup().await {
                            tracing::warn!(error = %error, "rate limit sweep failed");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("rate limit sweeper stopped");
        });

        Self { shutdown, task }
    }

    /// Signals the loop to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(error) = self.task.await {
            tracing::warn!(error = %error, "rate limit sweeper task ended abnormally");
        }
    }
}
