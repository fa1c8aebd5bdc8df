//! Periodic maintenance jobs.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use reelhouse_common::{AppResult, config::SchedulerConfig};
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Work the scheduler drives.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Complete scheduled events whose start has passed. Returns how many.
    async fn conclude_expired_events(&self) -> AppResult<usize>;

    /// Drop expired sessions. Returns how many.
    async fn purge_expired_sessions(&self) -> AppResult<usize>;
}

/// Spawn one task per job. Returns nothing when the scheduler is disabled.
pub fn run_scheduler<E: JobExecutor + 'static>(
    config: &SchedulerConfig,
    executor: Arc<E>,
) -> Vec<JoinHandle<()>> {
    if !config.enabled {
        tracing::info!("Scheduler disabled");
        return Vec::new();
    }

    let conclude_every = Duration::from_secs(config.conclude_interval_secs.max(1));
    let purge_every = Duration::from_secs(config.session_purge_interval_secs.max(1));
    let executor_conclude = executor.clone();
    let executor_sessions = executor;

    let conclude = tokio::spawn(async move {
        let mut interval = interval(conclude_every);
        loop {
            interval.tick().await;
            match executor_conclude.conclude_expired_events().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Concluded expired events");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to conclude expired events");
                }
            }
        }
    });

    let sessions = tokio::spawn(async move {
        let mut interval = interval(purge_every);
        loop {
            interval.tick().await;
            match executor_sessions.purge_expired_sessions().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::debug!(count, "Purged expired sessions");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to purge expired sessions");
                }
            }
        }
    });

    vec![conclude, sessions]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reelhouse_common::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingExecutor {
        conclude_runs: AtomicUsize,
        purge_runs: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl JobExecutor for CountingExecutor {
        async fn conclude_expired_events(&self) -> AppResult<usize> {
            self.conclude_runs.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }

        async fn purge_expired_sessions(&self) -> AppResult<usize> {
            self.purge_runs.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Session("store unavailable".to_string()))
        }
    }

    fn config(enabled: bool) -> SchedulerConfig {
        SchedulerConfig {
            enabled,
            conclude_interval_secs: 60,
            session_purge_interval_secs: 600,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_run_on_their_intervals() {
        let executor = Arc::new(CountingExecutor::default());
        let handles = run_scheduler(&config(true), executor.clone());

        tokio::time::sleep(Duration::from_secs(125)).await;

        // Ticks at 0s, 60s and 120s; the purge only at 0s.
        assert_eq!(executor.conclude_runs.load(Ordering::SeqCst), 3);
        assert_eq!(executor.purge_runs.load(Ordering::SeqCst), 1);

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn test_disabled_scheduler_spawns_nothing() {
        let executor = Arc::new(CountingExecutor::default());
        assert!(run_scheduler(&config(false), executor).is_empty());
    }
}
