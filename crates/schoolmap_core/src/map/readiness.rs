//! Bounded wait for the widget runtime.
//!
//! # Invariants
//! - The loader is probed at most `max_attempts` times.
//! - No map work starts before the loader reports `Ready`.
//! - Cancellation wins over a pending sleep.

use super::error::{InitFailure, MapError};
use super::widget::{LoadState, WidgetLoader};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Retry schedule used while the widget runtime is still loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReadinessPolicy {
    /// Total time spent waiting before giving up.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Probes `loader` until it yields a runtime, fails, runs out of attempts or
/// is cancelled.
pub async fn wait_for_runtime<L: WidgetLoader>(
    loader: &L,
    policy: &ReadinessPolicy,
    cancel: &CancellationToken,
) -> Result<Arc<L::Runtime>, MapError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(MapError::Cancelled);
        }

        attempt += 1;
        match loader.poll_runtime() {
            LoadState::Ready(runtime) => {
                info!("event=widget_ready module=map status=ok attempts={attempt}");
                return Ok(runtime);
            }
            LoadState::Failed(err) => {
                return Err(MapError::WidgetInitFailed(InitFailure::LoadFailed(err)));
            }
            LoadState::Pending => {}
        }

        if attempt >= max_attempts {
            warn!("event=widget_ready module=map status=timeout attempts={attempt}");
            return Err(MapError::WidgetInitFailed(InitFailure::TimedOut {
                attempts: attempt,
            }));
        }

        debug!(
            "event=widget_ready module=map status=retry attempt={} interval_ms={}",
            attempt,
            policy.interval.as_millis()
        );
        tokio::select! {
            _ = cancel.cancelled() => return Err(MapError::Cancelled),
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}
