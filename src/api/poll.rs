use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// Backoff shape for polling an order/authorization/challenge after
/// answering a challenge or finalizing an order. The server's own
/// `Retry-After` header, when present, always wins over the computed
/// interval (RFC 8555 section 8.2).
#[derive(Clone, Debug)]
pub struct PollingPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,

    /// Total wall-clock budget before giving up with `AcmeError::Timeout`.
    /// `None` polls forever (the orchestrator itself has no built-in
    /// timeout per spec; callers that want one should set this).
    pub deadline: Option<Duration>,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            multiplier: 2.0,
            deadline: Some(Duration::from_secs(120)),
        }
    }
}

impl PollingPolicy {
    pub(crate) fn next_interval(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(retry_after) = retry_after {
            return retry_after;
        }
        let scaled = self
            .initial_interval
            .mul_f64(self.multiplier.powi(attempt as i32));
        scaled.min(self.max_interval)
    }

    pub(crate) fn deadline_exceeded(&self, started: Instant) -> bool {
        self.deadline
            .map(|deadline| started.elapsed() > deadline)
            .unwrap_or(false)
    }
}

/// A cooperative cancellation signal. Cancelling does not abort anything
/// already in flight on the server — an order may remain created — it only
/// stops this client from polling further.
#[derive(Clone, Debug, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_interval_backs_off_up_to_max() {
        let policy = PollingPolicy {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(4),
            multiplier: 2.0,
            deadline: None,
        };
        assert_eq!(policy.next_interval(0, None), Duration::from_secs(1));
        assert_eq!(policy.next_interval(1, None), Duration::from_secs(2));
        assert_eq!(policy.next_interval(2, None), Duration::from_secs(4));
        assert_eq!(policy.next_interval(3, None), Duration::from_secs(4));
    }

    #[test]
    fn retry_after_overrides_backoff() {
        let policy = PollingPolicy::default();
        assert_eq!(
            policy.next_interval(0, Some(Duration::from_secs(30))),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn cancel_is_observed_after_clone() {
        let cancel = Cancel::new();
        let clone = cancel.clone();
        assert!(!clone.is_cancelled());
        cancel.cancel();
        assert!(clone.is_cancelled());
    }
}
