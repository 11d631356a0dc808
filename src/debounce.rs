//! Quiet-interval timer for search-as-you-type.
//!
//! At most one timer is pending. Scheduling cancels the previous one, and a
//! firing is only honoured when its generation is still the latest.

use crate::async_task::TaskResult;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start a new quiet interval, cancelling any pending one. When the
    /// interval elapses a [`TaskResult::SearchDebounceElapsed`] carrying the
    /// returned generation is sent on `result_sender`.
    pub fn schedule(&mut self, result_sender: mpsc::Sender<TaskResult>) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    log::debug!("debounce #{} cancelled", generation);
                }
                _ = tokio::time::sleep(delay) => {
                    if result_sender
                        .send(TaskResult::SearchDebounceElapsed { generation })
                        .await
                        .is_err()
                    {
                        log::debug!("debounce #{} fired after session closed", generation);
                    }
                }
            }
        });
        generation
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume a firing. Returns true only for the latest scheduled timer.
    pub fn fire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        true
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_timer_fires() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.schedule(tx.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;
        let latest = debouncer.schedule(tx.clone());

        tokio::time::sleep(Duration::from_millis(600)).await;
        let fired = rx.try_recv().unwrap();
        assert!(matches!(
            fired,
            TaskResult::SearchDebounceElapsed { generation } if generation == latest
        ));
        assert!(rx.try_recv().is_err());
        assert!(debouncer.fire(latest));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_outdated_generation_is_ignored() {
        let (tx, _rx) = mpsc::channel(8);
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        let first = debouncer.schedule(tx.clone());
        let second = debouncer.schedule(tx);
        assert!(!debouncer.fire(first));
        assert!(debouncer.is_pending());
        assert!(debouncer.fire(second));
        assert!(!debouncer.fire(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_pending_timer() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.schedule(tx);
        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.is_pending());
    }
}
