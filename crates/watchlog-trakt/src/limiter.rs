use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Minimum spacing between outbound calls to Trakt, across the whole
/// process.
const MIN_REQUEST_GAP: Duration = Duration::from_millis(50);

/// Serializes all outbound provider calls onto a shared cadence.
///
/// The last-slot instant is read and updated under one lock, and the wait
/// happens while holding it, so concurrent callers can never compute
/// overlapping wait windows. The lock is released before the caller issues
/// its request.
pub struct RequestPacer {
    last_slot: Mutex<Option<Instant>>,
    min_gap: Duration,
}

impl RequestPacer {
    pub fn new() -> Self {
        Self::with_gap(MIN_REQUEST_GAP)
    }

    pub fn with_gap(min_gap: Duration) -> Self {
        Self {
            last_slot: Mutex::new(None),
            min_gap,
        }
    }

    /// Block until at least the minimum gap has elapsed since the previous
    /// slot was granted, then claim the next slot.
    pub async fn wait_for_slot(&self) {
        let mut last = self.last_slot.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_gap {
                tokio::time::sleep(self.min_gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_back_to_back_slots_are_spaced() {
        let pacer = RequestPacer::with_gap(Duration::from_millis(50));

        pacer.wait_for_slot().await;
        let first_returned = Instant::now();
        pacer.wait_for_slot().await;

        assert!(first_returned.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_concurrent_callers_serialize() {
        use std::sync::Arc;

        let pacer = Arc::new(RequestPacer::with_gap(Duration::from_millis(20)));
        let started = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pacer = pacer.clone();
            handles.push(tokio::spawn(async move {
                pacer.wait_for_slot().await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Four slots need at least three full gaps between them.
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
