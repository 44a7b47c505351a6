use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// A cancellable quiet-period timer.
///
/// `schedule` (re)arms the timer `delay` from now, `cancel` disarms it, and
/// `fired` resolves once the armed deadline passes. An unarmed timer never
/// fires. `fired` is cancel-safe: dropping it keeps the deadline armed.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Disarms the timer. Returns whether it was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}
