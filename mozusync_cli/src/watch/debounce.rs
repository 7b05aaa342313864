//! Leading and trailing edge debounce

use std::time::Duration;
use tokio::time::Instant;

/// Quiet period before the trailing flush
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Debounce state driven by explicit timestamps
///
/// The first call in a quiet period fires at once. Later calls inside the
/// window push the deadline out, and one trailing fire happens at the
/// deadline if any of them arrived.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
    trailing_pending: bool,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            trailing_pending: false,
        }
    }

    /// Register a call; true when it fires on the leading edge
    pub fn call(&mut self, now: Instant) -> bool {
        let leading = self.deadline.is_none();
        self.deadline = Some(now + self.window);
        if !leading {
            self.trailing_pending = true;
        }
        leading
    }

    /// When the pending window closes, if one is open
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Close the window if it has elapsed; true when the trailing edge fires
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                std::mem::take(&mut self.trailing_pending)
            }
            _ => false,
        }
    }
}
