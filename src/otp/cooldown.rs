use std::time::Duration;

/// Resend countdown, ticked once per second by the host loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendCooldown {
    duration_secs: u32,
    remaining: u32,
}

impl ResendCooldown {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            remaining: 0,
        }
    }

    /// Interval the host should tick at
    pub const TICK: Duration = Duration::from_secs(1);

    /// Restart after a successful send
    pub fn start(&mut self) {
        self.remaining = self.duration_secs;
    }

    /// One second elapsed
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn can_resend(&self) -> bool {
        self.remaining == 0
    }
}
