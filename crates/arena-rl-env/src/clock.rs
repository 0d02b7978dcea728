//! Frame-rate limiter; the only suspension point of a running episode

use std::time::Duration;

use tokio::time::Instant;

/// Paces engine ticks
///
/// Unpaced, every tick just yields to the runtime so signal listeners get a
/// chance to run. Paced, a tick sleeps until one frame period has passed
/// since the previous tick.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame: Duration,
    paced: bool,
    last: Option<Instant>,
}

impl FrameClock {
    /// Clock targeting `fps` frames per second when paced
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self {
            frame: Duration::from_secs(1) / fps.max(1),
            paced: false,
            last: None,
        }
    }

    /// Enable or disable real-time pacing
    pub fn set_paced(&mut self, paced: bool) {
        self.paced = paced;
        self.last = None;
    }

    /// Whether ticks are paced
    #[must_use]
    pub fn is_paced(&self) -> bool {
        self.paced
    }

    /// Target frame period
    #[must_use]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Wait for the next frame
    pub async fn tick(&mut self) {
        if self.paced {
            if let Some(last) = self.last {
                tokio::time::sleep_until(last + self.frame).await;
            } else {
                tokio::task::yield_now().await;
            }
            self.last = Some(Instant::now());
        } else {
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_paced_clock_waits_one_frame() {
        let mut clock = FrameClock::new(50);
        clock.set_paced(true);
        clock.tick().await;
        let start = Instant::now();
        clock.tick().await;
        assert!(start.elapsed() >= Duration::from_millis(19));
    }

    #[tokio::test]
    async fn test_unpaced_clock_does_not_sleep() {
        let mut clock = FrameClock::new(1);
        let start = std::time::Instant::now();
        for _ in 0..10 {
            clock.tick().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
