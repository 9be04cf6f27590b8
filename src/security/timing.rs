//! Login latency padding
//!
//! A rejected login waits until a configured floor has passed, so the
//! caller cannot tell at which step the attempt was refused.

use std::time::{Duration, Instant};

/// Sleep for whatever remains of `floor` since `started`
pub async fn add_auth_delay(started: Instant, floor: Duration) {
    if let Some(remaining) = floor.checked_sub(started.elapsed()) {
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
    }
}

/// Started when a login arrives; awaited only on the failure path
pub struct AuthTimer {
    started: Instant,
    floor: Duration,
}

impl AuthTimer {
    pub fn start(floor: Duration) -> Self {
        Self {
            started: Instant::now(),
            floor,
        }
    }

    pub async fn wait(self) {
        add_auth_delay(self.started, self.floor).await;
    }
}
