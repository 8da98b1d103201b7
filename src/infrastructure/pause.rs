use std::time::Duration;

use async_trait::async_trait;

/// Blocking wait between fetches: courtesy delays and rate-limit cool-downs.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Records requested waits instead of sleeping.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingPause {
    pub waits: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(test)]
#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}
