//! Per-role request ceiling around a `LanguageModel`.
//!
//! Sliding 60-second window: a call that would exceed `max_rpm` waits until
//! the oldest admitted call leaves the window. `max_rpm == 0` disables the limit.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::{LanguageModel, LlmError};

const WINDOW: Duration = Duration::from_secs(60);

pub struct RateLimitedModel {
    inner: Arc<dyn LanguageModel>,
    max_rpm: u32,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimitedModel {
    pub fn new(inner: Arc<dyn LanguageModel>, max_rpm: u32) -> Self {
        Self {
            inner,
            max_rpm,
            admitted: Mutex::new(VecDeque::new()),
        }
    }

    async fn acquire(&self) {
        if self.max_rpm == 0 {
            return;
        }

        loop {
            let wait = {
                let mut admitted = self.admitted.lock().await;
                let now = Instant::now();
                while admitted
                    .front()
                    .is_some_and(|&t| now.duration_since(t) >= WINDOW)
                {
                    admitted.pop_front();
                }

                if admitted.len() < self.max_rpm as usize {
                    admitted.push_back(now);
                    return;
                }

                match admitted.front() {
                    Some(&oldest) => WINDOW - now.duration_since(oldest),
                    None => continue,
                }
            };

            debug!(
                "Request ceiling of {}/min reached, waiting {}ms",
                self.max_rpm,
                wait.as_millis()
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[async_trait]
impl LanguageModel for RateLimitedModel {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.acquire().await;
        self.inner.complete(system, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    #[tokio::test(start_paused = true)]
    async fn test_calls_under_ceiling_do_not_wait() {
        let inner = Arc::new(ScriptedModel::new(["a", "b"]));
        let model = RateLimitedModel::new(inner, 2);
        let start = Instant::now();

        model.complete("sys", "one").await.unwrap();
        model.complete("sys", "two").await.unwrap();

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_over_ceiling_waits_for_window() {
        let inner = Arc::new(ScriptedModel::new(["a", "b", "c"]));
        let model = RateLimitedModel::new(inner, 2);
        let start = Instant::now();

        model.complete("sys", "one").await.unwrap();
        model.complete("sys", "two").await.unwrap();
        let third = model.complete("sys", "three").await.unwrap();

        assert_eq!(third, "c");
        assert!(start.elapsed() >= WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ceiling_is_unlimited() {
        let inner = Arc::new(ScriptedModel::new(["a", "b", "c", "d"]));
        let model = RateLimitedModel::new(inner, 0);
        let start = Instant::now();

        for _ in 0..4 {
            model.complete("sys", "p").await.unwrap();
        }

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_delegates_model_id() {
        let inner = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        let model = RateLimitedModel::new(inner, 5);
        assert_eq!(model.model_id(), "scripted");
    }
}
