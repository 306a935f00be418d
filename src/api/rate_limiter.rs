//! Per-key rate limiting over a semaphore.
//!
//! Each key gets `max_per_window` permits; an acquired permit is returned by
//! a background task once the window elapses, which bounds the request rate
//! without holding callers longer than necessary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

pub struct RateLimiter {
    semaphores: Mutex<HashMap<String, Arc<Semaphore>>>,
    max_per_window: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            semaphores: Mutex::new(HashMap::new()),
            max_per_window,
            window,
        }
    }

    /// Waits until a request slot for `key` is free.
    pub async fn acquire(&self, key: &str) {
        let sem = {
            let mut map = self.semaphores.lock().unwrap();
            Arc::clone(
                map.entry(key.to_string())
                    .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_window))),
            )
        };

        // The semaphore is never closed, so acquire cannot fail
        let permit = Arc::clone(&sem).acquire_owned().await.unwrap();
        permit.forget();

        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            sem.add_permits(1);
        });
        log::debug!("Rate limiter: acquired slot for key {}", key);
    }

    /// Drops the state for `key`; the next acquire starts a fresh window.
    pub fn reset(&self, key: &str) {
        if self.semaphores.lock().unwrap().remove(key).is_some() {
            log::debug!("Rate limiter: reset key {}", key);
        }
    }
}
