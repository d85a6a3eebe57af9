//! Shared test transport

use async_trait::async_trait;
use metal_premium::feed::{FeedError, Transport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Serves canned bodies by URL; unknown URLs fail like a dropped connection
#[derive(Default)]
pub struct StubTransport {
    bodies: Mutex<HashMap<String, String>>,
    requests: AtomicUsize,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, body: impl Into<String>) -> Self {
        self.set(url, body);
        self
    }

    pub fn set(&self, url: &str, body: impl Into<String>) {
        self.bodies.lock().unwrap().insert(url.to_string(), body.into());
    }

    pub fn remove(&self, url: &str) {
        self.bodies.lock().unwrap().remove(url);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get_text(&self, url: &str) -> Result<String, FeedError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FeedError::Network(format!("connection refused: {}", url)))
    }
}

pub const SHANGHAI_HTML: &str = r#"
<div class="card">
  <span class="text-4xl font-bold">88.64</span><span class="unit">USD/OZ</span>
  <p>Western spot <span style="color:#c0c0c0">$<!-- -->83.62</span></p>
  <p>Premium <span>+<!-- -->$<!-- -->5.02</span></p>
</div>
"#;

pub const COPPER_HTML: &str = r#"<script>window.__quote = {"symbol":"HG.1","last":"4.5225","change":"0.01"};</script>"#;
