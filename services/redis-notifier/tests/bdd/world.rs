//! BDD test world for the redis notifier

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cucumber::World;
use redis_notifier::io::{HttpClient, HttpResponse};
use redis_notifier::{ConnectionNotifier, LifecycleEmitter, NotifierError};

/// Webhook stand-in that records every post and can be switched off
#[derive(Debug, Default)]
pub struct RecordingWebhook {
    pub attempts: Mutex<Vec<String>>,
    pub delivered: Mutex<Vec<String>>,
    pub unreachable: AtomicBool,
}

impl RecordingWebhook {
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl HttpClient for RecordingWebhook {
    async fn post_json(
        &self,
        _url: &str,
        body: &serde_json::Value,
    ) -> redis_notifier::Result<HttpResponse> {
        let text = body["text"].as_str().unwrap_or_default().to_string();
        self.attempts.lock().unwrap().push(text.clone());
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(NotifierError::Http("connection refused".to_string()));
        }
        self.delivered.lock().unwrap().push(text);
        Ok(HttpResponse {
            status: 200,
            body: "ok".to_string(),
        })
    }
}

#[derive(Debug, Default, World)]
pub struct NotifierWorld {
    pub emitter: LifecycleEmitter,
    pub webhook: Arc<RecordingWebhook>,
    pub notifier: Option<ConnectionNotifier>,
    pub construction_error: Option<NotifierError>,
}
