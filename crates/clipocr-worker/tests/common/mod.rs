//! Shared fixtures for worker integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use clipocr_models::{Clip, ClipId, ClipResult, ClipStatus, Payload};
use clipocr_ocr_client::{OcrClient, OcrClientConfig, OcrError, OcrResult, OcrTransport};
use clipocr_queue::{SharedQueue, WorkQueue};
use clipocr_worker::BatchProcessor;

/// Transport whose behaviour is chosen by the clip payload:
///
/// - `text:<body>` succeeds with `<body>`
/// - `status:<code>` fails as the service would for that HTTP status
/// - `hold:<body>` signals `entered`, waits for `release`, then succeeds
#[derive(Default)]
pub struct PayloadTransport {
    pub calls: Mutex<Vec<String>>,
    pub tags: Mutex<Vec<Option<String>>>,
    pub entered: Notify,
    pub release: Notify,
}

impl PayloadTransport {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrTransport for PayloadTransport {
    async fn recognize(&self, payload: &Payload, request_tag: Option<&str>) -> OcrResult<String> {
        let script = String::from_utf8_lossy(payload.as_bytes()).into_owned();
        self.calls.lock().unwrap().push(script.clone());
        self.tags.lock().unwrap().push(request_tag.map(str::to_string));

        let (kind, rest) = script.split_once(':').unwrap_or((script.as_str(), ""));
        match kind {
            "text" => Ok(rest.to_string()),
            "status" => Err(OcrError::from_http_status(rest.parse().unwrap())),
            "hold" => {
                self.entered.notify_one();
                self.release.notified().await;
                Ok(rest.to_string())
            }
            other => panic!("unknown script {other}"),
        }
    }
}

pub struct Harness {
    pub queue: SharedQueue,
    pub transport: Arc<PayloadTransport>,
    pub processor: Arc<BatchProcessor>,
}

impl Harness {
    pub fn new() -> Self {
        let transport = Arc::new(PayloadTransport::default());
        let config = OcrClientConfig::default()
            .with_max_retries(1)
            .with_base_delay(Duration::from_millis(1));
        let client = OcrClient::with_transport(transport.clone(), config);
        let queue = WorkQueue::shared();
        let processor = Arc::new(BatchProcessor::new(queue.clone(), client, 64));
        Self {
            queue,
            transport,
            processor,
        }
    }

    pub async fn add(&self, id: &str, script: &str) {
        self.add_clip(clip(id, script)).await;
    }

    pub async fn add_clip(&self, clip: Clip) {
        self.queue.write().await.add(clip).unwrap();
    }

    pub async fn status(&self, id: &str) -> ClipStatus {
        self.queue.read().await.get(&ClipId::from_string(id)).unwrap().status
    }

    pub async fn result(&self, id: &str) -> Option<ClipResult> {
        self.queue
            .read()
            .await
            .get(&ClipId::from_string(id))
            .unwrap()
            .result
            .clone()
    }
}

pub fn clip(id: &str, script: &str) -> Clip {
    Clip::new(script.as_bytes().to_vec(), format!("Clip {id}")).with_id(ClipId::from_string(id))
}

pub fn clip_with(id: &str, script: &str, status: ClipStatus, result: Option<ClipResult>) -> Clip {
    let mut clip = clip(id, script);
    clip.status = status;
    clip.result = result;
    clip
}
