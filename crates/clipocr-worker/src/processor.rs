//! Serial batch processing of queued clips.
//!
//! Queue locks are taken for bookkeeping only and released before each OCR
//! call. A clip whose status is changed by another writer while in flight
//! fails on its own; the batch carries on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn, Instrument};

use clipocr_models::{BatchResult, ClipId, ClipResult, ClipStatus, ProgressEvent};
use clipocr_ocr_client::{CallOptions, OcrClient, OcrError};
use clipocr_queue::{SharedQueue, WorkQueue};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::BatchLogger;
use crate::metrics::{record_batch, record_clip};

/// What happened to a single clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipOutcome {
    /// Text recognized and stored
    Succeeded,
    /// Call failed; the error description is stored on the clip
    Failed(String),
    /// Clip was already done, or left the queue before it could be recorded
    Skipped,
}

impl ClipOutcome {
    fn metric_label(&self) -> &'static str {
        match self {
            Self::Succeeded => "success",
            Self::Failed(_) => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Requests cancellation of the running batch.
///
/// Cancellation takes effect before the next clip starts; the clip in
/// flight finishes its full attempt cycle.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Clears the running flag when a batch ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> WorkerResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WorkerError::BatchInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Apply `f` to the queue from a `Drop` impl.
///
/// Uses the lock directly when it is free, otherwise defers to a task on the
/// current runtime.
fn on_drop(queue: &SharedQueue, f: impl FnOnce(&mut WorkQueue) + Send + 'static) {
    if let Ok(mut guard) = queue.try_write() {
        f(&mut *guard);
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let queue = Arc::clone(queue);
            handle.spawn(async move { f(&mut *queue.write().await) });
        }
        Err(_) => warn!("No runtime to release batch state on"),
    }
}

/// Releases the order freeze if a batch is dropped before it finishes.
struct OrderFreeze {
    queue: Option<SharedQueue>,
}

impl OrderFreeze {
    fn new(queue: SharedQueue) -> Self {
        Self { queue: Some(queue) }
    }

    fn disarm(&mut self) {
        self.queue = None;
    }
}

impl Drop for OrderFreeze {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.take() {
            on_drop(&queue, WorkQueue::thaw_order);
        }
    }
}

/// Marks a clip `error` if its call is dropped before the result is
/// recorded, so the next batch picks it up again.
struct InFlightClip {
    queue: SharedQueue,
    id: Option<ClipId>,
}

impl InFlightClip {
    fn new(queue: SharedQueue, id: ClipId) -> Self {
        Self {
            queue,
            id: Some(id),
        }
    }

    fn disarm(&mut self) {
        self.id = None;
    }
}

impl Drop for InFlightClip {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        warn!(clip_id = %id, "Clip abandoned in flight");
        on_drop(&self.queue, move |queue| {
            let abandoned = ClipResult::Error(OcrError::Cancelled.to_string());
            if let Err(e) = queue.finish(&id, abandoned) {
                debug!(clip_id = %id, "Abandoned clip not reset: {}", e);
            }
        });
    }
}

/// Submits queued clips to the OCR client one at a time.
pub struct BatchProcessor {
    queue: SharedQueue,
    client: OcrClient,
    options: CallOptions,
    events: broadcast::Sender<ProgressEvent>,
    cancel: Arc<watch::Sender<bool>>,
    running: AtomicBool,
}

impl BatchProcessor {
    pub fn new(queue: SharedQueue, client: OcrClient, progress_capacity: usize) -> Self {
        let options = client.call_options();
        let (events, _) = broadcast::channel(progress_capacity.max(1));
        let (cancel, _) = watch::channel(false);
        Self {
            queue,
            client,
            options,
            events,
            cancel: Arc::new(cancel),
            running: AtomicBool::new(false),
        }
    }

    /// Override the per-call options (timeout, retry budget, request tag).
    ///
    /// Any cancel receiver in `options` is dropped: batch cancellation never
    /// interrupts the clip in flight.
    pub fn with_call_options(mut self, mut options: CallOptions) -> Self {
        options.cancel = None;
        self.options = options;
        self
    }

    pub fn with_request_tag(mut self, tag: Option<String>) -> Self {
        self.options.request_tag = tag;
        self
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.queue
    }

    pub fn call_options(&self) -> &CallOptions {
        &self.options
    }

    /// Receive progress events for subsequent batches.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel),
        }
    }

    /// Ask the running batch to stop before its next clip.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Process every `pending` or `error` clip in queue order.
    ///
    /// Clips added after the batch starts are not included. If the batch is
    /// cancelled, clips not reached are left untouched but still count as
    /// failed in the result. If the returned future is dropped mid-batch, the
    /// clip in flight is marked `error` and the queue order is released.
    pub async fn process_all(&self) -> WorkerResult<BatchResult> {
        let _guard = RunGuard::acquire(&self.running)?;
        self.cancel.send_replace(false);

        let ids: Vec<ClipId> = {
            let mut queue = self.queue.write().await;
            queue.freeze_order();
            queue.pending().iter().map(|c| c.id.clone()).collect()
        };
        let mut freeze = OrderFreeze::new(self.queue.clone());
        let total = ids.len() as u32;

        let logger = BatchLogger::new(total);
        logger.log_start();
        self.publish(ProgressEvent::batch_started(total));

        let (success_count, cancelled) = self
            .run_batch(&ids, &logger)
            .instrument(logger.create_span())
            .await;
        self.queue.write().await.thaw_order();
        freeze.disarm();

        let result = BatchResult::new(total, success_count, cancelled);
        record_batch(cancelled);
        logger.log_finished(&result);

        self.publish(ProgressEvent::finished(result));
        Ok(result)
    }

    async fn run_batch(&self, ids: &[ClipId], logger: &BatchLogger) -> (u32, bool) {
        let total = ids.len() as u32;
        let mut success_count = 0u32;

        for (index, id) in ids.iter().enumerate() {
            if *self.cancel.borrow() {
                return (success_count, true);
            }

            let outcome = self.process_clip(id).await;
            record_clip(outcome.metric_label());
            logger.log_clip(index, id, &outcome);
            if outcome == ClipOutcome::Succeeded {
                success_count += 1;
            }

            self.publish(ProgressEvent::progress(index as u32 + 1, total));
        }

        (success_count, false)
    }

    /// Process one clip outside a batch. A clip that is already done is
    /// left alone.
    pub async fn process_one(&self, id: &ClipId) -> WorkerResult<ClipOutcome> {
        let _guard = RunGuard::acquire(&self.running)?;

        if !self.queue.read().await.contains(id) {
            return Err(WorkerError::ClipNotFound(id.clone()));
        }

        let outcome = self.process_clip(id).await;
        record_clip(outcome.metric_label());
        Ok(outcome)
    }

    /// Move one clip through `processing` to `done` or `error`.
    ///
    /// Queue errors concern this clip only: they are logged and the clip is
    /// reported as skipped or failed.
    async fn process_clip(&self, id: &ClipId) -> ClipOutcome {
        let payload = {
            let mut queue = self.queue.write().await;
            let payload = match queue.get(id) {
                Some(clip) if clip.status.is_eligible() => clip.payload().clone(),
                Some(clip) if clip.status.is_terminal() => {
                    debug!(clip_id = %id, "Clip already recognized");
                    return ClipOutcome::Skipped;
                }
                Some(clip) => {
                    debug!(clip_id = %id, status = %clip.status, "Skipping clip");
                    return ClipOutcome::Skipped;
                }
                None => {
                    debug!(clip_id = %id, "Clip left the queue before processing");
                    return ClipOutcome::Skipped;
                }
            };
            if let Err(e) = queue.update_status(id, ClipStatus::Processing) {
                warn!(clip_id = %id, "Could not start clip: {}", e);
                return ClipOutcome::Skipped;
            }
            payload
        };
        let mut in_flight = InFlightClip::new(self.queue.clone(), id.clone());
        self.publish(ProgressEvent::status_changed(id.clone(), ClipStatus::Processing));

        let (result, outcome) = match self.client.call(&payload, &self.options).await {
            Ok(text) => (ClipResult::Text(text), ClipOutcome::Succeeded),
            Err(e) => {
                warn!(clip_id = %id, "OCR failed: {}", e);
                let message = e.to_string();
                (ClipResult::Error(message.clone()), ClipOutcome::Failed(message))
            }
        };

        let recorded = self.queue.write().await.finish(id, result);
        in_flight.disarm();

        match recorded {
            Ok(true) => {}
            Ok(false) => {
                info!(clip_id = %id, "Clip removed while in flight, result discarded");
                return ClipOutcome::Skipped;
            }
            Err(e) => {
                warn!(clip_id = %id, "Result not recorded: {}", e);
                return ClipOutcome::Failed(e.to_string());
            }
        }

        self.publish(match &outcome {
            ClipOutcome::Failed(message) => ProgressEvent::clip_failed(id.clone(), message.clone()),
            _ => ProgressEvent::status_changed(id.clone(), ClipStatus::Done),
        });
        outcome
    }

    fn publish(&self, event: ProgressEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
