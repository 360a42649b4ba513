//! In-memory ordered clip queue.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use clipocr_models::{Clip, ClipId, ClipResult, ClipStatus};

use crate::error::{QueueError, QueueResult};

/// Queue handle shared between the batch processor and readers.
///
/// Guards must not be held across a remote call.
pub type SharedQueue = Arc<RwLock<WorkQueue>>;

/// Ordered collection of clips.
///
/// Order is insertion order until `reorder` replaces it; it decides both
/// presentation order and batch processing order.
#[derive(Debug, Default)]
pub struct WorkQueue {
    clips: Vec<Clip>,
    order_frozen: bool,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a new queue for sharing.
    pub fn shared() -> SharedQueue {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Append a clip.
    pub fn add(&mut self, clip: Clip) -> QueueResult<()> {
        if self.contains(&clip.id) {
            return Err(QueueError::DuplicateId(clip.id));
        }
        debug!(clip_id = %clip.id, label = %clip.label, "Queued clip");
        self.clips.push(clip);
        Ok(())
    }

    /// Remove a clip. Returns `None` if it was not queued.
    pub fn remove(&mut self, id: &ClipId) -> Option<Clip> {
        let index = self.position(id)?;
        debug!(clip_id = %id, "Removed clip");
        Some(self.clips.remove(index))
    }

    /// Remove every clip.
    pub fn clear(&mut self) {
        self.clips.clear();
    }

    /// Replace the order with `new_order`, which must be a permutation of the
    /// queued IDs.
    pub fn reorder(&mut self, new_order: &[ClipId]) -> QueueResult<()> {
        if self.order_frozen {
            return Err(QueueError::OrderFrozen);
        }

        let mut seen = HashSet::with_capacity(new_order.len());
        for id in new_order {
            if !self.contains(id) {
                return Err(QueueError::UnknownId(id.clone()));
            }
            if !seen.insert(id) {
                return Err(QueueError::DuplicateId(id.clone()));
            }
        }

        let missing: Vec<ClipId> = self
            .clips
            .iter()
            .filter(|c| !seen.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();
        if !missing.is_empty() {
            return Err(QueueError::MissingItems(missing));
        }

        let mut remaining = std::mem::take(&mut self.clips);
        for id in new_order {
            if let Some(index) = remaining.iter().position(|c| &c.id == id) {
                self.clips.push(remaining.swap_remove(index));
            }
        }
        Ok(())
    }

    /// Set a clip's status. No-op if the clip is not queued.
    pub fn update_status(&mut self, id: &ClipId, status: ClipStatus) -> QueueResult<()> {
        let Some(clip) = self.get_mut(id) else {
            return Ok(());
        };
        if !clip.status.can_transition_to(status) {
            return Err(QueueError::invalid_transition(id, clip.status, status));
        }
        clip.status = status;
        clip.updated_at = Utc::now();
        Ok(())
    }

    /// Record the outcome of a processing clip, moving it to `done` or
    /// `error`. Returns `false` if the clip is not queued.
    pub fn finish(&mut self, id: &ClipId, result: ClipResult) -> QueueResult<bool> {
        let Some(clip) = self.get_mut(id) else {
            return Ok(false);
        };
        let next = result.status();
        if clip.status != ClipStatus::Processing {
            return Err(QueueError::invalid_transition(id, clip.status, next));
        }
        clip.status = next;
        clip.result = Some(result);
        clip.updated_at = Utc::now();
        Ok(true)
    }

    /// All clips in queue order.
    pub fn all(&self) -> &[Clip] {
        &self.clips
    }

    /// Clips eligible for (re)submission: `pending` or `error`, in queue order.
    pub fn pending(&self) -> Vec<&Clip> {
        self.clips.iter().filter(|c| c.status.is_eligible()).collect()
    }

    /// Clips with recognized text, in queue order.
    pub fn done(&self) -> Vec<&Clip> {
        self.clips
            .iter()
            .filter(|c| c.status == ClipStatus::Done)
            .collect()
    }

    /// Clips cut from the named source image.
    pub fn from_source(&self, source_name: &str) -> Vec<&Clip> {
        self.clips
            .iter()
            .filter(|c| c.source_name.as_deref() == Some(source_name))
            .collect()
    }

    pub fn get(&self, id: &ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &ClipId) -> bool {
        self.position(id).is_some()
    }

    pub fn count(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Reject reordering until `thaw_order` is called.
    pub fn freeze_order(&mut self) {
        self.order_frozen = true;
    }

    pub fn thaw_order(&mut self) {
        self.order_frozen = false;
    }

    pub fn is_order_frozen(&self) -> bool {
        self.order_frozen
    }

    fn position(&self, id: &ClipId) -> Option<usize> {
        self.clips.iter().position(|c| &c.id == id)
    }

    fn get_mut(&mut self, id: &ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| &c.id == id)
    }
}
