//! Progress notifications for the presentation layer.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{BatchResult, ClipId, ClipStatus};

/// Event emitted while clips are being recognized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A batch started with this many eligible clips
    BatchStarted { total: u32 },

    /// A clip changed status
    ClipStatusChanged {
        #[serde(rename = "clipId")]
        clip_id: ClipId,
        status: ClipStatus,
        /// Error description when the clip failed
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// `processed` of `total` clips have completed
    BatchProgress { processed: u32, total: u32 },

    /// The batch loop ended
    BatchFinished { result: BatchResult },
}

impl ProgressEvent {
    pub fn batch_started(total: u32) -> Self {
        Self::BatchStarted { total }
    }

    pub fn status_changed(clip_id: ClipId, status: ClipStatus) -> Self {
        Self::ClipStatusChanged {
            clip_id,
            status,
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn clip_failed(clip_id: ClipId, message: impl Into<String>) -> Self {
        Self::ClipStatusChanged {
            clip_id,
            status: ClipStatus::Error,
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn progress(processed: u32, total: u32) -> Self {
        Self::BatchProgress { processed, total }
    }

    pub fn finished(result: BatchResult) -> Self {
        Self::BatchFinished { result }
    }

    /// Percentage complete for progress events (0-100).
    pub fn percent(&self) -> Option<u8> {
        match self {
            Self::BatchProgress { processed, total } if *total > 0 => {
                Some(((*processed as f64 / *total as f64) * 100.0).round() as u8)
            }
            Self::BatchProgress { .. } => Some(0),
            _ => None,
        }
    }
}
