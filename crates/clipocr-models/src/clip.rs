//! Clip models.
//!
//! A clip is one cropped image region queued for OCR. Its status follows a
//! small state machine:
//!
//! ```text
//! pending ──► processing ──► done
//!                  │
//!                  ▼
//!   error ◄────────┘   (error ──► processing again on resubmission)
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    /// Generate a new random clip ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable image bytes submitted for recognition.
///
/// Backed by a shared buffer so resubmission and per-attempt request
/// building never copy the clip itself.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Payload(Arc<[u8]>);

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({} bytes)", self.0.len())
    }
}

/// Clip processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    /// Waiting to be submitted
    #[default]
    Pending,
    /// Recognition in flight
    Processing,
    /// Text recognized
    Done,
    /// Last attempt failed (eligible for resubmission)
    Error,
}

impl ClipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStatus::Pending => "pending",
            ClipStatus::Processing => "processing",
            ClipStatus::Done => "done",
            ClipStatus::Error => "error",
        }
    }

    /// Whether a batch should pick this clip up.
    pub fn is_eligible(&self) -> bool {
        matches!(self, ClipStatus::Pending | ClipStatus::Error)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ClipStatus::Done)
    }

    /// Check whether moving from `self` to `next` is a legal transition.
    ///
    /// Setting the current status again is always allowed.
    pub fn can_transition_to(&self, next: ClipStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (ClipStatus::Pending, ClipStatus::Processing)
                | (ClipStatus::Error, ClipStatus::Processing)
                | (ClipStatus::Processing, ClipStatus::Done)
                | (ClipStatus::Processing, ClipStatus::Error)
        )
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown clip status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for ClipStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClipStatus::Pending),
            "processing" => Ok(ClipStatus::Processing),
            "done" => Ok(ClipStatus::Done),
            "error" => Ok(ClipStatus::Error),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Outcome of the last completed attempt on a clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ClipResult {
    /// Recognized text
    Text(String),
    /// Error description
    Error(String),
}

impl ClipResult {
    /// The status a clip moves to when this result is recorded.
    pub fn status(&self) -> ClipStatus {
        match self {
            ClipResult::Text(_) => ClipStatus::Done,
            ClipResult::Error(_) => ClipStatus::Error,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ClipResult::Text(t) => Some(t),
            ClipResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ClipResult::Text(_) => None,
            ClipResult::Error(e) => Some(e),
        }
    }
}

/// A cropped region queued for recognition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Clip {
    /// Unique ID, stable for the clip's lifetime
    pub id: ClipId,

    /// Image bytes (never serialized)
    #[serde(skip)]
    #[schemars(skip)]
    payload: Payload,

    /// Display label
    pub label: String,

    /// Source image the clip was cut from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Current status
    pub status: ClipStatus,

    /// Result of the last completed attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ClipResult>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Clip {
    /// Create a new pending clip.
    pub fn new(payload: impl Into<Payload>, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ClipId::new(),
            payload: payload.into(),
            label: label.into(),
            source_name: None,
            status: ClipStatus::Pending,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Use a caller-supplied ID instead of a generated one.
    pub fn with_id(mut self, id: ClipId) -> Self {
        self.id = id;
        self
    }

    /// Set the source image name.
    pub fn with_source(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Recognized text, if the clip is done.
    pub fn text(&self) -> Option<&str> {
        self.result.as_ref().and_then(ClipResult::text)
    }
}
