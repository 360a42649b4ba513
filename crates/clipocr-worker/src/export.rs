//! Plain-text export of recognized clips.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use tracing::info;

use clipocr_models::{Clip, ClipStatus};

use crate::error::WorkerResult;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9 ]").unwrap());

const HEADER_RULE: usize = 50;
const SEPARATOR_RULE: usize = 60;

/// A text file ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content: String,
}

impl ExportFile {
    /// Write into `dir`, returning the full path.
    pub async fn write_to(&self, dir: &Path) -> WorkerResult<PathBuf> {
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, self.content.as_bytes()).await?;
        info!(path = %path.display(), bytes = self.content.len(), "Wrote OCR export");
        Ok(path)
    }
}

/// File name for a single clip: the label with anything other than ASCII
/// letters, digits and spaces replaced by `_`.
pub fn clip_filename(label: &str) -> String {
    format!("{}.txt", UNSAFE_FILENAME_CHARS.replace_all(label, "_"))
}

/// Export one clip. `None` if it has no recognized text.
pub fn export_clip(clip: &Clip) -> Option<ExportFile> {
    let text = clip.text().filter(|t| !t.is_empty())?;
    Some(ExportFile {
        filename: clip_filename(&clip.label),
        content: format!("{}\n{}\n\n{}", clip.label, "=".repeat(HEADER_RULE), text),
    })
}

/// Export every done clip with non-empty text in the given order, numbered
/// from 1. `None` if there is nothing to export.
pub fn export_all(clips: &[Clip], date: NaiveDate) -> Option<ExportFile> {
    let sections: Vec<String> = clips
        .iter()
        .filter(|c| c.status == ClipStatus::Done)
        .filter_map(|c| c.text().map(|text| (c, text)))
        .filter(|(_, text)| !text.is_empty())
        .enumerate()
        .map(|(idx, (clip, text))| {
            format!(
                "[{}] {}\n{}\n\n{}",
                idx + 1,
                clip.label,
                "=".repeat(HEADER_RULE),
                text
            )
        })
        .collect();

    if sections.is_empty() {
        return None;
    }

    let separator = format!("\n\n{}\n\n", "-".repeat(SEPARATOR_RULE));
    Some(ExportFile {
        filename: format!("ocr_output_{}.txt", date.format("%Y-%m-%d")),
        content: sections.join(&separator),
    })
}

/// `export_all` stamped with today's UTC date.
pub fn export_all_today(clips: &[Clip]) -> Option<ExportFile> {
    export_all(clips, Utc::now().date_naive())
}
