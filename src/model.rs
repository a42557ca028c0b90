use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-commit measurements keyed by measurement name (e.g. a file extension).
pub type MeasurementMap = BTreeMap<String, u64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub id: String,
    /// First parent first; only that one is followed when walking history.
    pub parent_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub author_name: String,
    pub message: String,
}

impl CommitInfo {
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(8)]
    }

    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }
}

/// A commit paired with the measurements taken on its working tree.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub commit: CommitInfo,
    pub measurements: MeasurementMap,
}

impl Sample {
    pub fn total(&self) -> u64 {
        self.measurements.values().sum()
    }

    pub fn count(&self, key: &str) -> u64 {
        self.measurements.get(key).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Commit index, oldest commit at 0.
    pub x: usize,
    /// Cumulative percentage.
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn css(&self, alpha: f32) -> String {
        format!(
            "rgba({}, {}, {}, {:.2})",
            self.r,
            self.g,
            self.b,
            (self.a as f32 / 255.0) * alpha
        )
    }
}

#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub color: Rgba,
    pub points: Vec<SeriesPoint>,
}

/// One entry of a working-tree directory listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Maximum number of commits to visit.
    pub max_commits: Option<usize>,
    /// Commits strictly older than this are not visited.
    pub since: Option<DateTime<Utc>>,
    /// Show a spinner while walking.
    pub progress: bool,
}

impl WalkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_commits(mut self, max_commits: usize) -> Self {
        self.max_commits = Some(max_commits);
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn reached_limit(&self, observed: usize) -> bool {
        self.max_commits.is_some_and(|max| observed >= max)
    }

    pub fn is_before_cutoff(&self, timestamp: &DateTime<Utc>) -> bool {
        self.since.is_some_and(|since| timestamp < &since)
    }
}
