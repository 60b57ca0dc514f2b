//! Upload orchestration for a merged file set.
//!
//! Uploads run through a bounded pool; every file yields its own outcome and
//! the run ends with an `UploadReport` instead of stopping at the first error.

use crate::{models::manifest::FileEntry, services::object_store::ObjectStore};
use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Progress is reported each time another 20% of files has finished.
const PROGRESS_STEP_TENTHS: usize = 200;

/// One file to upload.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub entry: FileEntry,
    pub source: PathBuf,
    pub key: String,
    pub content_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct FailedUpload {
    pub entry: FileEntry,
    pub key: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub total: usize,
    pub uploaded: Vec<String>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.uploaded.len() == self.total
    }

    /// The entries that did not make it, ready to be planned again.
    pub fn failed_entries(&self) -> Vec<FileEntry> {
        self.failed.iter().map(|f| f.entry.clone()).collect()
    }
}

/// Map merged entries to source files and destination keys under `prefix`.
pub fn plan_uploads(files: &[FileEntry], prefix: &str, programs_dir: &Path) -> Vec<UploadJob> {
    files
        .iter()
        .filter_map(|entry| {
            let url_path = entry.url_path()?;
            let key = format!("{prefix}{url_path}");
            Some(UploadJob {
                source: programs_dir.join(&entry.arch).join(&entry.path),
                content_type: content_type_for(&key),
                key,
                entry: entry.clone(),
            })
        })
        .collect()
}

/// Upload every job with at most `concurrency` requests in flight.
pub async fn upload_all(
    store: &dyn ObjectStore,
    bucket: &str,
    jobs: Vec<UploadJob>,
    concurrency: usize,
) -> UploadReport {
    let mut report = UploadReport {
        total: jobs.len(),
        ..Default::default()
    };
    let mut progress = ProgressTracker::new(jobs.len());

    let mut outcomes = stream::iter(jobs)
        .map(|job| async move {
            let result = store
                .upload_object(bucket, &job.key, &job.source, job.content_type)
                .await;
            (job, result)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((job, result)) = outcomes.next().await {
        match result {
            Ok(()) => {
                debug!(key = %job.key, "uploaded");
                report.uploaded.push(job.key);
                if let Some(percent) = progress.record() {
                    info!("  Uploaded {percent}% of files");
                }
            }
            Err(err) => {
                warn!(
                    key = %job.key,
                    source = %job.source.display(),
                    error = %err,
                    "upload failed"
                );
                report.failed.push(FailedUpload {
                    entry: job.entry,
                    key: job.key,
                    error: err.to_string(),
                });
            }
        }
    }

    report
}

/// Counts finished uploads and decides when a percentage is worth logging.
///
/// Percentages are tracked in tenths of a percent, floored, so the sequence
/// of reported values never decreases and each 20% band is reported once.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    finished: usize,
    last_logged_tenths: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            finished: 0,
            last_logged_tenths: 0,
        }
    }

    /// Count one finished upload; returns the percentage to report, if any.
    pub fn record(&mut self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        self.finished = (self.finished + 1).min(self.total);
        let tenths = self.finished * 1000 / self.total;
        if tenths - self.last_logged_tenths < PROGRESS_STEP_TENTHS {
            return None;
        }
        self.last_logged_tenths = tenths - tenths % PROGRESS_STEP_TENTHS;
        Some(tenths as f64 / 10.0)
    }
}

/// Content type from the key's extension; unknown types are served as bytes.
pub fn content_type_for(key: &str) -> &'static str {
    let name = key.rsplit('/').next().unwrap_or(key);
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "application/octet-stream",
    };
    match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}
