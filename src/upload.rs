use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use rocket::futures::future::join_all;
use rocket::tokio;
use rocket::tokio::sync::{mpsc, watch};
use serde::Serialize;

use crate::blob::{sniff_content_type, BlobStore};
use crate::content::{validation, ContentError};

/// A file received from a console form, fully buffered.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A file paired with the storage key it will be written under.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub file: UploadFile,
    pub path: String,
}

/// One file that made it all the way: blob, URL and record.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedItem {
    pub path: String,
    pub url: String,
    pub record_id: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub total: usize,
    pub uploaded: Vec<UploadedItem>,
    pub errors: Vec<String>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Status line shown under the form.
    pub fn summary(&self) -> String {
        if self.is_success() {
            format!("Completato: {} / {} file", self.uploaded.len(), self.total)
        } else {
            format!(
                "Errore: {} ({} / {} file caricati)",
                self.errors.join("; "),
                self.uploaded.len(),
                self.total
            )
        }
    }
}

/// Something that can renew the caller's credentials before a batch.
pub trait CredentialRefresh: Send + Sync {
    fn refresh(&self) -> Result<(), String>;
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// `{folder}/{context}-{millis}-{filename}` with whitespace runs turned
/// into `_`. An empty context drops its segment.
pub fn storage_key(folder: &str, context: &str, millis: i64, filename: &str) -> String {
    let stamped = if context.is_empty() {
        format!("{}-{}", millis, filename)
    } else {
        format!("{}-{}-{}", context, millis, filename)
    };
    format!(
        "{}/{}",
        folder.trim_end_matches('/'),
        whitespace_re().replace_all(&stamped, "_")
    )
}

// ── Progress aggregation ───────────────────────────────────

/// Per-file byte table. The aggregate never exceeds 100 and an empty
/// batch counts as one byte so the division is always defined.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    sizes: Vec<u64>,
    transferred: Vec<u64>,
}

impl ProgressAggregator {
    pub fn new(sizes: Vec<u64>) -> Self {
        let transferred = vec![0; sizes.len()];
        ProgressAggregator { sizes, transferred }
    }

    pub fn record(&mut self, index: usize, bytes: u64) -> u8 {
        if let Some(slot) = self.transferred.get_mut(index) {
            *slot = bytes;
        }
        self.percent()
    }

    /// Mark a file fully transferred.
    pub fn complete(&mut self, index: usize) -> u8 {
        let size = self.sizes.get(index).copied().unwrap_or(0);
        if let Some(slot) = self.transferred.get_mut(index) {
            *slot = size.max(*slot);
        }
        self.percent()
    }

    pub fn percent(&self) -> u8 {
        let total: u64 = self.sizes.iter().sum::<u64>().max(1);
        let sum: u64 = self.transferred.iter().sum();
        (sum.saturating_mul(100) / total).min(100) as u8
    }
}

// ── Per-form indicator ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ProgressState {
    pub busy: bool,
    pub visible: bool,
    pub percent: u8,
    pub label: String,
}

/// Progress indicator of one console form. Observers subscribe to the
/// watch channel; the indicator hides itself a fixed delay after a batch.
pub struct UploadTracker {
    tx: watch::Sender<ProgressState>,
    generation: AtomicU64,
    reset_after: Duration,
}

impl UploadTracker {
    pub fn new(reset_after: Duration) -> Self {
        let (tx, _rx) = watch::channel(ProgressState::default());
        UploadTracker {
            tx,
            generation: AtomicU64::new(0),
            reset_after,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> ProgressState {
        self.tx.borrow().clone()
    }

    /// Mark the form busy. Returns false when a batch is already running.
    pub fn begin(&self) -> bool {
        let mut started = false;
        self.tx.send_if_modified(|s| {
            if s.busy {
                return false;
            }
            *s = ProgressState {
                busy: true,
                visible: true,
                percent: 0,
                label: "Preparazione…".to_string(),
            };
            started = true;
            true
        });
        if started {
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        started
    }

    pub fn update(&self, done: usize, total: usize, percent: u8) {
        let current = (done + 1).min(total);
        self.tx.send_modify(|s| {
            s.percent = percent;
            s.label = format!("Caricamento {}/{}… {}%", current, total, percent);
        });
    }

    /// Release the form and schedule the reset of the indicator.
    pub fn finish(self: &Arc<Self>, label: String, percent: u8) {
        self.tx.send_modify(|s| {
            s.busy = false;
            s.percent = percent;
            s.label = label;
        });
        let generation = self.generation.load(Ordering::SeqCst);
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(tracker.reset_after).await;
            // A newer batch owns the indicator now.
            if tracker.generation.load(Ordering::SeqCst) == generation {
                tracker.tx.send_if_modified(|s| {
                    if s.busy {
                        return false;
                    }
                    *s = ProgressState::default();
                    true
                });
            }
        });
    }
}

/// One tracker per console form that uploads.
pub struct UploadTrackers {
    pub posts: Arc<UploadTracker>,
    pub gallery: Arc<UploadTracker>,
    pub featured: Arc<UploadTracker>,
}

impl UploadTrackers {
    pub fn new(reset_after: Duration) -> Self {
        UploadTrackers {
            posts: Arc::new(UploadTracker::new(reset_after)),
            gallery: Arc::new(UploadTracker::new(reset_after)),
            featured: Arc::new(UploadTracker::new(reset_after)),
        }
    }

    pub fn by_name(&self, form: &str) -> Option<&Arc<UploadTracker>> {
        match form {
            "posts" => Some(&self.posts),
            "gallery" => Some(&self.gallery),
            "featured" => Some(&self.featured),
            _ => None,
        }
    }
}

// ── Batch ───────────────────────────────────────────────────

enum Tick {
    Bytes(usize, u64),
    Done(usize),
}

/// Upload every file concurrently and write one record per file.
///
/// `write_record` receives the pending upload and its download URL and
/// returns the new record id. A file counts as uploaded only when all
/// three steps succeed; when the record write fails its blob is removed
/// again. Finished files are never rolled back because a sibling failed.
pub async fn upload_batch<F>(
    blobs: &dyn BlobStore,
    refresher: &dyn CredentialRefresh,
    tracker: Option<&Arc<UploadTracker>>,
    uploads: Vec<PendingUpload>,
    write_record: F,
) -> Result<BatchReport, ContentError>
where
    F: Fn(&PendingUpload, &str) -> Result<String, String> + Sync,
{
    if uploads.is_empty() {
        return Err(validation("Seleziona almeno un file"));
    }
    if let Some(t) = tracker {
        if !t.begin() {
            return Err(validation("Caricamento già in corso"));
        }
    }

    if let Err(e) = refresher.refresh() {
        log::warn!("Credential refresh before upload failed: {}", e);
    }

    let total = uploads.len();
    let mut aggregator = ProgressAggregator::new(uploads.iter().map(|u| u.file.size()).collect());
    let (tx, mut rx) = mpsc::unbounded_channel::<Tick>();
    let write_record = &write_record;

    let tasks: Vec<_> = uploads
        .iter()
        .enumerate()
        .map(|(idx, up)| {
            let tx = tx.clone();
            async move {
                let report = |n: u64| {
                    let _ = tx.send(Tick::Bytes(idx, n));
                };
                let content_type = sniff_content_type(&up.file.data, up.file.content_type.as_deref());
                blobs
                    .put(&up.path, &up.file.data, &content_type, &report)
                    .await
                    .map_err(|e| format!("{}: {}", up.file.name, e))?;
                let _ = tx.send(Tick::Done(idx));

                let url = blobs
                    .download_url(&up.path)
                    .await
                    .map_err(|e| format!("{}: {}", up.file.name, e))?;
                match write_record(up, &url) {
                    Ok(record_id) => Ok(UploadedItem {
                        path: up.path.clone(),
                        url,
                        record_id,
                    }),
                    Err(e) => {
                        if let Err(de) = blobs.delete_by_path(&up.path).await {
                            log::warn!("Orphan blob {} not removed: {}", up.path, de);
                        }
                        Err(format!("{}: {}", up.file.name, e))
                    }
                }
            }
        })
        .collect();
    drop(tx);

    let progress = async {
        let mut done = 0usize;
        while let Some(tick) = rx.recv().await {
            let percent = match tick {
                Tick::Bytes(idx, n) => aggregator.record(idx, n),
                Tick::Done(idx) => {
                    done += 1;
                    aggregator.complete(idx)
                }
            };
            if let Some(t) = tracker {
                t.update(done, total, percent);
            }
        }
        aggregator.percent()
    };

    let (results, percent) = tokio::join!(join_all(tasks), progress);

    let mut report = BatchReport {
        total,
        ..Default::default()
    };
    for r in results {
        match r {
            Ok(item) => report.uploaded.push(item),
            Err(e) => {
                log::error!("Upload failed: {}", e);
                report.errors.push(e);
            }
        }
    }
    log::info!("Upload batch: {} / {} file", report.uploaded.len(), total);

    if let Some(t) = tracker {
        let shown = if report.is_success() { 100 } else { percent };
        t.finish(report.summary(), shown);
    }
    Ok(report)
}
