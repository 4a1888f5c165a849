//! Job lifecycle tracking for enrichment requests.
//!
//! Each request gets an [`EnrichmentJob`] that moves
//! `Pending -> InProgress -> {Success, Failed, Partial}`; terminal
//! states are final. Completed jobs move from the active map into a
//! bounded history buffer (capacity 1000, oldest evicted first).

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::domain::{EnrichmentStatus, ErrorCategory};

/// Completed jobs retained for status queries.
const JOB_HISTORY_CAPACITY: usize = 1000;

/// Timing and effort counters for one job.
#[derive(Debug, Clone)]
pub struct ProcessingMetrics {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub processing_time_seconds: Option<f64>,
    pub api_calls_made: u32,
    pub cache_hits: u32,
    pub sources_used: Vec<String>,
}

impl ProcessingMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            completed_at: None,
            processing_time_seconds: None,
            api_calls_made: 0,
            cache_hits: 0,
            sources_used: Vec::new(),
        }
    }

    pub fn mark_completed(&mut self) {
        let now = Utc::now();
        self.processing_time_seconds = Some((now - self.started_at).as_seconds_f64());
        self.completed_at = Some(now);
    }
}

impl Default for ProcessingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// The mutable record of one enrichment attempt.
#[derive(Debug, Clone)]
pub struct EnrichmentJob {
    pub job_id: Uuid,
    /// Threads this request through logs and the final result
    pub correlation_id: Uuid,
    pub isbn: String,
    pub status: EnrichmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub force_refresh: bool,
    pub min_quality_score: Option<f64>,
    pub quality_score: Option<f64>,
    pub completeness_score: Option<f64>,
    pub error_message: Option<String>,
    pub error_category: Option<ErrorCategory>,
    pub processing_metrics: ProcessingMetrics,
    pub has_warnings: bool,
    pub requires_review: bool,
    /// Human-readable quality concerns accumulated during processing
    pub suspicious_data_flags: Vec<String>,
}

impl EnrichmentJob {
    pub fn new(isbn: impl Into<String>, correlation_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4(),
            correlation_id: correlation_id.unwrap_or_else(Uuid::new_v4),
            isbn: isbn.into(),
            status: EnrichmentStatus::Pending,
            created_at: now,
            updated_at: now,
            force_refresh: false,
            min_quality_score: None,
            quality_score: None,
            completeness_score: None,
            error_message: None,
            error_category: None,
            processing_metrics: ProcessingMetrics::new(),
            has_warnings: false,
            requires_review: false,
            suspicious_data_flags: Vec::new(),
        }
    }

    /// Move to a new state. Terminal states are final; a change request
    /// against one is logged and ignored.
    pub fn update_status(&mut self, status: EnrichmentStatus) {
        if self.status.is_terminal() {
            tracing::warn!(
                job_id = %self.job_id,
                current = %self.status,
                requested = %status,
                "ignoring status change on terminal job"
            );
            return;
        }
        self.status = status;
        self.touch();
    }

    /// Record a failure and move to `Failed`.
    pub fn set_error(&mut self, message: impl Into<String>, category: ErrorCategory) {
        self.error_message = Some(message.into());
        self.error_category = Some(category);
        self.update_status(EnrichmentStatus::Failed);
    }

    pub fn set_quality_scores(&mut self, quality_score: f64, completeness_score: Option<f64>) {
        self.quality_score = Some(quality_score);
        if completeness_score.is_some() {
            self.completeness_score = completeness_score;
        }
        self.touch();
    }

    pub fn add_quality_warnings(&mut self, warnings: &[String]) {
        if warnings.is_empty() {
            return;
        }
        self.has_warnings = true;
        self.suspicious_data_flags.extend_from_slice(warnings);
        self.touch();
    }

    pub fn mark_for_review(&mut self, reason: Option<&str>) {
        self.requires_review = true;
        if let Some(reason) = reason {
            self.suspicious_data_flags
                .push(format!("Review required: {reason}"));
        }
        self.touch();
    }

    /// Close out the job's timing once a terminal state is reached.
    pub fn complete(&mut self) {
        self.processing_metrics.mark_completed();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Batch status; a batch is `Processing` until every job resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Processing,
    Completed,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Progress counters over a batch of enrichment jobs.
#[derive(Debug, Clone)]
pub struct BatchEnrichmentJob {
    pub batch_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_books: usize,
    pub completed_jobs: usize,
    pub successful_jobs: usize,
    pub failed_jobs: usize,
    pub partial_jobs: usize,
    pub status: BatchStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl BatchEnrichmentJob {
    pub fn new(total_books: usize) -> Self {
        let now = Utc::now();
        Self {
            batch_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            total_books,
            completed_jobs: 0,
            successful_jobs: 0,
            failed_jobs: 0,
            partial_jobs: 0,
            status: BatchStatus::Processing,
            started_at: None,
            completed_at: None,
        }
    }

    /// Mark the batch started. An empty batch completes immediately.
    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
        self.touch();
        if self.completed_jobs >= self.total_books {
            self.complete();
        }
    }

    /// Count one resolved job by its terminal status; completes the
    /// batch once every job has resolved.
    pub fn record_result(&mut self, status: EnrichmentStatus) {
        self.completed_jobs += 1;
        match status {
            EnrichmentStatus::Success => self.successful_jobs += 1,
            EnrichmentStatus::Failed => self.failed_jobs += 1,
            EnrichmentStatus::Partial => self.partial_jobs += 1,
            EnrichmentStatus::Pending | EnrichmentStatus::InProgress => {}
        }
        self.touch();
        if self.completed_jobs >= self.total_books {
            self.complete();
        }
    }

    /// Percentage of resolved jobs that fully succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.completed_jobs == 0 {
            return 0.0;
        }
        self.successful_jobs as f64 / self.completed_jobs as f64 * 100.0
    }

    fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
        self.status = BatchStatus::Completed;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Thread-safe registry of in-flight jobs plus a bounded history of
/// completed ones.
#[derive(Debug)]
pub struct JobTracker {
    active: Mutex<HashMap<Uuid, EnrichmentJob>>,
    history: Mutex<VecDeque<EnrichmentJob>>,
    capacity: usize,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::with_capacity(JOB_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Upsert a snapshot of a job into the active map.
    pub fn track(&self, job: &EnrichmentJob) {
        self.active.lock().insert(job.job_id, job.clone());
    }

    /// Remove a job from the active map and append it to history,
    /// evicting the oldest entry when full.
    pub fn archive(&self, job: &EnrichmentJob) {
        self.active.lock().remove(&job.job_id);
        let mut history = self.history.lock();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(job.clone());
    }

    /// Look a job up by id, checking active jobs before history.
    pub fn get(&self, job_id: Uuid) -> Option<EnrichmentJob> {
        if let Some(job) = self.active.lock().get(&job_id) {
            return Some(job.clone());
        }
        self.history
            .lock()
            .iter()
            .rev()
            .find(|job| job.job_id == job_id)
            .cloned()
    }

    /// Snapshot of every currently active job.
    pub fn active_jobs(&self) -> Vec<EnrichmentJob> {
        self.active.lock().values().cloned().collect()
    }

    /// Most recently completed jobs, newest first.
    pub fn history(&self, limit: usize) -> Vec<EnrichmentJob> {
        self.history
            .lock()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn active_len(&self) -> usize {
        self.active.lock().len()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}
