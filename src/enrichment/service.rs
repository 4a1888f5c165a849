//! Enrichment service - orchestrates ISBN lookup, caching, and quality checks
//!
//! This is the high-level API for enriching book records:
//! 1. Normalize the requested ISBN (rejects bad input before any work)
//! 2. Serve from the response cache when possible
//! 3. Fetch from the catalog source under a per-request deadline
//! 4. Score the record and decide success vs partial quality
//! 5. Track a job from Pending to a terminal state, then archive it
//!
//! Every request produces an `EnrichmentResult` and an archived
//! `EnrichmentJob`; failures are reported in the result, never as a
//! panic or an early return.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::enrichment::cache::{ResponseCache, cache_key};
use crate::enrichment::domain::{
    BookMetadata, CatalogError, EnrichmentRequest, EnrichmentResult, EnrichmentStatus,
    ErrorCategory, SearchQuery, SearchResult,
};
use crate::enrichment::job::{BatchEnrichmentJob, EnrichmentJob, JobTracker};
use crate::enrichment::metrics::{
    ApiMetricsSummary, CallMetric, HealthReport, HealthStatus, MetricsRecorder, SourceHealth,
};
use crate::enrichment::quality;
use crate::enrichment::traits::BookCatalog;
use crate::isbn;

/// Warnings at or above this count flag a record for manual review
const REVIEW_WARNING_THRESHOLD: usize = 3;

/// Metrics window reported by health checks
const HEALTH_METRICS_WINDOW_MINUTES: i64 = 15;

/// Configuration for the enrichment service
pub struct EnrichmentConfig {
    /// Hard deadline for one enrichment, catalog time included
    pub timeout: Duration,
    /// Concurrent enrichments allowed before requests queue
    pub max_concurrent: usize,
    /// Minimum acceptable quality score (0.0 to 1.0)
    pub min_quality_score: f64,
    /// How long fetched records stay servable from the cache
    pub cache_ttl: Duration,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_concurrent: 100,
            min_quality_score: 0.6,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Service for enriching book records from an external catalog
pub struct EnrichmentService<C: BookCatalog> {
    config: EnrichmentConfig,
    catalog: C,
    cache: ResponseCache<BookMetadata>,
    metrics: MetricsRecorder,
    tracker: JobTracker,
    gate: Semaphore,
}

impl<C: BookCatalog> EnrichmentService<C> {
    /// Create a new enrichment service with the given config
    pub fn new(catalog: C, config: EnrichmentConfig) -> Self {
        Self {
            cache: ResponseCache::new(config.cache_ttl),
            metrics: MetricsRecorder::new(),
            tracker: JobTracker::new(),
            gate: Semaphore::new(config.max_concurrent),
            catalog,
            config,
        }
    }

    /// Enrich a single book.
    ///
    /// Always returns a result; the status tells the story. `Failed`
    /// carries an error message, `Partial` carries metadata that missed
    /// the quality bar, `Success` carries metadata that cleared it.
    pub async fn enrich_book(&self, request: EnrichmentRequest) -> EnrichmentResult {
        let started = Instant::now();
        let correlation_id = request.correlation_id.unwrap_or_else(Uuid::new_v4);

        let mut job = EnrichmentJob::new(&request.isbn, Some(correlation_id));
        job.force_refresh = request.force_refresh;
        job.min_quality_score = request.min_quality_score;
        self.tracker.track(&job);

        // Step 1: validate before spending a permit or a cache lookup
        let metadata = match isbn::normalize(&request.isbn) {
            Err(e) => {
                warn!(
                    isbn = %request.isbn,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Rejecting invalid ISBN"
                );
                job.set_error(e.to_string(), ErrorCategory::Validation);
                None
            }
            Ok(normalized) => {
                job.isbn = normalized.clone();
                job.update_status(EnrichmentStatus::InProgress);
                self.tracker.track(&job);
                self.enrich_gated(&normalized, &request, &mut job).await
            }
        };

        // Step 5: close out and archive
        job.complete();
        self.tracker.archive(&job);

        let processing_time = started.elapsed().as_secs_f64();
        info!(
            isbn = %job.isbn,
            correlation_id = %correlation_id,
            status = %job.status,
            processing_time,
            "Enrichment finished"
        );

        EnrichmentResult {
            isbn: job.isbn.clone(),
            status: job.status,
            correlation_id,
            timestamp: Utc::now(),
            metadata,
            error: job.error_message.clone(),
            quality_score: job.quality_score,
            sources_used: job.processing_metrics.sources_used.clone(),
            processing_time,
        }
    }

    /// The gated part of enrichment: fetch under the deadline, then
    /// assess quality. Returns metadata for Success and Partial
    /// outcomes; failure detail lands on the job.
    async fn enrich_gated(
        &self,
        isbn: &str,
        request: &EnrichmentRequest,
        job: &mut EnrichmentJob,
    ) -> Option<BookMetadata> {
        // Step 2: concurrency gate. The semaphore is never closed
        // while the service is alive.
        let Ok(_permit) = self.gate.acquire().await else {
            job.set_error(
                "Unexpected error: enrichment gate closed",
                ErrorCategory::Unknown,
            );
            return None;
        };

        // Step 3: fetch under the request deadline
        let fetched = tokio::time::timeout(
            self.config.timeout,
            self.fetch_with_cache(isbn, request.force_refresh, job),
        )
        .await;

        match fetched {
            Err(_) => {
                let seconds = self.config.timeout.as_secs_f64();
                warn!(isbn, timeout_seconds = seconds, "Enrichment timed out");
                job.set_error(
                    format!("Enrichment timeout after {seconds}s"),
                    ErrorCategory::Timeout,
                );
                None
            }
            Ok(Err(e)) => {
                warn!(isbn, error = %e, kind = e.kind(), "Enrichment failed unexpectedly");
                job.set_error(format!("Unexpected error: {e}"), ErrorCategory::Unknown);
                None
            }
            Ok(Ok(None)) => {
                info!(isbn, "Book not found in catalog");
                job.set_error(
                    format!("Book not found in {}", self.catalog.display_name()),
                    ErrorCategory::Api,
                );
                None
            }
            Ok(Ok(Some(metadata))) => Some(self.assess_quality(metadata, request, job)),
        }
    }

    /// Cache-aware fetch. A hit counts as a cache source; a miss calls
    /// the catalog, records the call metric, and refreshes the cache.
    async fn fetch_with_cache(
        &self,
        isbn: &str,
        force_refresh: bool,
        job: &mut EnrichmentJob,
    ) -> Result<Option<BookMetadata>, CatalogError> {
        let source = self.catalog.name();
        let key = cache_key(source, "fetch_book", &[("isbn", isbn.to_string())]);

        if !force_refresh && let Some(metadata) = self.cache.get(&key) {
            info!(isbn, "Serving book from cache");
            self.metrics.record_cache_hit();
            job.processing_metrics.cache_hits += 1;
            job.processing_metrics
                .sources_used
                .push(format!("{source}:cached"));
            return Ok(Some(metadata));
        }

        let call_started = Instant::now();
        let outcome = self.catalog.fetch_by_isbn(isbn).await;
        job.processing_metrics.api_calls_made += 1;
        self.metrics.record(CallMetric {
            api_name: source.to_string(),
            method: "fetch_book".to_string(),
            duration: call_started.elapsed(),
            success: outcome.is_ok(),
            error_type: outcome.as_ref().err().map(|e| e.kind().to_string()),
            timestamp: Utc::now(),
        });

        // The source was consulted even when the call failed
        job.processing_metrics.sources_used.push(source.to_string());
        let fetched = outcome?;
        // A force_refresh read-around still writes the fresh record back
        if let Some(ref metadata) = fetched {
            self.cache.put(key, metadata.clone());
        }
        Ok(fetched)
    }

    /// Step 4: score the record and decide Success vs Partial
    fn assess_quality(
        &self,
        metadata: BookMetadata,
        request: &EnrichmentRequest,
        job: &mut EnrichmentJob,
    ) -> BookMetadata {
        let min_quality = request
            .min_quality_score
            .unwrap_or(self.config.min_quality_score);
        // The completeness report works on a 0-100 scale
        let report = quality::validate_metadata_quality(&metadata, min_quality * 100.0);

        let warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();
        job.add_quality_warnings(&warnings);
        if report.suspicion_level >= REVIEW_WARNING_THRESHOLD {
            let reason = format!("{} data quality warnings", report.suspicion_level);
            job.mark_for_review(Some(&reason));
        }
        job.set_quality_scores(metadata.quality_score, Some(report.completeness_score));

        if metadata.quality_score < min_quality {
            let message = format!(
                "Data quality below threshold: {:.2} < {:.2}",
                metadata.quality_score, min_quality
            );
            info!(
                isbn = %metadata.isbn_13,
                quality_score = metadata.quality_score,
                "Keeping record despite partial quality"
            );
            job.error_message = Some(message);
            job.error_category = Some(ErrorCategory::Quality);
            job.update_status(EnrichmentStatus::Partial);
        } else {
            job.update_status(EnrichmentStatus::Success);
        }
        metadata
    }

    /// Enrich multiple books concurrently.
    ///
    /// Results come back in input order regardless of which lookups
    /// finish first. Concurrency is bounded by `max_concurrent`.
    pub async fn batch_enrich_books(
        &self,
        isbns: &[String],
        force_refresh: bool,
        min_quality_score: Option<f64>,
    ) -> Vec<EnrichmentResult> {
        let batch = Arc::new(Mutex::new(BatchEnrichmentJob::new(isbns.len())));
        batch.lock().start();
        info!(
            batch_id = %batch.lock().batch_id,
            total = isbns.len(),
            "Starting batch enrichment"
        );

        let tasks = isbns.iter().map(|isbn| {
            let batch = Arc::clone(&batch);
            async move {
                let request = EnrichmentRequest {
                    isbn: isbn.clone(),
                    force_refresh,
                    min_quality_score,
                    correlation_id: None,
                };
                let result = self.enrich_book(request).await;
                batch.lock().record_result(result.status);
                result
            }
        });
        let results = join_all(tasks).await;

        let summary = batch.lock();
        info!(
            batch_id = %summary.batch_id,
            total = summary.total_books,
            successful = summary.successful_jobs,
            failed = summary.failed_jobs,
            partial = summary.partial_jobs,
            success_rate = format!("{:.1}%", summary.success_rate()),
            "Batch enrichment completed"
        );
        results
    }

    /// Search the catalog for books by title and/or author
    pub async fn search_books(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        let call_started = Instant::now();
        let outcome = self.catalog.search(query).await;
        self.metrics.record(CallMetric {
            api_name: self.catalog.name().to_string(),
            method: "search_books".to_string(),
            duration: call_started.elapsed(),
            success: outcome.is_ok(),
            error_type: outcome.as_ref().err().map(|e| e.kind().to_string()),
            timestamp: Utc::now(),
        });
        outcome
    }

    /// Look up a job by id, checking active jobs first, then history
    pub fn get_job_status(&self, job_id: Uuid) -> Option<EnrichmentJob> {
        self.tracker.get(job_id)
    }

    /// Jobs currently in flight
    pub fn get_active_jobs(&self) -> Vec<EnrichmentJob> {
        self.tracker.active_jobs()
    }

    /// Recently completed jobs, newest first
    pub fn get_job_history(&self, limit: usize) -> Vec<EnrichmentJob> {
        self.tracker.history(limit)
    }

    /// Probe the catalog and assemble a health report.
    ///
    /// The service is `Degraded` when its only source fails the probe;
    /// enrichment still works for cached books.
    pub async fn health_check(&self) -> HealthReport {
        let source = self.catalog.name();
        let available = self.catalog.health_check().await;
        if !available {
            warn!(source, "Catalog source failed health probe");
        }

        let mut sources = BTreeMap::new();
        sources.insert(source.to_string(), SourceHealth::from_probe(available));

        let status = if available {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        let mut recent_metrics = self.metrics.summary(HEALTH_METRICS_WINDOW_MINUTES);
        recent_metrics.cache_size = self.cache.len();

        HealthReport {
            status,
            sources,
            cache_size: self.cache.len(),
            recent_metrics,
            checked_at: Utc::now(),
        }
    }

    /// Aggregated call metrics over the given window
    pub fn api_metrics(&self, window_minutes: i64) -> ApiMetricsSummary {
        let mut summary = self.metrics.summary(window_minutes);
        summary.cache_size = self.cache.len();
        summary
    }

    /// Drop every cached record; returns how many were dropped
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    /// Drop only expired cache entries; returns how many were dropped
    pub fn cleanup_expired_cache(&self) -> usize {
        self.cache.cleanup_expired()
    }
}
