//! Per-call metrics and aggregate health for upstream sources.
//!
//! Every outbound call records its latency and outcome into a bounded
//! ring buffer (capacity 1000, oldest evicted). Summaries aggregate a
//! trailing time window; health reports combine a live source probe
//! with the recent failure picture.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Most recent calls kept for aggregation.
const METRICS_CAPACITY: usize = 1000;

/// One outbound API call's outcome.
#[derive(Debug, Clone)]
pub struct CallMetric {
    pub api_name: String,
    pub method: String,
    pub duration: Duration,
    /// True when the upstream answered cleanly - including "not found"
    pub success: bool,
    pub error_type: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate of one API's recent calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiBreakdown {
    pub total_calls: usize,
    pub successful_calls: usize,
    pub failed_calls: usize,
    pub avg_duration_secs: f64,
    /// Error kinds seen, one entry per failed call
    pub errors: Vec<String>,
}

/// Metrics over a trailing window, across all sources.
#[derive(Debug, Clone, Serialize)]
pub struct ApiMetricsSummary {
    pub window_minutes: i64,
    pub total_calls: usize,
    pub successful_calls: usize,
    pub failed_calls: usize,
    /// Percentage of calls that succeeded, 0.0-100.0
    pub success_rate: f64,
    pub average_duration_secs: f64,
    pub apis: BTreeMap<String, ApiBreakdown>,
    pub cache_hits: u64,
    /// Filled in by whoever owns the response cache
    pub cache_size: usize,
}

/// Records call outcomes into a bounded buffer and aggregates them.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    calls: Mutex<VecDeque<CallMetric>>,
    cache_hits: AtomicU64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, metric: CallMetric) {
        let mut calls = self.calls.lock();
        if calls.len() == METRICS_CAPACITY {
            calls.pop_front();
        }
        calls.push_back(metric);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Aggregate all calls within the last `window_minutes`.
    pub fn summary(&self, window_minutes: i64) -> ApiMetricsSummary {
        let cutoff = Utc::now() - chrono::Duration::minutes(window_minutes);
        let calls = self.calls.lock();
        let recent: Vec<&CallMetric> = calls.iter().filter(|m| m.timestamp >= cutoff).collect();

        let total_calls = recent.len();
        let successful_calls = recent.iter().filter(|m| m.success).count();
        let failed_calls = total_calls - successful_calls;

        let success_rate = if total_calls > 0 {
            successful_calls as f64 / total_calls as f64 * 100.0
        } else {
            0.0
        };
        let average_duration_secs = if total_calls > 0 {
            recent.iter().map(|m| m.duration.as_secs_f64()).sum::<f64>() / total_calls as f64
        } else {
            0.0
        };

        let mut apis: BTreeMap<String, ApiBreakdown> = BTreeMap::new();
        let mut duration_sums: BTreeMap<String, f64> = BTreeMap::new();
        for metric in &recent {
            let breakdown = apis.entry(metric.api_name.clone()).or_default();
            breakdown.total_calls += 1;
            if metric.success {
                breakdown.successful_calls += 1;
            } else {
                breakdown.failed_calls += 1;
                if let Some(kind) = &metric.error_type {
                    breakdown.errors.push(kind.clone());
                }
            }
            *duration_sums.entry(metric.api_name.clone()).or_default() +=
                metric.duration.as_secs_f64();
        }
        for (api_name, breakdown) in apis.iter_mut() {
            breakdown.avg_duration_secs = duration_sums[api_name] / breakdown.total_calls as f64;
        }

        ApiMetricsSummary {
            window_minutes,
            total_calls,
            successful_calls,
            failed_calls,
            success_rate,
            average_duration_secs,
            apis,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_size: 0,
        }
    }
}

/// Overall service health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

/// Health of one upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SourceHealth {
    pub status: SourceStatus,
    pub available: bool,
}

impl SourceHealth {
    pub fn from_probe(available: bool) -> Self {
        Self {
            status: if available {
                SourceStatus::Healthy
            } else {
                SourceStatus::Unhealthy
            },
            available,
        }
    }
}

/// Snapshot of service health: live probes plus recent metrics.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub sources: BTreeMap<String, SourceHealth>,
    pub cache_size: usize,
    pub recent_metrics: ApiMetricsSummary,
    pub checked_at: DateTime<Utc>,
}
