//! Metrics collection and reporting for production monitoring
//!
//! Tracks request counts, error rate, and inference latency. Metrics are
//! exposed in Prometheus text format via `GET /metrics` for scrape-based
//! monitoring.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Central metrics collector shared across request handlers
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    /// Total number of prediction requests processed
    total_requests: Arc<AtomicUsize>,
    /// Requests that produced a prediction
    successful_requests: Arc<AtomicUsize>,
    /// Requests that failed in the model or adapter
    failed_requests: Arc<AtomicUsize>,
    /// Cumulative inference time in microseconds
    total_inference_time_us: Arc<AtomicU64>,
    /// Start time for rate calculations
    start_time: Instant,
}

impl MetricsCollector {
    /// Create a new metrics collector
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_requests: Arc::new(AtomicUsize::new(0)),
            successful_requests: Arc::new(AtomicUsize::new(0)),
            failed_requests: Arc::new(AtomicUsize::new(0)),
            total_inference_time_us: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction and its latency
    pub fn record_success(&self, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
        self.total_inference_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record a failed prediction
    pub fn record_failure(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all metrics
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let failed = self.failed_requests.load(Ordering::Relaxed);
        let total_time_us = self.total_inference_time_us.load(Ordering::Relaxed);
        let uptime = self.start_time.elapsed();

        MetricsSnapshot {
            total_requests,
            successful_requests: successful,
            failed_requests: failed,
            total_inference_time_us: total_time_us,
            uptime_secs: uptime.as_secs(),
            requests_per_sec: if uptime.as_secs() > 0 {
                total_requests as f64 / uptime.as_secs_f64()
            } else {
                0.0
            },
            avg_latency_ms: if successful > 0 {
                (total_time_us as f64 / 1000.0) / successful as f64
            } else {
                0.0
            },
            error_rate: if total_requests > 0 {
                failed as f64 / total_requests as f64
            } else {
                0.0
            },
        }
    }

    /// Export metrics in Prometheus text exposition format
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "# HELP tasar_requests_total Total number of prediction requests\n\
             # TYPE tasar_requests_total counter\n\
             tasar_requests_total {}\n\
             # HELP tasar_requests_successful Successful prediction requests\n\
             # TYPE tasar_requests_successful counter\n\
             tasar_requests_successful {}\n\
             # HELP tasar_requests_failed Failed prediction requests\n\
             # TYPE tasar_requests_failed counter\n\
             tasar_requests_failed {}\n\
             # HELP tasar_avg_latency_ms Average inference latency in milliseconds\n\
             # TYPE tasar_avg_latency_ms gauge\n\
             tasar_avg_latency_ms {:.3}\n\
             # HELP tasar_requests_per_sec Request throughput\n\
             # TYPE tasar_requests_per_sec gauge\n\
             tasar_requests_per_sec {:.3}\n\
             # HELP tasar_error_rate Fraction of requests that failed\n\
             # TYPE tasar_error_rate gauge\n\
             tasar_error_rate {:.4}\n\
             # HELP tasar_uptime_seconds Server uptime in seconds\n\
             # TYPE tasar_uptime_seconds counter\n\
             tasar_uptime_seconds {}\n",
            snapshot.total_requests,
            snapshot.successful_requests,
            snapshot.failed_requests,
            snapshot.avg_latency_ms,
            snapshot.requests_per_sec,
            snapshot.error_rate,
            snapshot.uptime_secs,
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of collected metrics
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Total prediction requests
    pub total_requests: usize,
    /// Requests that produced a prediction
    pub successful_requests: usize,
    /// Requests that failed
    pub failed_requests: usize,
    /// Cumulative inference time in microseconds
    pub total_inference_time_us: u64,
    /// Seconds since collector creation
    pub uptime_secs: u64,
    /// Requests per second since startup
    pub requests_per_sec: f64,
    /// Mean inference latency over successful requests, milliseconds
    pub avg_latency_ms: f64,
    /// Failed requests as a fraction of total
    pub error_rate: f64,
}
