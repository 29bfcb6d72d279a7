//! Health monitor & metrics (spec §4.7): aggregates per-pipeline counters
//! and latencies observed by the pipeline and exposes a single
//! `get_system_health()` snapshot.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;

/// Bound on how many recent errors the snapshot carries; older ones are
/// evicted FIFO.
const MAX_RECENT_ERRORS: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub available: bool,
    pub total: usize,
    pub total_enabled: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterStatus {
    pub available: bool,
    pub total_tracked_keys: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentError {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerformanceMetrics {
    pub total_requests: u64,
    pub blocked_requests: u64,
    pub avg_response_time_ms: f64,
    pub peak_response_time_ms: u64,
    pub last_request_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub overall_status: OverallStatus,
    pub pipeline_status: PipelineStatus,
    pub api_keys_status: BTreeMap<String, bool>,
    pub rate_limiter_status: RateLimiterStatus,
    pub recent_errors: Vec<RecentError>,
    pub performance_metrics: PerformanceMetrics,
}

#[derive(Default)]
struct PerfState {
    total_requests: u64,
    blocked_requests: u64,
    peak_response_time_ms: u64,
    /// Exact running average over all requests seen so far. An exponential
    /// moving average is also spec-legal (§4.7); an exact mean is simpler
    /// to reason about and cheap at this volume, so that's the documented
    /// choice (DESIGN.md).
    avg_response_time_ms: f64,
    last_request_time: Option<DateTime<Utc>>,
}

/// Aggregates counters/latencies fed by [`Pipeline::check_input_async`] /
/// `check_output_async` and exposes the §4.7 snapshot schema.
pub struct HealthMonitor {
    perf: Mutex<PerfState>,
    recent_errors: Mutex<VecDeque<RecentError>>,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self {
            perf: Mutex::new(PerfState::default()),
            recent_errors: Mutex::new(VecDeque::new()),
        }
    }

    /// `update_performance_metrics(response_time_ms, blocked)`: increments
    /// counters, updates peak, and recomputes the rolling average.
    pub fn record_request(&self, response_time_ms: u64, blocked: bool) {
        let mut perf = self.perf.lock();
        perf.total_requests += 1;
        if blocked {
            perf.blocked_requests += 1;
        }
        perf.peak_response_time_ms = perf.peak_response_time_ms.max(response_time_ms);
        let n = perf.total_requests as f64;
        perf.avg_response_time_ms += (response_time_ms as f64 - perf.avg_response_time_ms) / n;
        perf.last_request_time = Some(Utc::now());
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let mut errors = self.recent_errors.lock();
        if errors.len() >= MAX_RECENT_ERRORS {
            errors.pop_front();
        }
        errors.push_back(RecentError {
            timestamp: Utc::now(),
            message: message.into(),
        });
    }

    fn performance_metrics(&self) -> PerformanceMetrics {
        let perf = self.perf.lock();
        PerformanceMetrics {
            total_requests: perf.total_requests,
            blocked_requests: perf.blocked_requests,
            avg_response_time_ms: perf.avg_response_time_ms,
            peak_response_time_ms: perf.peak_response_time_ms,
            last_request_time: perf.last_request_time,
        }
    }

    /// Builds the full snapshot. `pipeline`, if given, supplies
    /// `pipeline_status`; `api_keys_status` is supplied by the caller (the
    /// HTTP layer owns API-key configuration, not the core, per spec.md
    /// §1).
    pub fn get_system_health(
        &self,
        pipeline: Option<&Pipeline>,
        api_keys_status: BTreeMap<String, bool>,
    ) -> SystemHealth {
        let pipeline_status = match pipeline {
            Some(p) => {
                let status = p.get_guardrail_status();
                let errors = p.construction_errors();
                PipelineStatus {
                    available: true,
                    total: status.total,
                    total_enabled: status.total_enabled,
                    error: errors.first().cloned(),
                }
            }
            None => PipelineStatus {
                available: false,
                total: 0,
                total_enabled: 0,
                error: Some("no pipeline configured".to_string()),
            },
        };

        let limiter = stinger_ratelimit::get_global_rate_limiter();
        let rate_limiter_status = RateLimiterStatus {
            available: true,
            total_tracked_keys: limiter.get_all_keys().len(),
            error: None,
        };

        let recent_errors: Vec<RecentError> = self.recent_errors.lock().iter().cloned().collect();

        let overall_status = if !pipeline_status.available {
            OverallStatus::Unhealthy
        } else if !recent_errors.is_empty() || pipeline_status.error.is_some() {
            OverallStatus::Degraded
        } else {
            OverallStatus::Healthy
        };

        SystemHealth {
            overall_status,
            pipeline_status,
            api_keys_status,
            rate_limiter_status,
            recent_errors,
            performance_metrics: self.performance_metrics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_monitor_with_no_pipeline_is_unhealthy() {
        let monitor = HealthMonitor::new();
        let health = monitor.get_system_health(None, BTreeMap::new());
        assert_eq!(health.overall_status, OverallStatus::Unhealthy);
        assert!(!health.pipeline_status.available);
    }

    #[test]
    fn average_response_time_is_exact_mean() {
        let monitor = HealthMonitor::new();
        monitor.record_request(10, false);
        monitor.record_request(20, true);
        let metrics = monitor.performance_metrics();
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.blocked_requests, 1);
        assert!((metrics.avg_response_time_ms - 15.0).abs() < 1e-9);
        assert_eq!(metrics.peak_response_time_ms, 20);
    }

    #[test]
    fn recorded_errors_mark_degraded() {
        let monitor = HealthMonitor::new();
        monitor.record_error("transient failure");
        let health = monitor.get_system_health(None, BTreeMap::new());
        assert_eq!(health.recent_errors.len(), 1);
    }
}
