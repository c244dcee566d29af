//! Per-request metric capture.
//!
//! # Responsibilities
//! - Capture timing, status, and a memory snapshot when a response completes
//! - Keep the bounded request buffer and snapshot history
//! - Publish the latest snapshot for lock-free health queries
//!
//! # Design Decisions
//! - Recording happens on the response path only; the request path is
//!   untouched and response timing is not observably altered
//! - FIFO eviction: the buffer never exceeds its capacity, oldest entries
//!   are silently dropped
//! - Buffers are diagnostic, not durable: everything is lost on restart
//! - Process memory/CPU reads go through a short-lived cache so a burst of
//!   completions does not hammer the kernel

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwapOption;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::config::TelemetryConfig;
use crate::http::request::{client_ip, user_agent};
use crate::observability::metrics;

/// Process memory at a point in time, in bytes.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MemorySnapshot {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl MemorySnapshot {
    pub fn usage_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.total_bytes as f64 * 100.0
        }
    }
}

/// One completed request. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetric {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub response_time_ms: u64,
    pub memory: MemorySnapshot,
    /// Monotonic completion instant, used for window arithmetic.
    #[serde(skip)]
    pub recorded_at: Instant,
    /// Wall-clock completion time for reporting.
    pub timestamp_ms: u64,
    pub client_ip: IpAddr,
    pub user_agent: String,
}

/// Rolling system statistics reduced from the trailing request window.
#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    pub cpu_seconds: f64,
    pub memory: MemorySnapshot,
    pub uptime_seconds: u64,
    pub requests_per_minute: u64,
    pub average_response_time_ms: f64,
    pub error_rate_percent: f64,
    pub taken_at_ms: u64,
}

/// Aggregate over the requests inside one trailing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub count: u64,
    pub average_ms: f64,
    pub error_rate_percent: f64,
}

/// Width of the trailing window a snapshot reduces; fixed at one minute so
/// `requests_per_minute` means what it says, independent of the sampling
/// cadence.
pub const SNAPSHOT_WINDOW: Duration = Duration::from_secs(60);

const PROBE_CACHE_TTL: Duration = Duration::from_millis(250);

/// Process-wide telemetry state. Constructed once at startup and injected
/// into the recorder middleware, the sampler, and the health handlers.
pub struct TelemetryHub {
    request_capacity: usize,
    requests: Mutex<VecDeque<RequestMetric>>,
    snapshot_capacity: usize,
    snapshots: Mutex<VecDeque<SystemSnapshot>>,
    latest: ArcSwapOption<SystemSnapshot>,
    probe: ProcessProbe,
    started_at: Instant,
}

impl TelemetryHub {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            request_capacity: config.request_buffer_size,
            requests: Mutex::new(VecDeque::with_capacity(config.request_buffer_size)),
            snapshot_capacity: config.snapshot_history_size,
            snapshots: Mutex::new(VecDeque::with_capacity(config.snapshot_history_size)),
            latest: ArcSwapOption::const_empty(),
            probe: ProcessProbe::new(),
            started_at: Instant::now(),
        }
    }

    /// Append one completed request, evicting the oldest entry at capacity.
    pub fn record(&self, metric: RequestMetric) {
        let mut requests = self.requests.lock().expect("request buffer mutex poisoned");
        if requests.len() >= self.request_capacity {
            requests.pop_front();
        }
        requests.push_back(metric);
    }

    pub fn recorded_len(&self) -> usize {
        self.requests.lock().expect("request buffer mutex poisoned").len()
    }

    pub fn request_capacity(&self) -> usize {
        self.request_capacity
    }

    /// Most recent `limit` request metrics, newest last.
    pub fn recent_requests(&self, limit: usize) -> Vec<RequestMetric> {
        let requests = self.requests.lock().expect("request buffer mutex poisoned");
        let skip = requests.len().saturating_sub(limit);
        requests.iter().skip(skip).cloned().collect()
    }

    /// Reduce the entries whose completion falls inside the trailing window.
    /// Recomputed from the buffer every time, never incrementally maintained,
    /// so the result is exact relative to what the buffer retains.
    pub fn window_stats(&self, window: Duration) -> WindowStats {
        let now = Instant::now();
        let requests = self.requests.lock().expect("request buffer mutex poisoned");

        let mut count = 0u64;
        let mut total_ms = 0u64;
        let mut errors = 0u64;
        for metric in requests.iter() {
            if now.duration_since(metric.recorded_at) <= window {
                count += 1;
                total_ms += metric.response_time_ms;
                if metric.status >= 400 {
                    errors += 1;
                }
            }
        }

        WindowStats {
            count,
            average_ms: if count == 0 {
                0.0
            } else {
                total_ms as f64 / count as f64
            },
            error_rate_percent: if count == 0 {
                0.0
            } else {
                errors as f64 / count as f64 * 100.0
            },
        }
    }

    /// Take a snapshot now: reduce the trailing window, read process state,
    /// append to the bounded history, and publish as latest.
    pub fn take_sample(&self) -> SystemSnapshot {
        let stats = self.window_stats(SNAPSHOT_WINDOW);
        let (memory, cpu_seconds) = self.probe.read();

        let snapshot = SystemSnapshot {
            cpu_seconds,
            memory,
            uptime_seconds: self.started_at.elapsed().as_secs(),
            requests_per_minute: stats.count,
            average_response_time_ms: stats.average_ms,
            error_rate_percent: stats.error_rate_percent,
            taken_at_ms: epoch_ms(),
        };

        let mut snapshots = self
            .snapshots
            .lock()
            .expect("snapshot history mutex poisoned");
        if snapshots.len() >= self.snapshot_capacity {
            snapshots.pop_front();
        }
        snapshots.push_back(snapshot.clone());
        drop(snapshots);

        self.latest.store(Some(Arc::new(snapshot.clone())));
        snapshot
    }

    pub fn latest_snapshot(&self) -> Option<Arc<SystemSnapshot>> {
        self.latest.load_full()
    }

    pub fn snapshot_history(&self) -> Vec<SystemSnapshot> {
        self.snapshots
            .lock()
            .expect("snapshot history mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn current_memory(&self) -> MemorySnapshot {
        self.probe.read().0
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Outermost middleware: every request that reaches the listener is
/// recorded on completion, including gate rejections and panics mapped
/// to 500 by the catch-panic layer beneath.
pub async fn record_request_metrics(
    State(hub): State<Arc<TelemetryHub>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let ip = client_ip(&request);
    let agent = user_agent(&request);

    let response = next.run(request).await;

    // The request-id layer runs beneath this one, so the id is only visible
    // on the response.
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        // The request-id layer stamps every response; this covers responses
        // synthesized above it.
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let status = response.status().as_u16();
    let elapsed = started.elapsed();

    hub.record(RequestMetric {
        request_id,
        method: method.clone(),
        path,
        status,
        response_time_ms: elapsed.as_millis() as u64,
        memory: hub.current_memory(),
        recorded_at: Instant::now(),
        timestamp_ms: epoch_ms(),
        client_ip: ip,
        user_agent: agent,
    });
    metrics::record_request(&method, status, started);

    response
}

/// Cached reader for process memory and accumulated CPU time.
struct ProcessProbe {
    inner: Mutex<ProbeInner>,
}

struct ProbeInner {
    system: System,
    pid: Pid,
    refreshed_at: Instant,
    memory: MemorySnapshot,
    cpu_seconds: f64,
}

impl ProcessProbe {
    fn new() -> Self {
        let pid = Pid::from_u32(std::process::id());
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let mut inner = ProbeInner {
            system,
            pid,
            refreshed_at: Instant::now(),
            memory: MemorySnapshot {
                used_bytes: 0,
                total_bytes: 0,
            },
            cpu_seconds: 0.0,
        };
        Self::capture(&mut inner);
        Self {
            inner: Mutex::new(inner),
        }
    }

    fn read(&self) -> (MemorySnapshot, f64) {
        let mut inner = self.inner.lock().expect("process probe mutex poisoned");
        if inner.refreshed_at.elapsed() > PROBE_CACHE_TTL {
            let pid = inner.pid;
            inner.system.refresh_memory();
            inner
                .system
                .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            inner.refreshed_at = Instant::now();
            Self::capture(&mut inner);
        }
        (inner.memory, inner.cpu_seconds)
    }

    fn capture(inner: &mut ProbeInner) {
        let total_bytes = inner.system.total_memory();
        if let Some(process) = inner.system.process(inner.pid) {
            inner.memory = MemorySnapshot {
                used_bytes: process.memory(),
                total_bytes,
            };
            inner.cpu_seconds = process.accumulated_cpu_time() as f64 / 1000.0;
        } else {
            inner.memory.total_bytes = total_bytes;
        }
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(status: u16, response_time_ms: u64, age: Duration) -> RequestMetric {
        RequestMetric {
            request_id: "test".into(),
            method: "GET".into(),
            path: "/t".into(),
            status,
            response_time_ms,
            memory: MemorySnapshot {
                used_bytes: 0,
                total_bytes: 0,
            },
            recorded_at: Instant::now().checked_sub(age).unwrap_or_else(Instant::now),
            timestamp_ms: 0,
            client_ip: "127.0.0.1".parse().unwrap(),
            user_agent: String::new(),
        }
    }

    fn hub(request_buffer_size: usize) -> TelemetryHub {
        TelemetryHub::new(&TelemetryConfig {
            request_buffer_size,
            snapshot_history_size: 60,
            sample_interval_secs: 60,
        })
    }

    #[test]
    fn buffer_keeps_completion_order_and_evicts_oldest() {
        let hub = hub(3);
        for i in 0..5u64 {
            hub.record(metric(200, i, Duration::ZERO));
        }
        assert_eq!(hub.recorded_len(), 3);
        let retained: Vec<_> = hub
            .recent_requests(10)
            .iter()
            .map(|m| m.response_time_ms)
            .collect();
        assert_eq!(retained, vec![2, 3, 4]);
    }

    #[test]
    fn window_stats_exclude_out_of_window_entries() {
        let hub = hub(100);
        // 5 inside the window, 2 of them errors; 3 well outside.
        for status in [200, 200, 500, 404, 201] {
            hub.record(metric(status, 100, Duration::from_secs(10)));
        }
        for _ in 0..3 {
            hub.record(metric(200, 9_999, Duration::from_secs(300)));
        }

        let stats = hub.window_stats(SNAPSHOT_WINDOW);
        assert_eq!(stats.count, 5);
        assert!((stats.error_rate_percent - 40.0).abs() < f64::EPSILON);
        assert!((stats.average_ms - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_window_reports_zeroes() {
        let stats = hub(10).window_stats(SNAPSHOT_WINDOW);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average_ms, 0.0);
        assert_eq!(stats.error_rate_percent, 0.0);
    }

    #[test]
    fn snapshot_history_is_bounded() {
        let hub = TelemetryHub::new(&TelemetryConfig {
            request_buffer_size: 10,
            snapshot_history_size: 2,
            sample_interval_secs: 60,
        });
        for _ in 0..4 {
            hub.take_sample();
        }
        assert_eq!(hub.snapshot_history().len(), 2);
        assert!(hub.latest_snapshot().is_some());
    }

    #[test]
    fn sample_reduces_current_window() {
        let hub = hub(100);
        hub.record(metric(500, 40, Duration::from_secs(1)));
        hub.record(metric(200, 80, Duration::from_secs(1)));
        let snapshot = hub.take_sample();
        assert_eq!(snapshot.requests_per_minute, 2);
        assert!((snapshot.average_response_time_ms - 60.0).abs() < f64::EPSILON);
        assert!((snapshot.error_rate_percent - 50.0).abs() < f64::EPSILON);
    }
}
