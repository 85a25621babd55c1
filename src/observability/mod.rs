//! 可观测性模块
//!
//! 提供 Prometheus 文本指标、结构化日志和健康检查。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::config::LoggingConfig;

// ===== Metrics =====

/// 应用指标
#[derive(Clone, Default)]
pub struct AppMetrics {
    pub http_requests_total: Arc<AtomicU64>,
    pub http_request_duration_sum: Arc<AtomicU64>,
    pub queries_total: Arc<AtomicU64>,
    pub query_errors_total: Arc<AtomicU64>,
    pub query_latency_sum: Arc<AtomicU64>,
    pub sessions_created_total: Arc<AtomicU64>,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    /// 记录一次问答，失败的也计入总数
    pub fn record_query(&self, duration_ms: u64, success: bool) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        self.query_latency_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
        if !success {
            self.query_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_session_created(&self) {
        self.sessions_created_total.fetch_add(1, Ordering::Relaxed);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self, active_sessions: usize) -> String {
        let queries = self.queries_total.load(Ordering::Relaxed);
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds summary
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
# HELP queries_total Total questions submitted to the agent
# TYPE queries_total counter
queries_total {}
# HELP query_errors_total Questions that failed
# TYPE query_errors_total counter
query_errors_total {}
# HELP query_latency_seconds Agent round trip latency in seconds
# TYPE query_latency_seconds summary
query_latency_seconds_sum {}
query_latency_seconds_count {}
# HELP sessions_created_total Chat sessions created
# TYPE sessions_created_total counter
sessions_created_total {}
# HELP sessions_active Chat sessions held in memory
# TYPE sessions_active gauge
sessions_active {}
"#,
            self.http_requests_total.load(Ordering::Relaxed),
            self.http_request_duration_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            self.http_requests_total.load(Ordering::Relaxed),
            queries,
            self.query_errors_total.load(Ordering::Relaxed),
            self.query_latency_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            queries,
            self.sessions_created_total.load(Ordering::Relaxed),
            active_sessions,
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub model: String,
    pub dataset_rows: usize,
    pub active_sessions: usize,
}

impl HealthStatus {
    pub fn healthy(
        version: &str,
        started_at: DateTime<Utc>,
        model: &str,
        dataset_rows: usize,
        active_sessions: usize,
    ) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: version.to_string(),
            uptime_seconds: (Utc::now() - started_at).num_seconds() as f64,
            model: model.to_string(),
            dataset_rows,
            active_sessions,
        }
    }
}

// ===== Request Metrics Middleware =====

/// 记录请求指标的中间件
pub async fn metrics_middleware(
    axum::extract::State(metrics): axum::extract::State<AppMetrics>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let start = std::time::Instant::now();
    let response = next.run(req).await;
    metrics.record_http_request(start.elapsed().as_millis() as u64);
    response
}

// ===== Structured Logging =====

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的级别。设置了 `log_dir` 时同时按天滚动写入文件，
/// 返回的 guard 需要保留到进程退出，否则缓冲的日志会丢失。
pub fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.level)));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "jobbot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    let result = if config.structured {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already set: {e}");
    }

    guard
}
