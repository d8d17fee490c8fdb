use std::{sync::Arc, time::Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use opentelemetry::{global, metrics::Histogram};
use tracing::info;

use crate::otel::SERVICE_NAME;

/// Somewhere to put a measured response time, in milliseconds.
pub trait LatencyRecorder: Send + Sync {
    fn record_ms(&self, latency_ms: u64);
}

impl LatencyRecorder for Histogram<u64> {
    fn record_ms(&self, latency_ms: u64) {
        self.record(latency_ms, &[]);
    }
}

/// Per-route state for [`response_time`]: the API name and its histogram.
#[derive(Clone)]
pub struct ResponseTime {
    api: &'static str,
    recorder: Arc<dyn LatencyRecorder>,
}

impl ResponseTime {
    /// Backed by the `<service>.<api>` histogram on the global meter.
    pub fn histogram(api: &'static str) -> Self {
        let histogram = global::meter(SERVICE_NAME)
            .u64_histogram(metric_name(api))
            .with_description("Response time")
            .with_unit("ms")
            .init();
        Self::with_recorder(api, Arc::new(histogram))
    }

    pub fn with_recorder(api: &'static str, recorder: Arc<dyn LatencyRecorder>) -> Self {
        Self { api, recorder }
    }
}

pub fn metric_name(api: &str) -> String {
    format!("{SERVICE_NAME}.{api}")
}

/// Records how long the named API took to answer.
pub async fn response_time(
    State(timing): State<ResponseTime>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    timing.recorder.record_ms(latency_ms);
    info!(
        api = timing.api,
        latency_ms,
        status = response.status().as_u16(),
        "response time"
    );
    response
}
