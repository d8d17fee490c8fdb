//! OTLP export for spans and response-time metrics.
//!
//! Both pipelines push over gRPC to the configured collector. Spans reach the
//! tracer through the `tracing-opentelemetry` layer installed in `main`, which
//! also turns the `otel.status_code` / `otel.status_message` fields into span
//! status. Metrics go through the global meter provider.

use anyhow::Context;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    metrics::SdkMeterProvider,
    runtime,
    trace::{self as sdktrace, Tracer, TracerProvider},
    Resource,
};

use crate::config::OtelConfig;

pub const SERVICE_NAME: &str = "auth-service";

pub struct Telemetry {
    tracer_provider: TracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    pub fn init(config: &OtelConfig) -> anyhow::Result<Self> {
        let endpoint = config.collector_url();
        let resource = Resource::new(vec![KeyValue::new("service.name", SERVICE_NAME)]);

        let tracer_provider = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint.clone()),
            )
            .with_trace_config(sdktrace::Config::default().with_resource(resource.clone()))
            .install_batch(runtime::Tokio)
            .context("install OTLP span exporter")?;

        let meter_provider = opentelemetry_otlp::new_pipeline()
            .metrics(runtime::Tokio)
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint),
            )
            .with_resource(resource)
            .build()
            .context("install OTLP metric exporter")?;
        global::set_meter_provider(meter_provider.clone());

        Ok(Self {
            tracer_provider,
            meter_provider,
        })
    }

    pub fn tracer(&self) -> Tracer {
        self.tracer_provider.tracer(SERVICE_NAME)
    }

    /// Flushes whatever is still buffered. Call once the server has stopped.
    pub fn shutdown(self) {
        for result in self.tracer_provider.force_flush() {
            if let Err(e) = result {
                tracing::warn!(error = %e, "span flush failed");
            }
        }
        if let Err(e) = self.meter_provider.shutdown() {
            tracing::warn!(error = %e, "metric exporter shutdown failed");
        }
    }
}
