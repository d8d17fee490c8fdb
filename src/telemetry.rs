//! Span instrumentation shared by every layer of the auth flow.
//!
//! Each public operation runs inside a span named `"<layer>.<Operation>"`.
//! [`observe`] drives the operation inside its span and stamps the outcome
//! onto it as `otel.status_code` / `otel.status_message`, leaving the returned
//! value untouched. [`Traced`] is the decorator that applies this to any
//! implementation of the store, hasher and issuer traits.

use std::fmt::Display;
use std::future::Future;

use tracing::{Instrument, Span};

/// Opens an operation span with the status fields pre-declared so
/// [`observe`] can fill them in once the operation finishes.
macro_rules! op_span {
    ($name:literal $(, $($fields:tt)+)?) => {
        ::tracing::info_span!(
            $name,
            otel.status_code = ::tracing::field::Empty,
            otel.status_message = ::tracing::field::Empty
            $(, $($fields)+)?
        )
    };
}
pub(crate) use op_span;

/// Wraps a store, hasher or issuer so each of its operations is observed.
#[derive(Debug, Clone)]
pub struct Traced<T>(pub T);

/// Runs `fut` inside `span` and records its outcome on the span.
///
/// The span is exited when the future completes or is dropped, so it closes
/// on every exit path.
pub async fn observe<T, E, Fut>(span: Span, success: &'static str, fut: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let result = fut.instrument(span.clone()).await;
    record_outcome(&span, success, &result);
    result
}

/// Synchronous counterpart of [`observe`] for CPU-only operations.
pub fn observe_sync<T, E, F>(span: Span, success: &'static str, op: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: Display,
{
    let result = span.in_scope(op);
    record_outcome(&span, success, &result);
    result
}

fn record_outcome<T, E: Display>(span: &Span, success: &'static str, result: &Result<T, E>) {
    span.in_scope(|| match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
            span.record("otel.status_message", success);
            tracing::debug!("{}", success);
        }
        Err(e) => {
            span.record("otel.status_code", "ERROR");
            span.record("otel.status_message", tracing::field::display(e));
            tracing::warn!(error = %e, "operation failed");
        }
    });
}

#[cfg(test)]
pub(crate) mod capture {
    //! Test subscriber that keeps every span it sees, with fields and events.

    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;
    use tracing_subscriber::Layer;

    #[derive(Debug, Clone, Default)]
    pub struct SpanRecord {
        pub name: String,
        pub parent: Option<String>,
        pub fields: HashMap<String, String>,
        pub events: Vec<HashMap<String, String>>,
        pub closed: bool,
    }

    impl SpanRecord {
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }

        pub fn status(&self) -> Option<&str> {
            self.field("otel.status_code")
        }

        /// Every recorded value on the span and its events, for leak checks.
        pub fn all_values(&self) -> Vec<String> {
            self.fields
                .values()
                .cloned()
                .chain(self.events.iter().flat_map(|e| e.values().cloned()))
                .collect()
        }
    }

    #[derive(Clone, Default)]
    pub struct Captured(Arc<Mutex<Vec<SpanRecord>>>);

    impl Captured {
        pub fn spans(&self) -> Vec<SpanRecord> {
            self.0.lock().unwrap().clone()
        }

        pub fn names(&self) -> Vec<String> {
            self.spans().into_iter().map(|s| s.name).collect()
        }

        pub fn span(&self, name: &str) -> SpanRecord {
            self.spans()
                .into_iter()
                .find(|s| s.name == name)
                .unwrap_or_else(|| panic!("no span named {name}; saw {:?}", self.names()))
        }

        pub fn count(&self, name: &str) -> usize {
            self.spans().iter().filter(|s| s.name == name).count()
        }
    }

    struct Index(usize);

    #[derive(Default)]
    struct Fields(HashMap<String, String>);

    impl Visit for Fields {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0
                .insert(field.name().to_string(), format!("{:?}", value));
        }
    }

    struct CaptureLayer(Captured);

    impl<S> Layer<S> for CaptureLayer
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let mut fields = Fields::default();
            attrs.record(&mut fields);
            let Some(span) = ctx.span(id) else { return };
            let parent = span.parent().map(|p| p.name().to_string());
            let mut spans = (self.0).0.lock().unwrap();
            spans.push(SpanRecord {
                name: span.name().to_string(),
                parent,
                fields: fields.0,
                ..Default::default()
            });
            span.extensions_mut().insert(Index(spans.len() - 1));
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else { return };
            let ext = span.extensions();
            let Some(Index(i)) = ext.get::<Index>() else { return };
            let mut fields = Fields::default();
            values.record(&mut fields);
            (self.0).0.lock().unwrap()[*i].fields.extend(fields.0);
        }

        fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
            let Some(span) = ctx.event_span(event) else { return };
            let ext = span.extensions();
            let Some(Index(i)) = ext.get::<Index>() else { return };
            let mut fields = Fields::default();
            event.record(&mut fields);
            (self.0).0.lock().unwrap()[*i].events.push(fields.0);
        }

        fn on_close(&self, id: Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else { return };
            let ext = span.extensions();
            let Some(Index(i)) = ext.get::<Index>() else { return };
            (self.0).0.lock().unwrap()[*i].closed = true;
        }
    }

    /// Installs the capturing subscriber for the current thread.
    pub fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(CaptureLayer(captured.clone()));
        let guard = tracing::subscriber::set_default(subscriber);
        (captured, guard)
    }
}
