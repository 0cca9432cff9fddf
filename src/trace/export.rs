//! Span exporters.

use crate::trace::{AttributeValue, Link, Span, SpanId, Status, TimeEvent, TraceError, TraceId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Describes the result of an export.
pub type ExportResult = Result<(), TraceError>;

/// Immutable data for a closed span, the exporter's input.
///
/// Ownership of a span transfers from the tracer's active stack to the
/// pending-export batch when it closes; `SpanData` is that batch record.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanData {
    /// The trace this span belongs to.
    pub trace_id: TraceId,
    /// This span's id.
    pub span_id: SpanId,
    /// The parent span's id; `None` marks the trace root.
    pub parent_span_id: Option<SpanId>,
    /// The operation name.
    pub name: Cow<'static, str>,
    /// When the operation started.
    pub start_time: SystemTime,
    /// When the operation ended.
    pub end_time: SystemTime,
    /// The span's attributes.
    pub attributes: HashMap<String, AttributeValue>,
    /// Annotations and message events, in append order.
    pub time_events: Vec<TimeEvent>,
    /// Links to other spans, in append order.
    pub links: Vec<Link>,
    /// The call stack captured at creation, if requested.
    pub stack_trace: Option<String>,
    /// The span's status, if one was set.
    pub status: Option<Status>,
}

impl SpanData {
    pub(crate) fn from_span(span: Span, trace_id: TraceId) -> Self {
        let end_time = span.end_time().unwrap_or_else(|| span.start_time());
        SpanData {
            trace_id,
            span_id: span.span_id(),
            parent_span_id: span.parent_span_id(),
            name: span.name().to_owned().into(),
            start_time: span.start_time(),
            end_time,
            attributes: span.attributes().clone(),
            time_events: span.time_events().to_vec(),
            links: span.links().to_vec(),
            stack_trace: span.stack_trace().map(str::to_owned),
            status: span.status().cloned(),
        }
    }
}

/// The sink that receives finished spans for a backend.
///
/// The export call may fail; the failure is caught at the call site and
/// never propagates into application code. No retry happens at this layer —
/// exporters that need retry or backoff implement it internally.
///
/// One exporter instance may be shared by any number of tracers, so
/// implementations must tolerate concurrent `export` calls.
pub trait SpanExporter: Send + Sync + Debug {
    /// Deliver a batch of closed spans to the backend.
    fn export(&self, batch: Vec<SpanData>) -> ExportResult;

    /// Shut down the exporter, flushing anything buffered.
    ///
    /// Called at most once; `export` is not called afterwards.
    fn shutdown(&self) {}
}

/// An exporter that discards every batch.
///
/// Used where a tracer is required to have an exporter but nothing should
/// leave the process.
#[derive(Clone, Debug, Default)]
pub struct NoopSpanExporter {
    _private: (),
}

impl NoopSpanExporter {
    /// Create a new `NoopSpanExporter`.
    pub fn new() -> Self {
        NoopSpanExporter { _private: () }
    }
}

impl SpanExporter for NoopSpanExporter {
    fn export(&self, _batch: Vec<SpanData>) -> ExportResult {
        Ok(())
    }
}

/// A span exporter that stores finished spans in memory.
///
/// Useful for testing and debugging. Clones share the same storage, so a
/// test can keep a clone and assert on what a tracer exported:
///
/// ```
/// use opencensus::trace::{InMemorySpanExporter, RequestTracer};
/// use std::sync::Arc;
///
/// let exporter = InMemorySpanExporter::default();
/// let mut tracer = RequestTracer::builder()
///     .with_exporter(Arc::new(exporter.clone()))
///     .start("main");
/// tracer.finish();
///
/// assert_eq!(exporter.finished_spans().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanExporter {
    /// The spans exported so far, oldest batch first.
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans
            .lock()
            .map(|spans| spans.clone())
            .unwrap_or_default()
    }

    /// Clear the stored spans.
    pub fn reset(&self) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.clear();
        }
    }
}

impl SpanExporter for InMemorySpanExporter {
    fn export(&self, mut batch: Vec<SpanData>) -> ExportResult {
        self.spans
            .lock()
            .map(|mut spans| spans.append(&mut batch))
            .map_err(|err| TraceError::Other(err.to_string()))
    }

    fn shutdown(&self) {
        self.reset();
    }
}
