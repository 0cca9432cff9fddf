//! The span tree, its lifecycle, sampling, and export.
//!
//! A trace is a tree of [`Span`]s covering one logical request. The
//! [`RequestTracer`] owns the active span stack for that request, applies
//! the [`Sampler`] once per trace, and hands the finished spans to a
//! [`SpanExporter`] when the request ends. Span mutations are observed by a
//! [`SpanEventHandler`].

use thiserror::Error;

mod event_handler;
mod export;
mod id_generator;
mod sampler;
mod span;
mod span_context;
mod tracer;

pub use event_handler::{NoopEventHandler, SpanEventHandler};
pub use export::{ExportResult, InMemorySpanExporter, NoopSpanExporter, SpanData, SpanExporter};
pub use id_generator::{IdGenerator, IncrementIdGenerator, RandomIdGenerator};
pub use sampler::{MultiSampler, Sampler, ShouldSample};
pub use span::{
    Annotation, AttributeValue, Link, LinkType, MessageEvent, MessageEventType, Span, SpanOptions,
    Status, TimeEvent,
};
pub use span_context::{SpanContext, SpanId, TraceId};
pub use tracer::{RequestTracer, RequestTracerBuilder};

/// Errors raised by span lifecycle operations and span export.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    /// A mutation was attempted on a span whose end time is already set.
    ///
    /// The mutation is dropped; the span is otherwise unaffected.
    #[error("span is already closed; mutation dropped")]
    SpanClosed,

    /// The exporter failed to deliver a batch of finished spans.
    ///
    /// Caught at the call site and reported as a diagnostic, never
    /// propagated into application code.
    #[error("span export failed: {0}")]
    ExportFailed(String),

    /// Failures not covered by the variants above.
    #[error("{0}")]
    Other(String),
}

/// Result type for span lifecycle operations.
pub type TraceResult<T> = Result<T, TraceError>;
