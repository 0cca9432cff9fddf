use crate::trace::{Annotation, AttributeValue, Link, MessageEvent, SpanId};

/// Observer notified of span mutations.
///
/// Each mutation of an open span triggers exactly one callback naming the
/// mutation kind. Implementations must be cheap and must never fail; they
/// run synchronously on the instrumented code path.
///
/// Every callback has a no-op default body, so implementations override only
/// the mutation kinds they care about and the tracer never needs a null
/// check at the call site.
pub trait SpanEventHandler: Send + Sync + std::fmt::Debug {
    /// An attribute was set on the span.
    fn attribute_added(&self, _span_id: SpanId, _key: &str, _value: &AttributeValue) {}

    /// An annotation was appended to the span's time events.
    fn annotation_added(&self, _span_id: SpanId, _annotation: &Annotation) {}

    /// A message event was appended to the span's time events.
    fn message_event_added(&self, _span_id: SpanId, _event: &MessageEvent) {}

    /// A link was appended to the span.
    fn link_added(&self, _span_id: SpanId, _link: &Link) {}
}

/// The default [`SpanEventHandler`]: observes nothing.
#[derive(Clone, Debug, Default)]
pub struct NoopEventHandler {
    _private: (),
}

impl NoopEventHandler {
    /// Create a new `NoopEventHandler`.
    pub fn new() -> Self {
        NoopEventHandler { _private: () }
    }
}

impl SpanEventHandler for NoopEventHandler {}
