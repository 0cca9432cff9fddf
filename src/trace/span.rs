//! The mutable record of one unit of work.
//!
//! Spans can be nested to form a trace tree. Each trace contains a root
//! span, which typically describes the end-to-end latency, and optionally
//! one or more sub-spans for its sub-operations.
//!
//! A span is exclusively owned by its tracer's active stack while open.
//! After the end time is set, attributes, time events, links, and status can
//! no longer change.

use crate::trace::{SpanEventHandler, SpanId, TraceError, TraceId, TraceResult};
use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

/// A scalar attribute value.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum AttributeValue {
    /// A string value.
    String(Cow<'static, str>),
    /// A signed integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

impl From<&'static str> for AttributeValue {
    fn from(value: &'static str) -> Self {
        AttributeValue::String(Cow::Borrowed(value))
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(Cow::Owned(value))
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// The status of a finished unit of work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// The operation completed successfully.
    Ok,
    /// The operation failed.
    Error {
        /// A developer-facing description of the failure.
        description: Cow<'static, str>,
    },
}

impl Status {
    /// Create an error status with the given description.
    pub fn error(description: impl Into<Cow<'static, str>>) -> Self {
        Status::Error {
            description: description.into(),
        }
    }
}

/// A text annotation at a point in time on a span.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// When the annotated event occurred.
    pub time: SystemTime,
    /// A user-supplied message describing the event.
    pub description: String,
    /// Attributes describing the event.
    pub attributes: HashMap<String, AttributeValue>,
}

impl Annotation {
    /// Create an annotation stamped with the current time.
    pub fn new(description: impl Into<String>) -> Self {
        Annotation {
            time: SystemTime::now(),
            description: description.into(),
            attributes: HashMap::new(),
        }
    }
}

/// The direction of a [`MessageEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageEventType {
    /// Unknown direction.
    Unspecified,
    /// The message was sent.
    Sent,
    /// The message was received.
    Received,
}

/// An event describing a message sent or received on a span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    /// When the message was sent or received.
    pub time: SystemTime,
    /// Whether the message was sent or received.
    pub kind: MessageEventType,
    /// An id, unique within the span, higher for later messages.
    pub id: u64,
    /// The number of uncompressed bytes, if known.
    pub uncompressed_size: Option<u64>,
    /// The number of compressed bytes, if known.
    pub compressed_size: Option<u64>,
}

impl MessageEvent {
    /// Create a message event stamped with the current time.
    pub fn new(kind: MessageEventType, id: u64) -> Self {
        MessageEvent {
            time: SystemTime::now(),
            kind,
            id,
            uncompressed_size: None,
            compressed_size: None,
        }
    }
}

/// A timed event on a span: an annotation or a message event.
#[derive(Clone, Debug, PartialEq)]
pub enum TimeEvent {
    /// A text annotation.
    Annotation(Annotation),
    /// A message sent or received.
    Message(MessageEvent),
}

/// How a linked span relates to the linking span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LinkType {
    /// The relationship is unknown.
    Unspecified,
    /// The linked span is a child of the linking span.
    ChildLinkedSpan,
    /// The linked span is a parent of the linking span.
    ParentLinkedSpan,
}

/// A pointer from this span to a span in the same or another trace.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    /// The trace containing the linked span.
    pub trace_id: TraceId,
    /// The linked span.
    pub span_id: SpanId,
    /// How the linked span relates to this one.
    pub kind: LinkType,
    /// Attributes describing the link.
    pub attributes: HashMap<String, AttributeValue>,
}

impl Link {
    /// Create a link with no attributes.
    pub fn new(trace_id: TraceId, span_id: SpanId, kind: LinkType) -> Self {
        Link {
            trace_id,
            span_id,
            kind,
            attributes: HashMap::new(),
        }
    }
}

/// Options controlling span creation.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct SpanOptions {
    /// Start time for the span; defaults to the current time.
    pub start_time: Option<SystemTime>,
    /// Capture and attach the current call stack at creation.
    pub capture_stack_trace: bool,
}

/// Single operation within a trace.
///
/// Mutations are rejected with [`TraceError::SpanClosed`] once the span is
/// closed; [`Span::close`] itself is idempotent, tolerating a defensive
/// double close.
#[derive(Debug)]
pub struct Span {
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
    name: Cow<'static, str>,
    start_time: SystemTime,
    end_time: Option<SystemTime>,
    attributes: HashMap<String, AttributeValue>,
    time_events: Vec<TimeEvent>,
    links: Vec<Link>,
    stack_trace: Option<String>,
    status: Option<Status>,
    event_handler: Arc<dyn SpanEventHandler>,
}

impl Span {
    pub(crate) fn new(
        name: Cow<'static, str>,
        span_id: SpanId,
        parent_span_id: Option<SpanId>,
        event_handler: Arc<dyn SpanEventHandler>,
        options: &SpanOptions,
    ) -> Self {
        Span {
            span_id,
            parent_span_id,
            name,
            start_time: options.start_time.unwrap_or_else(SystemTime::now),
            end_time: None,
            attributes: HashMap::new(),
            time_events: Vec::new(),
            links: Vec::new(),
            stack_trace: options
                .capture_stack_trace
                .then(|| Backtrace::force_capture().to_string()),
            status: None,
            event_handler,
        }
    }

    /// This span's id.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// The parent span's id; `None` marks the trace root.
    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the operation started.
    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    /// When the operation ended; `None` while the span is open.
    pub fn end_time(&self) -> Option<SystemTime> {
        self.end_time
    }

    /// The span's attributes.
    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }

    /// The span's timed events, in append order.
    pub fn time_events(&self) -> &[TimeEvent] {
        &self.time_events
    }

    /// The span's links, in append order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The call stack captured at creation, if requested.
    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    /// The span's status, if one was set.
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Whether the end time has been set.
    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }

    fn ensure_open(&self) -> TraceResult<()> {
        if self.end_time.is_some() {
            Err(TraceError::SpanClosed)
        } else {
            Ok(())
        }
    }

    /// Set an attribute. Keys are unique; the last write wins.
    pub fn add_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> TraceResult<()> {
        self.ensure_open()?;
        let key = key.into();
        let value = value.into();
        self.event_handler
            .attribute_added(self.span_id, &key, &value);
        self.attributes.insert(key, value);
        Ok(())
    }

    /// Append an annotation or message event.
    pub fn add_time_event(&mut self, event: TimeEvent) -> TraceResult<()> {
        self.ensure_open()?;
        match &event {
            TimeEvent::Annotation(annotation) => {
                self.event_handler.annotation_added(self.span_id, annotation)
            }
            TimeEvent::Message(message) => {
                self.event_handler.message_event_added(self.span_id, message)
            }
        }
        self.time_events.push(event);
        Ok(())
    }

    /// Append a link to another span.
    pub fn add_link(&mut self, link: Link) -> TraceResult<()> {
        self.ensure_open()?;
        self.event_handler.link_added(self.span_id, &link);
        self.links.push(link);
        Ok(())
    }

    /// Set the span status. The first write wins; later writes on an open
    /// span are ignored.
    pub fn set_status(&mut self, status: Status) -> TraceResult<()> {
        self.ensure_open()?;
        if self.status.is_some() {
            tracing::debug!(span_id = %self.span_id, "span status already set; keeping first");
            return Ok(());
        }
        self.status = Some(status);
        Ok(())
    }

    /// Set the end time, freezing the span.
    ///
    /// A second close is a no-op and does not change the end time recorded
    /// by the first.
    pub fn close(&mut self, end_time: Option<SystemTime>) {
        if self.end_time.is_some() {
            return;
        }
        self.end_time = Some(end_time.unwrap_or_else(SystemTime::now));
    }
}
