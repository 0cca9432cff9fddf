use std::fmt;
use std::num::ParseIntError;

/// A 16-byte value which identifies a given trace.
///
/// The canonical text form is 32 lowercase hex digits.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// Create a trace id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(u128::from_be_bytes(bytes))
    }

    /// Return the representation of this trace id as a byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Converts a string in base 16 to a trace id.
    pub fn from_hex(hex: &str) -> Result<Self, ParseIntError> {
        u128::from_str_radix(hex, 16).map(TraceId)
    }

    /// The low 64 bits of the id, used for deterministic sampling.
    pub(crate) fn low_u64(self) -> u64 {
        self.0 as u64
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        TraceId(value)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

/// An 8-byte value which identifies a given span.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// Create a span id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(u64::from_be_bytes(bytes))
    }

    /// Return the representation of this span id as a byte array.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Converts a string in base 16 to a span id.
    pub fn from_hex(hex: &str) -> Result<Self, ParseIntError> {
        u64::from_str_radix(hex, 16).map(SpanId)
    }

    /// The id as an unsigned 64-bit integer.
    ///
    /// The text propagation header carries the span id in this decimal form
    /// rather than hex; see [`CloudTraceFormatter`].
    ///
    /// [`CloudTraceFormatter`]: crate::propagation::CloudTraceFormatter
    pub const fn to_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

/// The propagated identity of a trace.
///
/// A `SpanContext` correlates spans across process boundaries: the trace id,
/// the id of the span that was current when the context was captured (absent
/// for a new root), and whether the trace was sampled. Contexts are immutable
/// once constructed; re-propagation derives a new context rather than
/// mutating an existing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: Option<SpanId>,
    sampled: bool,
    from_remote: bool,
}

impl SpanContext {
    /// Create a locally-generated span context.
    pub fn new(trace_id: TraceId, span_id: Option<SpanId>, sampled: bool) -> Self {
        SpanContext {
            trace_id,
            span_id,
            sampled,
            from_remote: false,
        }
    }

    /// Create a span context decoded from an inbound carrier.
    ///
    /// Only the propagation codecs produce remote contexts.
    pub(crate) fn new_remote(trace_id: TraceId, span_id: Option<SpanId>, sampled: bool) -> Self {
        SpanContext {
            trace_id,
            span_id,
            sampled,
            from_remote: true,
        }
    }

    /// The trace this context belongs to.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The deepest span open when this context was captured, if any.
    ///
    /// `None` means the receiver should act as a trace root.
    pub fn span_id(&self) -> Option<SpanId> {
        self.span_id
    }

    /// Whether the trace was selected for export.
    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// Whether this context was decoded from an inbound carrier rather than
    /// generated locally.
    pub fn is_remote(&self) -> bool {
        self.from_remote
    }
}
