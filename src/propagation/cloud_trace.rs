use crate::propagation::{PropagationError, TextFormat};
use crate::trace::{SpanContext, SpanId, TraceId};

/// Text codec for the `"<32-hex trace-id>[/<decimal span-id>];o=<0|1>"`
/// header format.
///
/// The span id segment is omitted when the context has no current span (the
/// receiver then acts as a trace root). The options segment carries the
/// sampling flag.
///
/// Note the deliberate asymmetry inherited from deployed senders: the trace
/// id is hex but the span id is the *decimal* rendering of its unsigned
/// 64-bit value. Downstream compatibility depends on these exact bytes, so
/// this codec preserves the asymmetry rather than fixing it.
#[derive(Clone, Debug, Default)]
pub struct CloudTraceFormatter {
    _private: (),
}

impl CloudTraceFormatter {
    /// Create a new `CloudTraceFormatter`.
    pub fn new() -> Self {
        CloudTraceFormatter { _private: () }
    }
}

impl TextFormat for CloudTraceFormatter {
    fn parse(&self, header: &str) -> Result<SpanContext, PropagationError> {
        let header = header.trim();

        // The trailing ";o=<flag>" options segment is mandatory. A header
        // without an explicit sampling decision is malformed; callers
        // discard it and fall back to a fresh root, where the local sampler
        // decides.
        let (ids, options) = header
            .split_once(';')
            .ok_or(PropagationError::InvalidFormat("missing options segment"))?;
        let flag = options
            .strip_prefix("o=")
            .ok_or(PropagationError::InvalidFormat("unknown options segment"))?;
        let sampled = match flag {
            "0" => false,
            "1" => true,
            _ => {
                return Err(PropagationError::InvalidFormat(
                    "sampling flag must be 0 or 1",
                ))
            }
        };

        let (trace_part, span_part) = match ids.split_once('/') {
            Some((trace, span)) => (trace, Some(span)),
            None => (ids, None),
        };

        if trace_part.len() != 32 || !trace_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PropagationError::InvalidFormat(
                "trace id must be exactly 32 hex characters",
            ));
        }
        let trace_id = TraceId::from_hex(trace_part)
            .map_err(|_| PropagationError::InvalidFormat("trace id is not valid hex"))?;

        // Digits only: u64 parsing would also accept a leading '+'.
        let span_id = match span_part {
            Some(decimal) => {
                if decimal.is_empty() || !decimal.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(PropagationError::InvalidFormat(
                        "span id is not an unsigned decimal integer",
                    ));
                }
                Some(SpanId::from(decimal.parse::<u64>().map_err(|_| {
                    PropagationError::InvalidFormat("span id does not fit in 64 bits")
                })?))
            }
            None => None,
        };

        Ok(SpanContext::new_remote(trace_id, span_id, sampled))
    }

    fn serialize(&self, context: &SpanContext) -> String {
        let mut header = context.trace_id().to_string();
        if let Some(span_id) = context.span_id() {
            header.push('/');
            header.push_str(&span_id.to_u64().to_string());
        }
        header.push_str(if context.is_sampled() { ";o=1" } else { ";o=0" });
        header
    }
}
