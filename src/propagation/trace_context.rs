use crate::propagation::{PropagationError, TextFormat};
use crate::trace::{SpanContext, SpanId, TraceId};

const SUPPORTED_VERSION: &str = "00";
const SAMPLED_FLAG: u8 = 0x01;

/// Text codec for the W3C `traceparent` header,
/// `"00-<32-hex trace-id>-<16-hex parent-id>-<2-hex flags>"`.
///
/// Every field is hex, including the span id — contrast
/// [`CloudTraceFormatter`], whose span id is decimal. A context without a
/// current span serializes the parent field as sixteen zeros; an all-zero
/// parent field decodes back to "no current span". An all-zero trace id is
/// rejected.
///
/// [`CloudTraceFormatter`]: crate::propagation::CloudTraceFormatter
#[derive(Clone, Debug, Default)]
pub struct TraceContextFormatter {
    _private: (),
}

impl TraceContextFormatter {
    /// Create a new `TraceContextFormatter`.
    pub fn new() -> Self {
        TraceContextFormatter { _private: () }
    }
}

fn hex_field(part: &str, width: usize) -> Result<&str, PropagationError> {
    if part.len() != width || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PropagationError::InvalidFormat(
            "field is not fixed-width hex",
        ));
    }
    Ok(part)
}

impl TextFormat for TraceContextFormatter {
    fn parse(&self, header: &str) -> Result<SpanContext, PropagationError> {
        let parts: Vec<&str> = header.trim().split('-').collect();
        if parts.len() != 4 {
            return Err(PropagationError::InvalidFormat(
                "expected four dash-separated fields",
            ));
        }
        if parts[0] != SUPPORTED_VERSION {
            return Err(PropagationError::InvalidFormat(
                "unsupported traceparent version",
            ));
        }

        let trace_id = TraceId::from_hex(hex_field(parts[1], 32)?)
            .map_err(|_| PropagationError::InvalidFormat("trace id is not valid hex"))?;
        if trace_id == TraceId::from(0) {
            return Err(PropagationError::InvalidFormat("trace id is all zeros"));
        }

        let parent = SpanId::from_hex(hex_field(parts[2], 16)?)
            .map_err(|_| PropagationError::InvalidFormat("parent id is not valid hex"))?;
        let span_id = (parent.to_u64() != 0).then_some(parent);

        let flags = u8::from_str_radix(hex_field(parts[3], 2)?, 16)
            .map_err(|_| PropagationError::InvalidFormat("flags are not valid hex"))?;

        Ok(SpanContext::new_remote(
            trace_id,
            span_id,
            flags & SAMPLED_FLAG != 0,
        ))
    }

    fn serialize(&self, context: &SpanContext) -> String {
        format!(
            "{}-{}-{}-{:02x}",
            SUPPORTED_VERSION,
            context.trace_id(),
            context.span_id().unwrap_or(SpanId::from(0)),
            if context.is_sampled() { SAMPLED_FLAG } else { 0 },
        )
    }
}
