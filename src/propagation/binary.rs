use crate::propagation::{BinaryFormat, PropagationError};
use crate::trace::{SpanContext, SpanId, TraceId};

const VERSION_ID: u8 = 0;
const TRACE_ID_FIELD: u8 = 0;
const SPAN_ID_FIELD: u8 = 1;
const OPTIONS_FIELD: u8 = 2;
const SAMPLED_BIT: u8 = 0x01;

/// Binary codec for RPC transport metadata.
///
/// The encoding is a version byte followed by tagged fixed-width fields:
/// field `0` is the 16-byte trace id, field `1` the 8-byte span id, field
/// `2` a one-byte options bitmask whose least significant bit is the
/// sampling flag. The span id field is omitted when the context carries no
/// current span. All multi-byte values are big-endian.
#[derive(Clone, Debug, Default)]
pub struct BinaryFormatter {
    _private: (),
}

impl BinaryFormatter {
    /// Create a new `BinaryFormatter`.
    pub fn new() -> Self {
        BinaryFormatter { _private: () }
    }
}

fn take<'a>(bytes: &mut &'a [u8], n: usize) -> Result<&'a [u8], PropagationError> {
    if bytes.len() < n {
        return Err(PropagationError::InvalidFormat("truncated binary context"));
    }
    let (head, rest) = bytes.split_at(n);
    *bytes = rest;
    Ok(head)
}

impl BinaryFormat for BinaryFormatter {
    fn from_bytes(&self, bytes: &[u8]) -> Result<SpanContext, PropagationError> {
        let mut rest = bytes;
        match take(&mut rest, 1)?[0] {
            VERSION_ID => {}
            _ => {
                return Err(PropagationError::InvalidFormat(
                    "unsupported binary context version",
                ))
            }
        }

        let mut trace_id = None;
        let mut span_id = None;
        let mut sampled = false;
        while !rest.is_empty() {
            match take(&mut rest, 1)?[0] {
                TRACE_ID_FIELD => {
                    let mut buf = [0u8; 16];
                    buf.copy_from_slice(take(&mut rest, 16)?);
                    trace_id = Some(TraceId::from_bytes(buf));
                }
                SPAN_ID_FIELD => {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(take(&mut rest, 8)?);
                    span_id = Some(SpanId::from_bytes(buf));
                }
                OPTIONS_FIELD => {
                    sampled = take(&mut rest, 1)?[0] & SAMPLED_BIT != 0;
                }
                _ => {
                    return Err(PropagationError::InvalidFormat(
                        "unknown binary context field",
                    ))
                }
            }
        }

        let trace_id =
            trace_id.ok_or(PropagationError::InvalidFormat("missing trace id field"))?;
        Ok(SpanContext::new_remote(trace_id, span_id, sampled))
    }

    fn to_bytes(&self, context: &SpanContext) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(29);
        bytes.push(VERSION_ID);
        bytes.push(TRACE_ID_FIELD);
        bytes.extend_from_slice(&context.trace_id().to_bytes());
        if let Some(span_id) = context.span_id() {
            bytes.push(SPAN_ID_FIELD);
            bytes.extend_from_slice(&span_id.to_bytes());
        }
        bytes.push(OPTIONS_FIELD);
        bytes.push(if context.is_sampled() { SAMPLED_BIT } else { 0 });
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_full_context() {
        let formatter = BinaryFormatter::new();
        let cx = SpanContext::new(
            TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736),
            Some(SpanId::from(0x00f0_67aa_0ba9_02b7)),
            true,
        );
        let bytes = formatter.to_bytes(&cx);
        assert_eq!(bytes.len(), 29);

        let decoded = formatter.from_bytes(&bytes).unwrap();
        assert_eq!(decoded.trace_id(), cx.trace_id());
        assert_eq!(decoded.span_id(), cx.span_id());
        assert!(decoded.is_sampled());
        assert!(decoded.is_remote());
    }

    #[test]
    fn omits_span_id_field_for_roots() {
        let formatter = BinaryFormatter::new();
        let cx = SpanContext::new(TraceId::from(7), None, false);
        let bytes = formatter.to_bytes(&cx);
        assert_eq!(bytes.len(), 20);

        let decoded = formatter.from_bytes(&bytes).unwrap();
        assert_eq!(decoded.span_id(), None);
        assert!(!decoded.is_sampled());
    }

    #[test]
    fn known_encoding() {
        let formatter = BinaryFormatter::new();
        let cx = SpanContext::new(TraceId::from(0x0102), Some(SpanId::from(0x0304)), true);
        let mut expected = vec![0u8, 0];
        expected.extend_from_slice(&0x0102u128.to_be_bytes());
        expected.push(1);
        expected.extend_from_slice(&0x0304u64.to_be_bytes());
        expected.extend_from_slice(&[2, 1]);
        assert_eq!(formatter.to_bytes(&cx), expected);
    }

    #[rustfmt::skip]
    fn invalid_data() -> Vec<(Vec<u8>, &'static str)> {
        vec![
            (vec![], "empty payload"),
            (vec![1, 0, 0, 0], "unknown version"),
            (vec![0, 0, 1, 2], "truncated trace id"),
            (vec![0, 9], "unknown field id"),
            (vec![0, 2, 1], "options without trace id"),
        ]
    }

    #[test]
    fn rejects_malformed_payloads() {
        let formatter = BinaryFormatter::new();
        for (bytes, reason) in invalid_data() {
            assert!(formatter.from_bytes(&bytes).is_err(), "{reason}");
        }
    }
}
