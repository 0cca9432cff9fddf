//! Wire codecs for the propagated trace identity.
//!
//! A [`SpanContext`] crosses process boundaries inside a transport carrier: a
//! text header for HTTP-style transports, a binary metadata value for RPC
//! transports. Codecs are pluggable per transport rather than hard-coded to
//! one wire shape; implement [`TextFormat`] or [`BinaryFormat`] to support
//! another carrier.
//!
//! Contexts produced by a codec's decode side are the only remote contexts
//! in the system: [`SpanContext::is_remote`] is true exactly for them.
//!
//! [`SpanContext::is_remote`]: crate::trace::SpanContext::is_remote

use crate::trace::SpanContext;
use thiserror::Error;

mod binary;
mod cloud_trace;
mod trace_context;

pub use binary::BinaryFormatter;
pub use cloud_trace::CloudTraceFormatter;
pub use trace_context::TraceContextFormatter;

/// Errors when decoding a propagated trace context.
///
/// Callers are expected to discard the carrier value and fall back to a fresh
/// root context rather than failing the request.
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PropagationError {
    /// The carrier value does not match the codec's wire format.
    #[error("invalid trace context format: {0}")]
    InvalidFormat(&'static str),
}

/// A codec carrying the trace identity in a text header.
pub trait TextFormat: Send + Sync + std::fmt::Debug {
    /// Decode a context from a header value.
    fn parse(&self, header: &str) -> Result<SpanContext, PropagationError>;

    /// Encode a context into a header value.
    ///
    /// For every valid context `c`, `parse(&serialize(&c))` reproduces `c`
    /// except for the remote flag, which is always set by `parse`.
    fn serialize(&self, context: &SpanContext) -> String;
}

/// A codec carrying the trace identity in binary transport metadata.
pub trait BinaryFormat: Send + Sync + std::fmt::Debug {
    /// Decode a context from carrier bytes.
    fn from_bytes(&self, bytes: &[u8]) -> Result<SpanContext, PropagationError>;

    /// Encode a context into carrier bytes.
    fn to_bytes(&self, context: &SpanContext) -> Vec<u8>;
}
