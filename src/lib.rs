//! A distributed tracing and stats aggregation core.
//!
//! This crate tracks nested units of work ([`Span`]s) within a logical
//! request, propagates the trace identity across process boundaries via
//! pluggable wire formats, decides probabilistically which traces to keep,
//! and hands completed spans and metric aggregates to pluggable exporter
//! backends.
//!
//! # Tracing
//!
//! A [`RequestTracer`] owns the span stack for one logical request. It
//! establishes the root [`SpanContext`] (decoded from an inbound carrier, or
//! freshly generated), consults the configured [`Sampler`] once per trace,
//! and exports the finished spans when the request ends:
//!
//! ```
//! use opencensus::trace::{InMemorySpanExporter, RequestTracer, Sampler};
//! use std::sync::Arc;
//!
//! let exporter = InMemorySpanExporter::default();
//! let mut tracer = RequestTracer::builder()
//!     .with_exporter(Arc::new(exporter.clone()))
//!     .with_sampler(Sampler::AlwaysSample)
//!     .start("main");
//!
//! let result = tracer.in_span("inner/work", |tracer| {
//!     tracer.add_attribute("key", "value").ok();
//!     1 + 1
//! });
//! assert_eq!(result, 2);
//!
//! tracer.finish();
//! assert_eq!(exporter.finished_spans().len(), 2);
//! ```
//!
//! # Stats
//!
//! Independently of tracing, application code records tagged measurements
//! against registered [`View`]s, which a [`StatsRecorder`] aggregates and
//! flushes to a stats exporter on a caller-chosen cadence:
//!
//! ```
//! use opencensus::stats::{Aggregation, Measure, MeasurementMap, StatsRecorder, View};
//! use opencensus::tags::{TagContext, TagKey};
//!
//! let method = TagKey::new("method");
//! let latency = Measure::new_float("task/latency", "task latency", "ms");
//! let recorder = StatsRecorder::new();
//! recorder
//!     .register_view(View::new(
//!         "task/latency/sum",
//!         "total latency by method",
//!         latency.clone(),
//!         Aggregation::sum(),
//!         vec![method.clone()],
//!     ))
//!     .unwrap();
//!
//! let tags = TagContext::builder().insert(method, "run").build();
//! let mut map = MeasurementMap::new();
//! map.put(latency.measurement(12.5));
//! recorder.record(map, &tags);
//! ```
//!
//! Instrumentation failures degrade observability, never availability:
//! exporter errors and mutations of closed spans are reported through
//! [`tracing`] diagnostics and otherwise swallowed.
//!
//! [`Span`]: trace::Span
//! [`RequestTracer`]: trace::RequestTracer
//! [`SpanContext`]: trace::SpanContext
//! [`Sampler`]: trace::Sampler
//! [`View`]: stats::View
//! [`StatsRecorder`]: stats::StatsRecorder

#![warn(missing_docs, missing_debug_implementations)]

pub mod propagation;
pub mod stats;
pub mod tags;
pub mod trace;

pub use propagation::PropagationError;
pub use stats::StatsError;
pub use trace::TraceError;
