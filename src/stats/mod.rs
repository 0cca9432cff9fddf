//! Stats recording and aggregation.
//!
//! Application code creates [`Measure`]s for the quantities it cares about
//! and registers [`View`]s that say how to summarize them. Recording a
//! [`MeasurementMap`] through a [`StatsRecorder`] folds each value into
//! every view watching its measure, bucketed by the [`TagContext`] the
//! caller supplies; snapshots of the aggregated state flow to a
//! [`StatsExporter`].
//!
//! ```
//! use opencensus::stats::{Aggregation, Measure, MeasurementMap, StatsRecorder, View};
//! use opencensus::tags::{TagContext, TagKey};
//!
//! let recorder = StatsRecorder::new();
//! let latency = Measure::new_float("http/latency", "request latency", "ms");
//! recorder.register_view(View::new(
//!     "http/latency_count",
//!     "number of requests",
//!     latency.clone(),
//!     Aggregation::count(),
//!     vec![TagKey::new("method")],
//! ))?;
//!
//! let tags = TagContext::builder()
//!     .insert(TagKey::new("method"), "GET")
//!     .build();
//! let mut map = MeasurementMap::new();
//! map.put(latency.measurement(12.5));
//! recorder.record(map, &tags);
//!
//! assert_eq!(recorder.export().len(), 1);
//! # Ok::<(), opencensus::StatsError>(())
//! ```
//!
//! [`TagContext`]: crate::tags::TagContext

mod aggregation;
mod export;
mod measure;
mod recorder;
mod view;

pub use aggregation::AggregationData;
pub use export::{InMemoryStatsExporter, Row, StatsExporter, ViewData};
pub use measure::{Measure, MeasureKind, MeasureValue, Measurement, MeasurementMap};
pub use recorder::StatsRecorder;
pub use view::{Aggregation, View};

use thiserror::Error;

/// Errors raised by the stats half of the crate.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum StatsError {
    /// A view with the same name is already registered.
    #[error("a view named {0:?} is already registered")]
    DuplicateView(String),

    /// A stats exporter rejected a snapshot.
    #[error("stats export failed: {0}")]
    ExportFailed(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}
