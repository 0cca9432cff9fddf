//! Stats exporters.

use crate::stats::{AggregationData, StatsError, View};
use crate::tags::TagValue;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// One aggregation bucket of a view, ready for export.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// The values of the view's tag keys identifying this bucket, in the
    /// view's normalized key order. Operations that did not set a key
    /// contribute [`TagValue::empty`].
    pub tag_values: Vec<TagValue>,
    /// The aggregated value.
    pub data: AggregationData,
    /// Opaque attachments carried by measurements folded into this bucket,
    /// last write per key wins. Not part of the bucket key.
    pub attachments: HashMap<String, String>,
}

/// A snapshot of one view's aggregation state.
#[derive(Clone, Debug)]
pub struct ViewData {
    /// The view the rows belong to.
    pub view: View,
    /// One row per aggregation bucket, in arbitrary order.
    pub rows: Vec<Row>,
}

/// The sink that receives aggregated stats for a backend.
///
/// Flushed on a caller-chosen cadence. Export failures are caught at the
/// call site, reported as diagnostics, and never propagate to application
/// code. Implementations must tolerate concurrent calls.
pub trait StatsExporter: Send + Sync + Debug {
    /// Deliver a snapshot of view aggregations to the backend.
    fn export(&self, data: Vec<ViewData>) -> Result<(), StatsError>;
}

/// A stats exporter that stores snapshots in memory.
///
/// Useful for testing. Clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStatsExporter {
    snapshots: Arc<Mutex<Vec<ViewData>>>,
}

impl InMemoryStatsExporter {
    /// All view data exported so far, oldest first.
    pub fn exported_view_data(&self) -> Vec<ViewData> {
        self.snapshots
            .lock()
            .map(|snapshots| snapshots.clone())
            .unwrap_or_default()
    }

    /// Clear the stored snapshots.
    pub fn reset(&self) {
        if let Ok(mut snapshots) = self.snapshots.lock() {
            snapshots.clear();
        }
    }
}

impl StatsExporter for InMemoryStatsExporter {
    fn export(&self, mut data: Vec<ViewData>) -> Result<(), StatsError> {
        self.snapshots
            .lock()
            .map(|mut snapshots| snapshots.append(&mut data))
            .map_err(|err| StatsError::Other(err.to_string()))
    }
}
