use crate::stats::export::{Row, StatsExporter, ViewData};
use crate::stats::{AggregationData, MeasurementMap, StatsError, View};
use crate::tags::{TagContext, TagValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct RowState {
    data: AggregationData,
    attachments: HashMap<String, String>,
}

#[derive(Debug)]
struct ViewState {
    view: View,
    rows: HashMap<Vec<TagValue>, RowState>,
}

#[derive(Debug, Default)]
struct Registry {
    /// View state keyed by view name.
    views: HashMap<String, ViewState>,
    /// View names watching each measure name.
    by_measure: HashMap<String, Vec<String>>,
}

/// The process-wide entry point for recording and aggregating stats.
///
/// Holds the registered [`View`]s and the running aggregation state of
/// each. Measurements recorded against measures no view watches are
/// dropped. Cheap to clone; clones share the same registry.
#[derive(Clone, Debug, Default)]
pub struct StatsRecorder {
    registry: Arc<Mutex<Registry>>,
}

impl StatsRecorder {
    /// Create a recorder with no registered views.
    pub fn new() -> Self {
        StatsRecorder::default()
    }

    /// Register a view, enabling aggregation of its measure.
    ///
    /// View names are unique: registering a second view under an existing
    /// name fails with [`StatsError::DuplicateView`] and leaves the first
    /// registration untouched.
    pub fn register_view(&self, view: View) -> Result<(), StatsError> {
        let mut registry = self
            .registry
            .lock()
            .map_err(|err| StatsError::Other(err.to_string()))?;
        if registry.views.contains_key(view.name()) {
            return Err(StatsError::DuplicateView(view.name().to_string()));
        }
        registry
            .by_measure
            .entry(view.measure().name().to_string())
            .or_default()
            .push(view.name().to_string());
        registry.views.insert(
            view.name().to_string(),
            ViewState {
                view,
                rows: HashMap::new(),
            },
        );
        Ok(())
    }

    /// Record a batch of measurements under the given tag context.
    ///
    /// Each measurement is folded into every registered view watching its
    /// measure, bucketed by the values `tags` holds for the view's tag
    /// keys. Measurements of unwatched measures are silently dropped.
    pub fn record(&self, measurements: MeasurementMap, tags: &TagContext) {
        let (measurements, attachments) = measurements.into_parts();
        if measurements.is_empty() {
            return;
        }
        let mut registry = match self.registry.lock() {
            Ok(registry) => registry,
            Err(err) => {
                tracing::warn!(error = %err, "stats registry poisoned, dropping measurements");
                return;
            }
        };
        for measurement in measurements {
            let Some(view_names) = registry.by_measure.get(measurement.measure().name()) else {
                continue;
            };
            for view_name in view_names.clone() {
                let Some(state) = registry.views.get_mut(&view_name) else {
                    continue;
                };
                let key: Vec<TagValue> = state
                    .view
                    .tag_keys()
                    .iter()
                    .map(|tag_key| tags.get(tag_key).cloned().unwrap_or_default())
                    .collect();
                let aggregation = state.view.aggregation().clone();
                let row = state.rows.entry(key).or_insert_with(|| RowState {
                    data: AggregationData::new(&aggregation),
                    attachments: HashMap::new(),
                });
                row.data.add(measurement.value().as_f64());
                for (attachment_key, attachment_value) in &attachments {
                    row.attachments
                        .insert(attachment_key.clone(), attachment_value.clone());
                }
            }
        }
    }

    /// Snapshot the aggregation state of every registered view.
    ///
    /// Views that have received no measurements yet appear with no rows.
    pub fn export(&self) -> Vec<ViewData> {
        let registry = match self.registry.lock() {
            Ok(registry) => registry,
            Err(err) => {
                tracing::warn!(error = %err, "stats registry poisoned, exporting nothing");
                return Vec::new();
            }
        };
        registry
            .views
            .values()
            .map(|state| ViewData {
                view: state.view.clone(),
                rows: state
                    .rows
                    .iter()
                    .map(|(tag_values, row)| Row {
                        tag_values: tag_values.clone(),
                        data: row.data.clone(),
                        attachments: row.attachments.clone(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Snapshot the current state and hand it to `exporter`.
    ///
    /// Export failures are reported as diagnostics and swallowed;
    /// recording must never fail because a backend is down.
    pub fn flush(&self, exporter: &dyn StatsExporter) {
        let data = self.export();
        if data.is_empty() {
            return;
        }
        if let Err(err) = exporter.export(data) {
            tracing::warn!(error = %err, "stats export failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Aggregation, InMemoryStatsExporter, Measure};
    use crate::tags::TagKey;

    fn latency_view(measure: &Measure) -> View {
        View::new(
            "latency_sum",
            "total latency",
            measure.clone(),
            Aggregation::sum(),
            vec![TagKey::new("method")],
        )
    }

    #[test]
    fn duplicate_view_name_is_rejected() {
        let recorder = StatsRecorder::new();
        let latency = Measure::new_float("latency", "latency", "ms");
        recorder.register_view(latency_view(&latency)).unwrap();
        assert_eq!(
            recorder.register_view(latency_view(&latency)),
            Err(StatsError::DuplicateView("latency_sum".to_string()))
        );
    }

    #[test]
    fn unwatched_measures_are_dropped() {
        let recorder = StatsRecorder::new();
        let latency = Measure::new_float("latency", "latency", "ms");
        recorder.register_view(latency_view(&latency)).unwrap();

        let orphan = Measure::new_int("orphan", "unwatched", "1");
        let mut map = MeasurementMap::new();
        map.put(orphan.measurement_int(1));
        recorder.record(map, &TagContext::empty());

        let data = recorder.export();
        assert_eq!(data.len(), 1);
        assert!(data[0].rows.is_empty());
    }

    #[test]
    fn tag_values_split_aggregation_buckets() {
        let recorder = StatsRecorder::new();
        let latency = Measure::new_float("latency", "latency", "ms");
        recorder.register_view(latency_view(&latency)).unwrap();

        let method = TagKey::new("method");
        for (value, verb) in [(5.0, "get"), (7.0, "get"), (11.0, "put")] {
            let mut map = MeasurementMap::new();
            map.put(latency.measurement(value));
            let tags = TagContext::builder().insert(method.clone(), verb).build();
            recorder.record(map, &tags);
        }

        let data = recorder.export();
        assert_eq!(data.len(), 1);
        let mut rows = data[0].rows.clone();
        rows.sort_by(|a, b| a.tag_values.cmp(&b.tag_values));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tag_values, [TagValue::new("get")]);
        assert_eq!(rows[0].data, AggregationData::Sum(12.0));
        assert_eq!(rows[1].tag_values, [TagValue::new("put")]);
        assert_eq!(rows[1].data, AggregationData::Sum(11.0));
    }

    #[test]
    fn missing_tag_keys_bucket_under_empty_value() {
        let recorder = StatsRecorder::new();
        let latency = Measure::new_float("latency", "latency", "ms");
        recorder.register_view(latency_view(&latency)).unwrap();

        let mut map = MeasurementMap::new();
        map.put(latency.measurement(3.0));
        recorder.record(map, &TagContext::empty());

        let data = recorder.export();
        assert_eq!(data[0].rows.len(), 1);
        assert_eq!(data[0].rows[0].tag_values, [TagValue::empty()]);
    }

    #[test]
    fn attachments_pass_through_to_rows() {
        let recorder = StatsRecorder::new();
        let latency = Measure::new_float("latency", "latency", "ms");
        recorder.register_view(latency_view(&latency)).unwrap();

        let mut map = MeasurementMap::new();
        map.put(latency.measurement(3.0))
            .put_attachment("trace_id", "123456789012345678901234567890ab");
        recorder.record(map, &TagContext::empty());

        let data = recorder.export();
        assert_eq!(
            data[0].rows[0].attachments.get("trace_id").map(String::as_str),
            Some("123456789012345678901234567890ab")
        );
    }

    #[test]
    fn flush_delivers_snapshot_to_exporter() {
        let recorder = StatsRecorder::new();
        let latency = Measure::new_float("latency", "latency", "ms");
        recorder.register_view(latency_view(&latency)).unwrap();

        let mut map = MeasurementMap::new();
        map.put(latency.measurement(3.0));
        recorder.record(map, &TagContext::empty());

        let exporter = InMemoryStatsExporter::default();
        recorder.flush(&exporter);
        let exported = exporter.exported_view_data();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].view.name(), "latency_sum");
        assert_eq!(exported[0].rows[0].data, AggregationData::Sum(3.0));
    }

    #[test]
    fn flush_with_no_registered_views_skips_exporter() {
        let recorder = StatsRecorder::new();
        let exporter = InMemoryStatsExporter::default();
        recorder.flush(&exporter);
        assert!(exporter.exported_view_data().is_empty());
    }
}
