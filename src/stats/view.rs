use crate::stats::Measure;
use crate::tags::TagKey;
use std::sync::Arc;

/// How a view summarizes the measurements recorded against it.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Aggregation {
    /// The number of recorded measurements.
    Count,
    /// The running sum of recorded values.
    Sum,
    /// The most recently recorded value.
    LastValue,
    /// A histogram over explicit bucket boundaries.
    Distribution {
        /// Sorted upper boundaries. `bounds.len() + 1` buckets exist: a
        /// value lands in the bucket indexed by the number of boundaries
        /// less than or equal to it, so the final bucket collects overflow
        /// beyond the last boundary.
        bounds: Arc<[f64]>,
    },
}

impl Aggregation {
    /// Count aggregation.
    pub fn count() -> Self {
        Aggregation::Count
    }

    /// Sum aggregation.
    pub fn sum() -> Self {
        Aggregation::Sum
    }

    /// Last-value aggregation.
    pub fn last_value() -> Self {
        Aggregation::LastValue
    }

    /// Distribution aggregation over the given bucket boundaries.
    ///
    /// Boundaries are sorted; a caller-supplied order is not significant.
    pub fn distribution(mut bounds: Vec<f64>) -> Self {
        bounds.sort_by(|a, b| a.total_cmp(b));
        Aggregation::Distribution {
            bounds: bounds.into(),
        }
    }
}

#[derive(Debug)]
struct ViewInner {
    name: String,
    description: String,
    measure: Measure,
    aggregation: Aggregation,
    tag_keys: Vec<TagKey>,
}

/// A registered way of summarizing one measure.
///
/// A view names the measure it watches, the [`Aggregation`] applied, and
/// the ordered set of tag keys it breaks the aggregation down by. The view
/// name is the unique registration key. Cheap to clone.
#[derive(Clone, Debug)]
pub struct View(Arc<ViewInner>);

impl View {
    /// Create a view.
    ///
    /// Duplicate tag keys are collapsed; key order is normalized so that
    /// two views listing the same keys in different orders aggregate
    /// identically.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        measure: Measure,
        aggregation: Aggregation,
        mut tag_keys: Vec<TagKey>,
    ) -> Self {
        tag_keys.sort();
        tag_keys.dedup();
        View(Arc::new(ViewInner {
            name: name.into(),
            description: description.into(),
            measure,
            aggregation,
            tag_keys,
        }))
    }

    /// The unique name of the view.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// A human-readable description of the view.
    pub fn description(&self) -> &str {
        &self.0.description
    }

    /// The measure this view aggregates.
    pub fn measure(&self) -> &Measure {
        &self.0.measure
    }

    /// The aggregation applied to recorded values.
    pub fn aggregation(&self) -> &Aggregation {
        &self.0.aggregation
    }

    /// The dimension keys the aggregation is broken down by, in normalized
    /// order.
    pub fn tag_keys(&self) -> &[TagKey] {
        &self.0.tag_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_bounds_are_sorted() {
        let aggregation = Aggregation::distribution(vec![100.0, 0.0, 50.0]);
        match aggregation {
            Aggregation::Distribution { bounds } => {
                assert_eq!(bounds.as_ref(), [0.0, 50.0, 100.0])
            }
            other => panic!("unexpected aggregation {other:?}"),
        }
    }

    #[test]
    fn tag_keys_are_normalized() {
        let measure = Measure::new_int("m", "m", "1");
        let view = View::new(
            "v",
            "v",
            measure,
            Aggregation::count(),
            vec![
                TagKey::new("b"),
                TagKey::new("a"),
                TagKey::new("b"),
            ],
        );
        assert_eq!(view.tag_keys(), [TagKey::new("a"), TagKey::new("b")]);
    }
}
