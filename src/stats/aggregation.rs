use crate::stats::Aggregation;
use std::sync::Arc;

/// The running state of one aggregation bucket.
///
/// Created lazily when the first matching measurement arrives and updated
/// in place for every subsequent one; buckets are never removed within a
/// process lifetime.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum AggregationData {
    /// Number of measurements recorded.
    Count(u64),
    /// Running sum of recorded values.
    Sum(f64),
    /// The most recently recorded value.
    LastValue(f64),
    /// Histogram state over explicit boundaries.
    Distribution {
        /// Number of measurements recorded.
        count: u64,
        /// Running sum of recorded values.
        sum: f64,
        /// Smallest recorded value.
        min: f64,
        /// Largest recorded value.
        max: f64,
        /// The boundaries the histogram was built over.
        bounds: Arc<[f64]>,
        /// One counter per bucket: `bucket_counts[i]` counts values with
        /// exactly `i` boundaries at or below them, so the final counter is
        /// the overflow bucket. The counters always sum to `count`.
        bucket_counts: Vec<u64>,
    },
}

impl AggregationData {
    /// Empty state for the given aggregation kind.
    pub(crate) fn new(aggregation: &Aggregation) -> Self {
        match aggregation {
            Aggregation::Count => AggregationData::Count(0),
            Aggregation::Sum => AggregationData::Sum(0.0),
            Aggregation::LastValue => AggregationData::LastValue(0.0),
            Aggregation::Distribution { bounds } => AggregationData::Distribution {
                count: 0,
                sum: 0.0,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
                bounds: bounds.clone(),
                bucket_counts: vec![0; bounds.len() + 1],
            },
        }
    }

    /// Fold one value into the state.
    pub(crate) fn add(&mut self, value: f64) {
        match self {
            AggregationData::Count(count) => *count += 1,
            AggregationData::Sum(sum) => *sum += value,
            AggregationData::LastValue(last) => *last = value,
            AggregationData::Distribution {
                count,
                sum,
                min,
                max,
                bounds,
                bucket_counts,
            } => {
                *count += 1;
                *sum += value;
                *min = min.min(value);
                *max = max.max(value);
                let index = bounds.iter().take_while(|bound| **bound <= value).count();
                bucket_counts[index] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_increments_by_one() {
        let mut data = AggregationData::new(&Aggregation::count());
        data.add(5.0);
        data.add(-3.0);
        assert_eq!(data, AggregationData::Count(2));
    }

    #[test]
    fn sum_accumulates() {
        let mut data = AggregationData::new(&Aggregation::sum());
        data.add(5.0);
        data.add(-3.0);
        assert_eq!(data, AggregationData::Sum(2.0));
    }

    #[test]
    fn last_value_overwrites() {
        let mut data = AggregationData::new(&Aggregation::last_value());
        data.add(5.0);
        data.add(7.5);
        assert_eq!(data, AggregationData::LastValue(7.5));
    }

    #[test]
    fn distribution_routes_values_to_buckets() {
        let mut data = AggregationData::new(&Aggregation::distribution(vec![
            0.0,
            65_536.0,
            4_294_967_296.0,
        ]));
        for value in [100.0, 70_000.0, 5_000_000_000.0] {
            data.add(value);
        }
        match data {
            AggregationData::Distribution {
                count,
                sum,
                min,
                max,
                bucket_counts,
                ..
            } => {
                assert_eq!(count, 3);
                assert_eq!(sum, 5_000_070_100.0);
                assert_eq!(min, 100.0);
                assert_eq!(max, 5_000_000_000.0);
                // One value per boundary-defined bucket; the last value is
                // beyond the final boundary and lands in the overflow
                // counter.
                assert_eq!(bucket_counts, [0, 1, 1, 1]);
            }
            other => panic!("unexpected aggregation data {other:?}"),
        }
    }

    #[test]
    fn distribution_bucket_counts_sum_to_count() {
        let mut data = AggregationData::new(&Aggregation::distribution(vec![1.0, 10.0, 100.0]));
        let values = [-5.0, 0.5, 1.0, 3.0, 10.0, 99.9, 100.0, 1_000.0];
        for value in values {
            data.add(value);
        }
        match data {
            AggregationData::Distribution {
                count,
                bucket_counts,
                ..
            } => {
                assert_eq!(count, values.len() as u64);
                assert_eq!(bucket_counts.iter().sum::<u64>(), count);
                assert_eq!(bucket_counts, [2, 2, 2, 2]);
            }
            other => panic!("unexpected aggregation data {other:?}"),
        }
    }
}
