use opencensus::stats::{
    Aggregation, AggregationData, InMemoryStatsExporter, Measure, MeasurementMap, StatsError,
    StatsRecorder, View,
};
use opencensus::tags::{TagContext, TagKey, TagValue};

fn record_one(recorder: &StatsRecorder, measure: &Measure, value: f64, tags: &TagContext) {
    let mut map = MeasurementMap::new();
    map.put(measure.measurement(value));
    recorder.record(map, tags);
}

#[test]
fn distribution_view_routes_values_across_boundaries() {
    let recorder = StatsRecorder::new();
    let size = Measure::new_int("rpc/size", "payload size", "By");
    recorder
        .register_view(View::new(
            "rpc/size/distribution",
            "payload size distribution",
            size.clone(),
            Aggregation::distribution(vec![0.0, 65_536.0, 4_294_967_296.0]),
            vec![],
        ))
        .unwrap();

    for value in [100.0, 70_000.0, 5_000_000_000.0] {
        record_one(&recorder, &size, value, &TagContext::empty());
    }

    let data = recorder.export();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].rows.len(), 1);
    match &data[0].rows[0].data {
        AggregationData::Distribution {
            count,
            sum,
            bucket_counts,
            ..
        } => {
            assert_eq!(*count, 3);
            assert_eq!(*sum, 5_000_070_100.0);
            assert_eq!(*bucket_counts, [0, 1, 1, 1]);
            assert_eq!(bucket_counts.iter().sum::<u64>(), *count);
        }
        other => panic!("unexpected aggregation data {other:?}"),
    }
}

#[test]
fn one_measure_can_feed_several_views() {
    let recorder = StatsRecorder::new();
    let latency = Measure::new_float("http/latency", "latency", "ms");
    recorder
        .register_view(View::new(
            "http/latency/count",
            "request count",
            latency.clone(),
            Aggregation::count(),
            vec![],
        ))
        .unwrap();
    recorder
        .register_view(View::new(
            "http/latency/last",
            "latest latency",
            latency.clone(),
            Aggregation::last_value(),
            vec![],
        ))
        .unwrap();

    for value in [4.0, 9.0] {
        record_one(&recorder, &latency, value, &TagContext::empty());
    }

    let mut data = recorder.export();
    data.sort_by(|a, b| a.view.name().cmp(b.view.name()));
    assert_eq!(data[0].rows[0].data, AggregationData::Count(2));
    assert_eq!(data[1].rows[0].data, AggregationData::LastValue(9.0));
}

#[test]
fn duplicate_view_registration_fails() {
    let recorder = StatsRecorder::new();
    let latency = Measure::new_float("http/latency", "latency", "ms");
    let view = View::new(
        "http/latency/count",
        "request count",
        latency,
        Aggregation::count(),
        vec![],
    );
    recorder.register_view(view.clone()).unwrap();
    assert!(matches!(
        recorder.register_view(view),
        Err(StatsError::DuplicateView(name)) if name == "http/latency/count"
    ));
}

#[test]
fn tags_outside_the_view_keys_do_not_split_buckets() {
    let recorder = StatsRecorder::new();
    let latency = Measure::new_float("http/latency", "latency", "ms");
    let method = TagKey::new("method");
    recorder
        .register_view(View::new(
            "http/latency/sum",
            "latency by method",
            latency.clone(),
            Aggregation::sum(),
            vec![method.clone()],
        ))
        .unwrap();

    // Same method, different host: the host key is not part of the view, so
    // both measurements fold into one bucket.
    let host = TagKey::new("host");
    for host_value in ["a.example", "b.example"] {
        let tags = TagContext::builder()
            .insert(method.clone(), "get")
            .insert(host.clone(), host_value)
            .build();
        record_one(&recorder, &latency, 1.5, &tags);
    }

    let data = recorder.export();
    assert_eq!(data[0].rows.len(), 1);
    assert_eq!(data[0].rows[0].tag_values, [TagValue::new("get")]);
    assert_eq!(data[0].rows[0].data, AggregationData::Sum(3.0));
}

#[test]
fn attachments_survive_aggregation() {
    let recorder = StatsRecorder::new();
    let latency = Measure::new_float("http/latency", "latency", "ms");
    recorder
        .register_view(View::new(
            "http/latency/count",
            "request count",
            latency.clone(),
            Aggregation::count(),
            vec![],
        ))
        .unwrap();

    let mut map = MeasurementMap::new();
    map.put(latency.measurement(2.0))
        .put_attachment("trace_id", "123456789012345678901234567890ab")
        .put_attachment("span_id", "1234");
    recorder.record(map, &TagContext::empty());

    let exporter = InMemoryStatsExporter::default();
    recorder.flush(&exporter);
    let exported = exporter.exported_view_data();
    assert_eq!(exported.len(), 1);
    let attachments = &exported[0].rows[0].attachments;
    assert_eq!(
        attachments.get("trace_id").map(String::as_str),
        Some("123456789012345678901234567890ab")
    );
    assert_eq!(attachments.get("span_id").map(String::as_str), Some("1234"));
}

#[test]
fn recording_an_unregistered_measure_is_a_silent_no_op() {
    let recorder = StatsRecorder::new();
    let orphan = Measure::new_int("orphan", "nothing watches this", "1");
    record_one(&recorder, &orphan, 1.0, &TagContext::empty());
    assert!(recorder.export().is_empty());
}
