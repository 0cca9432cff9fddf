use opencensus::propagation::{BinaryFormat, BinaryFormatter, CloudTraceFormatter, TextFormat};
use opencensus::trace::{
    InMemorySpanExporter, IncrementIdGenerator, RequestTracer, Sampler, Status,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[test]
fn inbound_header_flows_through_to_exported_spans() {
    let context = CloudTraceFormatter::new()
        .parse("123456789012345678901234567890ab/1234;o=1")
        .unwrap();
    assert_eq!(
        context.trace_id().to_string(),
        "123456789012345678901234567890ab"
    );
    assert_eq!(context.span_id().map(|id| id.to_u64()), Some(1234));
    assert!(context.is_sampled());

    let exporter = InMemorySpanExporter::default();
    let mut tracer = RequestTracer::builder()
        .with_exporter(Arc::new(exporter.clone()))
        .with_remote_context(context)
        .start("handle_request");
    tracer.in_span("query", |_| {});
    tracer.finish();

    let spans = exporter.finished_spans();
    assert_eq!(spans.len(), 2);
    for span in &spans {
        assert_eq!(
            span.trace_id.to_string(),
            "123456789012345678901234567890ab"
        );
    }
    // The upstream span parents the local root.
    assert_eq!(spans[0].parent_span_id.map(|id| id.to_u64()), Some(1234));
    assert_eq!(spans[1].parent_span_id, Some(spans[0].span_id));
}

#[test]
fn header_without_a_sampling_decision_falls_back_to_a_fresh_root() {
    // A header that carries no ";o=" segment is malformed. The caller
    // discards it and starts a fresh root, so the local sampler decides —
    // the trace must not be silently dropped under AlwaysSample.
    let formatter = CloudTraceFormatter::new();
    assert!(formatter.parse("4bf92f3577b34da6a3ce929d0e0e4736/7").is_err());

    let exporter = InMemorySpanExporter::default();
    let mut tracer = RequestTracer::builder()
        .with_exporter(Arc::new(exporter.clone()))
        .with_sampler(Sampler::AlwaysSample)
        .start("handle_request");
    assert!(tracer.is_sampled());
    assert_ne!(
        tracer.trace_id().to_string(),
        "4bf92f3577b34da6a3ce929d0e0e4736"
    );
    tracer.finish();

    let spans = exporter.finished_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].parent_span_id, None);
}

#[test]
fn outbound_header_round_trips_through_the_text_codec() {
    let formatter = CloudTraceFormatter::new();
    let mut tracer = RequestTracer::builder()
        .with_id_generator(IncrementIdGenerator::new())
        .start("main");

    tracer.in_span("outbound", |tracer| {
        let header = formatter.serialize(&tracer.span_context());
        let reparsed = formatter.parse(&header).unwrap();
        assert_eq!(reparsed.trace_id(), tracer.trace_id());
        assert_eq!(
            reparsed.span_id(),
            Some(tracer.current_span().unwrap().span_id())
        );
        assert!(reparsed.is_sampled());
        assert!(reparsed.is_remote());
    });
}

#[test]
fn binary_codec_round_trips_the_tracer_context() {
    let formatter = BinaryFormatter::new();
    let tracer = RequestTracer::builder().start("main");

    let context = tracer.span_context();
    let decoded = formatter.from_bytes(&formatter.to_bytes(&context)).unwrap();
    assert_eq!(decoded.trace_id(), context.trace_id());
    assert_eq!(decoded.span_id(), context.span_id());
    assert_eq!(decoded.is_sampled(), context.is_sampled());
}

#[test]
fn failing_work_still_produces_a_closed_span() {
    let exporter = InMemorySpanExporter::default();
    let mut tracer = RequestTracer::builder()
        .with_exporter(Arc::new(exporter.clone()))
        .start("main");

    let result = catch_unwind(AssertUnwindSafe(|| {
        tracer.in_span("failing", |tracer| {
            tracer.set_status(Status::error("boom")).ok();
            panic!("boom");
        })
    }));
    assert!(result.is_err());
    tracer.finish();

    let spans = exporter.finished_spans();
    let failing = spans.iter().find(|span| span.name == "failing").unwrap();
    assert!(failing.end_time >= failing.start_time);
    assert_eq!(
        failing.status,
        Some(Status::error("boom"))
    );
}

#[test]
fn unsampled_request_never_invokes_the_exporter() {
    let exporter = InMemorySpanExporter::default();
    let mut tracer = RequestTracer::builder()
        .with_exporter(Arc::new(exporter.clone()))
        .with_sampler(Sampler::Probability(0.0))
        .start("main");

    tracer.in_span("work", |tracer| {
        tracer.add_annotation("ignored").ok();
    });
    tracer.finish();
    tracer.finish();

    assert!(exporter.finished_spans().is_empty());
}

#[test]
fn probability_sampler_is_deterministic_per_trace() {
    let sampled_somewhere = (0..64).any(|_| {
        let tracer = RequestTracer::builder()
            .with_sampler(Sampler::Probability(0.5))
            .start("main");
        tracer.is_sampled()
    });
    assert!(sampled_somewhere);

    // A resumed trace keeps the upstream decision, so it can never flip
    // from sampled to unsampled mid-flight.
    let context = CloudTraceFormatter::new()
        .parse("123456789012345678901234567890ab/1;o=1")
        .unwrap();
    for _ in 0..8 {
        let tracer = RequestTracer::builder()
            .with_sampler(Sampler::Probability(0.5))
            .with_remote_context(context.clone())
            .start("main");
        assert!(tracer.is_sampled());
    }
}

#[test]
fn span_timestamps_are_ordered() {
    let exporter = InMemorySpanExporter::default();
    let mut tracer = RequestTracer::builder()
        .with_exporter(Arc::new(exporter.clone()))
        .start("main");
    tracer.in_span("work", |_| {});
    tracer.finish();

    for span in exporter.finished_spans() {
        assert!(span.end_time >= span.start_time, "span {:?}", span.name);
    }
}
