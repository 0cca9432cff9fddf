use crate::trace::{
    Annotation, AttributeValue, IdGenerator, Link, MessageEvent, NoopEventHandler,
    NoopSpanExporter, RandomIdGenerator, Sampler, ShouldSample, Span, SpanContext, SpanData,
    SpanEventHandler, SpanExporter, SpanId, SpanOptions, Status, TimeEvent, TraceError, TraceId,
    TraceResult,
};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::SystemTime;

/// Manages sampling and span collection within a single logical request.
///
/// The tracer owns the active span stack for its request: `start` opens the
/// root span, [`in_span`] nests children, and [`finish`] closes whatever is
/// still open and hands the finished spans to the exporter — unless the
/// trace was not sampled, in which case the exporter is never invoked.
///
/// Concurrent requests must use independent `RequestTracer` instances; the
/// stack is deliberately not shared mutable state. Exporters, event
/// handlers, and id generators may be shared freely.
///
/// [`in_span`]: RequestTracer::in_span
/// [`finish`]: RequestTracer::finish
#[derive(Debug)]
pub struct RequestTracer {
    trace_id: TraceId,
    sampled: bool,
    remote_parent: Option<SpanId>,
    exporter: Arc<dyn SpanExporter>,
    event_handler: Arc<dyn SpanEventHandler>,
    id_generator: Box<dyn IdGenerator>,
    /// Every span started in this request, in creation order. Open spans are
    /// addressed through `stack`; closed ones wait here for export.
    spans: Vec<Span>,
    /// Indices into `spans` of the currently open spans, innermost last.
    stack: Vec<usize>,
    finished: bool,
}

/// Configures and starts a [`RequestTracer`].
#[derive(Debug)]
pub struct RequestTracerBuilder {
    exporter: Arc<dyn SpanExporter>,
    sampler: Box<dyn ShouldSample>,
    event_handler: Arc<dyn SpanEventHandler>,
    id_generator: Box<dyn IdGenerator>,
    remote_context: Option<SpanContext>,
    root_options: SpanOptions,
}

impl Default for RequestTracerBuilder {
    fn default() -> Self {
        RequestTracerBuilder {
            exporter: Arc::new(NoopSpanExporter::new()),
            sampler: Box::new(Sampler::AlwaysSample),
            event_handler: Arc::new(NoopEventHandler::new()),
            id_generator: Box::new(RandomIdGenerator::default()),
            remote_context: None,
            root_options: SpanOptions::default(),
        }
    }
}

impl RequestTracerBuilder {
    /// The exporter that receives this request's finished spans.
    pub fn with_exporter(mut self, exporter: Arc<dyn SpanExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    /// The sampling policy, consulted once per locally-rooted trace.
    ///
    /// Defaults to [`Sampler::AlwaysSample`].
    pub fn with_sampler<S: ShouldSample + 'static>(mut self, sampler: S) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    /// The observer notified of span mutations.
    pub fn with_event_handler(mut self, handler: Arc<dyn SpanEventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    /// The id source for new trace and span ids.
    pub fn with_id_generator<G: IdGenerator + 'static>(mut self, generator: G) -> Self {
        self.id_generator = Box::new(generator);
        self
    }

    /// Continue the trace described by a context decoded from an inbound
    /// carrier.
    ///
    /// Only remote contexts are honored: the upstream trace id and sampling
    /// decision are adopted verbatim (so no trace ever mixes sampled and
    /// unsampled spans across processes), and the upstream span becomes the
    /// root span's parent. A non-remote context is ignored.
    pub fn with_remote_context(mut self, context: SpanContext) -> Self {
        if context.is_remote() {
            self.remote_context = Some(context);
        } else {
            tracing::debug!("ignoring non-remote span context for tracer start");
        }
        self
    }

    /// Options for the root span.
    pub fn with_root_options(mut self, options: SpanOptions) -> Self {
        self.root_options = options;
        self
    }

    /// Establish the root trace context, consult the sampler, and open the
    /// root span named `name`.
    pub fn start(self, name: impl Into<Cow<'static, str>>) -> RequestTracer {
        let (trace_id, remote_parent, sampled) = match self.remote_context {
            Some(context) => (
                context.trace_id(),
                context.span_id(),
                context.is_sampled(),
            ),
            None => {
                let trace_id = self.id_generator.new_trace_id();
                let sampled = self.sampler.should_sample(trace_id);
                (trace_id, None, sampled)
            }
        };

        let mut tracer = RequestTracer {
            trace_id,
            sampled,
            remote_parent,
            exporter: self.exporter,
            event_handler: self.event_handler,
            id_generator: self.id_generator,
            spans: Vec::new(),
            stack: Vec::new(),
            finished: false,
        };
        tracer.start_span_with_options(name, &self.root_options);
        tracer
    }
}

impl RequestTracer {
    /// Create a builder with the default exporter, sampler, and id source.
    pub fn builder() -> RequestTracerBuilder {
        RequestTracerBuilder::default()
    }

    /// The id of the trace this request belongs to.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Whether this trace was selected for export.
    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// A fresh context describing the current position in the trace, for
    /// propagation to outbound calls.
    pub fn span_context(&self) -> SpanContext {
        let span_id = self
            .stack
            .last()
            .map(|&index| self.spans[index].span_id())
            .or(self.remote_parent);
        SpanContext::new(self.trace_id, span_id, self.sampled)
    }

    /// Open a child of the current stack top and make it the new top.
    ///
    /// Prefer [`in_span`] where the unit of work is a closure; a span
    /// started here must be ended with [`end_span`].
    ///
    /// [`in_span`]: RequestTracer::in_span
    /// [`end_span`]: RequestTracer::end_span
    pub fn start_span(&mut self, name: impl Into<Cow<'static, str>>) -> SpanId {
        self.start_span_with_options(name, &SpanOptions::default())
    }

    /// [`start_span`] with explicit creation options.
    ///
    /// [`start_span`]: RequestTracer::start_span
    pub fn start_span_with_options(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        options: &SpanOptions,
    ) -> SpanId {
        let span_id = self.id_generator.new_span_id();
        let parent_span_id = self
            .stack
            .last()
            .map(|&index| self.spans[index].span_id())
            .or(self.remote_parent);
        let span = Span::new(
            name.into(),
            span_id,
            parent_span_id,
            self.event_handler.clone(),
            options,
        );
        self.spans.push(span);
        self.stack.push(self.spans.len() - 1);
        span_id
    }

    /// Close the current stack top and restore the previous one.
    ///
    /// Returns the closed span's id, or `None` if no span was open.
    pub fn end_span(&mut self) -> Option<SpanId> {
        self.end_span_at(None)
    }

    /// [`end_span`] with an explicit end time.
    ///
    /// Closing a span before its work completes is supported; whatever end
    /// time is given is recorded.
    ///
    /// [`end_span`]: RequestTracer::end_span
    pub fn end_span_at(&mut self, end_time: Option<SystemTime>) -> Option<SpanId> {
        let index = self.stack.pop()?;
        self.spans[index].close(end_time);
        Some(self.spans[index].span_id())
    }

    /// Run `work` inside a child span.
    ///
    /// The span is opened before `work` runs and is closed — and the
    /// previous stack top restored — on every exit path, including an
    /// unwinding panic. Span lifetime is therefore exception-safe: a failed
    /// unit of work still produces a well-formed closed span.
    pub fn in_span<T, F>(&mut self, name: impl Into<Cow<'static, str>>, work: F) -> T
    where
        F: FnOnce(&mut RequestTracer) -> T,
    {
        self.start_span(name);
        let scope = SpanScope { tracer: self };
        work(&mut *scope.tracer)
    }

    /// The open span at the top of the stack, or `None` outside any span.
    pub fn current_span(&mut self) -> Option<&mut Span> {
        self.stack
            .last()
            .map(|&index| &mut self.spans[index])
    }

    fn with_current_span<T>(
        &mut self,
        apply: impl FnOnce(&mut Span) -> TraceResult<T>,
    ) -> TraceResult<T> {
        match self.current_span() {
            Some(span) => {
                let result = apply(span);
                if let Err(err) = &result {
                    tracing::debug!(error = %err, "span mutation dropped");
                }
                result
            }
            None => Err(TraceError::Other("no span is currently open".to_owned())),
        }
    }

    /// Set an attribute on the current span.
    pub fn add_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> TraceResult<()> {
        self.with_current_span(|span| span.add_attribute(key, value))
    }

    /// Append a text annotation to the current span.
    pub fn add_annotation(&mut self, description: impl Into<String>) -> TraceResult<()> {
        self.with_current_span(|span| {
            span.add_time_event(TimeEvent::Annotation(Annotation::new(description)))
        })
    }

    /// Append a message event to the current span.
    pub fn add_message_event(&mut self, event: MessageEvent) -> TraceResult<()> {
        self.with_current_span(|span| span.add_time_event(TimeEvent::Message(event)))
    }

    /// Append a link to the current span.
    pub fn add_link(&mut self, link: Link) -> TraceResult<()> {
        self.with_current_span(|span| span.add_link(link))
    }

    /// Set the status of the current span.
    pub fn set_status(&mut self, status: Status) -> TraceResult<()> {
        self.with_current_span(|span| span.set_status(status))
    }

    /// End the request: defensively close any still-open spans and, if the
    /// trace was sampled, hand the full span list to the exporter.
    ///
    /// Unsampled traces are discarded without invoking the exporter at all.
    /// Exporter failures are reported as diagnostics and swallowed —
    /// tracing must never crash the traced program. Calling `finish` again
    /// is a no-op.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        while self.end_span().is_some() {}

        if !self.sampled {
            tracing::debug!(
                trace_id = %self.trace_id,
                spans = self.spans.len(),
                "trace not sampled; spans discarded"
            );
            self.spans.clear();
            return;
        }

        let trace_id = self.trace_id;
        let batch: Vec<SpanData> = self
            .spans
            .drain(..)
            .map(|span| SpanData::from_span(span, trace_id))
            .collect();
        if batch.is_empty() {
            return;
        }
        if let Err(err) = self.exporter.export(batch) {
            tracing::warn!(
                trace_id = %self.trace_id,
                error = %err,
                "span export failed; trace dropped"
            );
        }
    }
}

impl Drop for RequestTracer {
    /// Report the trace if the caller never called [`RequestTracer::finish`].
    fn drop(&mut self) {
        self.finish();
    }
}

/// Closes the innermost span when dropped, whether `work` returned or
/// unwound.
struct SpanScope<'a> {
    tracer: &'a mut RequestTracer,
}

impl Drop for SpanScope<'_> {
    fn drop(&mut self) {
        self.tracer.end_span();
    }
}
