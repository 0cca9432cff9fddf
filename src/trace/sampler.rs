use crate::trace::TraceId;

/// Precision of the probability sampler's deterministic decision.
///
/// The same trace id must yield the same decision in every process of a
/// distributed call chain without coordination, so the decision is a pure
/// function of the trace id reduced modulo this constant.
const PRECISION: u64 = 1 << 32;

/// The sampling decision interface.
///
/// The decision is computed once per trace identity and inherited by every
/// span in that trace: no trace may contain both sampled and unsampled
/// spans. Implementations must therefore be deterministic in `trace_id`.
pub trait ShouldSample: Send + Sync + std::fmt::Debug {
    /// Decide whether the trace identified by `trace_id` is kept.
    fn should_sample(&self, trace_id: TraceId) -> bool;
}

/// Built-in sampling policies.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub enum Sampler {
    /// Keep every trace. This is the default.
    #[default]
    AlwaysSample,
    /// Drop every trace.
    NeverSample,
    /// Keep a given fraction of traces.
    ///
    /// Fractions >= 1 always sample; fractions <= 0 never sample. The
    /// decision is derived from the trace id itself, so independent
    /// processes agree on it for the same trace.
    Probability(f64),
}

impl ShouldSample for Sampler {
    fn should_sample(&self, trace_id: TraceId) -> bool {
        match self {
            Sampler::AlwaysSample => true,
            Sampler::NeverSample => false,
            Sampler::Probability(prob) => {
                if *prob >= 1.0 {
                    true
                } else {
                    let threshold = (prob.max(0.0) * PRECISION as f64) as u64;
                    trace_id.low_u64() % PRECISION < threshold
                }
            }
        }
    }
}

/// Keeps a trace only when every composed policy keeps it.
///
/// Deterministic children compose into a deterministic decision. An empty
/// composition keeps everything.
#[derive(Debug, Default)]
pub struct MultiSampler {
    samplers: Vec<Box<dyn ShouldSample>>,
}

impl MultiSampler {
    /// Create an empty composition.
    pub fn new() -> Self {
        MultiSampler::default()
    }

    /// Add a policy that must also agree to keep a trace.
    pub fn push(mut self, sampler: impl ShouldSample + 'static) -> Self {
        self.samplers.push(Box::new(sampler));
        self
    }
}

impl ShouldSample for MultiSampler {
    fn should_sample(&self, trace_id: TraceId) -> bool {
        self.samplers
            .iter()
            .all(|sampler| sampler.should_sample(trace_id))
    }
}
