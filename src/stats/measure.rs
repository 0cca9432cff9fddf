use std::collections::HashMap;
use std::sync::Arc;

/// Whether a measure records integer or floating-point values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureKind {
    /// Values are 64-bit signed integers.
    Int,
    /// Values are 64-bit floats.
    Float,
}

#[derive(Debug)]
struct MeasureInner {
    name: String,
    description: String,
    unit: String,
    kind: MeasureKind,
}

/// A named quantity that application code records values of.
///
/// Immutable after creation; the name is the unique key linking
/// measurements to the [`View`]s that aggregate them. Cheap to clone.
///
/// [`View`]: crate::stats::View
#[derive(Clone, Debug)]
pub struct Measure(Arc<MeasureInner>);

impl Measure {
    /// Create a measure recording integer values.
    pub fn new_int(
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Measure(Arc::new(MeasureInner {
            name: name.into(),
            description: description.into(),
            unit: unit.into(),
            kind: MeasureKind::Int,
        }))
    }

    /// Create a measure recording floating-point values.
    pub fn new_float(
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Measure(Arc::new(MeasureInner {
            name: name.into(),
            description: description.into(),
            unit: unit.into(),
            kind: MeasureKind::Float,
        }))
    }

    /// The unique name of the measure.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// A human-readable description of what the measure captures.
    pub fn description(&self) -> &str {
        &self.0.description
    }

    /// The unit of recorded values, e.g. `"ms"` or `"By"`.
    pub fn unit(&self) -> &str {
        &self.0.unit
    }

    /// Whether values are integers or floats.
    pub fn kind(&self) -> MeasureKind {
        self.0.kind
    }

    /// Create a measurement of this measure.
    ///
    /// Integer measures truncate the given value.
    pub fn measurement(&self, value: f64) -> Measurement {
        let value = match self.kind() {
            MeasureKind::Int => MeasureValue::Int(value as i64),
            MeasureKind::Float => MeasureValue::Float(value),
        };
        Measurement {
            measure: self.clone(),
            value,
        }
    }

    /// Create an integer measurement of this measure.
    pub fn measurement_int(&self, value: i64) -> Measurement {
        let value = match self.kind() {
            MeasureKind::Int => MeasureValue::Int(value),
            MeasureKind::Float => MeasureValue::Float(value as f64),
        };
        Measurement {
            measure: self.clone(),
            value,
        }
    }
}

/// A recorded value of a [`Measure`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeasureValue {
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
}

impl MeasureValue {
    /// The value as a float, the form aggregation runs on.
    pub fn as_f64(self) -> f64 {
        match self {
            MeasureValue::Int(value) => value as f64,
            MeasureValue::Float(value) => value,
        }
    }
}

/// One recorded value of one measure.
#[derive(Clone, Debug)]
pub struct Measurement {
    measure: Measure,
    value: MeasureValue,
}

impl Measurement {
    /// The measure this value belongs to.
    pub fn measure(&self) -> &Measure {
        &self.measure
    }

    /// The recorded value.
    pub fn value(&self) -> MeasureValue {
        self.value
    }
}

/// A batch of measurements recorded together, with optional attachments.
///
/// Attachments are opaque string key/value pairs (for example the current
/// trace and span ids) that pass through aggregation untouched so a stats
/// backend can join stats with traces. They are not part of any aggregation
/// key.
#[derive(Clone, Debug, Default)]
pub struct MeasurementMap {
    measurements: Vec<Measurement>,
    attachments: HashMap<String, String>,
}

impl MeasurementMap {
    /// Create an empty measurement map.
    pub fn new() -> Self {
        MeasurementMap::default()
    }

    /// Add a measurement to the batch.
    pub fn put(&mut self, measurement: Measurement) -> &mut Self {
        self.measurements.push(measurement);
        self
    }

    /// Attach an opaque key/value pair to the batch.
    pub fn put_attachment(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.attachments.insert(key.into(), value.into());
        self
    }

    /// The measurements in the batch.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// The attachments carried by the batch.
    pub fn attachments(&self) -> &HashMap<String, String> {
        &self.attachments
    }

    pub(crate) fn into_parts(self) -> (Vec<Measurement>, HashMap<String, String>) {
        (self.measurements, self.attachments)
    }
}
