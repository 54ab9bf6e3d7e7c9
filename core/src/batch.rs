use crate::InstrumentType;
use serde::{
    Deserialize,
    Serialize,
};

// These types are the "public" input of an export. The wire messages in
// `crate::wire` additionally carry what the selectors decided per instrument.

/// A collection of metrics handed to an exporter in one export call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MetricBatch {
    pub metrics: Vec<MetricRecord>,
}

impl MetricBatch {
    pub fn new(metrics: Vec<MetricRecord>) -> Self {
        Self { metrics }
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Distinct instrument types in order of first appearance.
    pub fn instrument_types(&self) -> Vec<InstrumentType> {
        let mut seen = Vec::new();
        for metric in &self.metrics {
            if !seen.contains(&metric.instrument_type) {
                seen.push(metric.instrument_type);
            }
        }
        seen
    }
}

impl From<Vec<MetricRecord>> for MetricBatch {
    fn from(metrics: Vec<MetricRecord>) -> Self {
        Self::new(metrics)
    }
}

/// One metric stream with its collected points.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: String,
    pub description: String,
    pub unit: String,
    pub instrument_type: InstrumentType,
    pub points: Vec<DataPoint>,
}

impl MetricRecord {
    pub fn new(name: impl Into<String>, instrument_type: InstrumentType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            unit: String::new(),
            instrument_type,
            points: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn point(mut self, point: DataPoint) -> Self {
        self.points.push(point);
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub attributes: Vec<(String, String)>,
    pub start_time_unix_nano: u64,
    pub time_unix_nano: u64,
    pub value: PointValue,
}

impl DataPoint {
    pub fn number(value: f64, start_time_unix_nano: u64, time_unix_nano: u64) -> Self {
        Self {
            attributes: Vec::new(),
            start_time_unix_nano,
            time_unix_nano,
            value: PointValue::Number(value),
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }
}

/// Describes what a data point measured.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum PointValue {
    /// A sum or gauge value.
    Number(f64),
    /// A bucketed distribution. `bucket_counts` has one more entry than
    /// `boundaries`.
    Histogram {
        count: u64,
        sum: f64,
        boundaries: Vec<f64>,
        bucket_counts: Vec<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_types_are_distinct_in_first_seen_order() {
        let batch = MetricBatch::from(vec![
            MetricRecord::new("a", InstrumentType::Gauge),
            MetricRecord::new("b", InstrumentType::Counter),
            MetricRecord::new("c", InstrumentType::Gauge),
        ]);
        assert_eq!(batch.instrument_types(), vec![InstrumentType::Gauge, InstrumentType::Counter]);
        assert!(MetricBatch::default().instrument_types().is_empty());
    }
}
