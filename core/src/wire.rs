//! Messages as they travel to the collector.
//!
//! A [`MetricBatch`](crate::MetricBatch) becomes an [`ExportMetricsRequest`]
//! once every metric has been annotated with the temporality and aggregation
//! its instrument type resolves to. The request encodes as protobuf or JSON.

use crate::{
    Aggregation,
    AggregationTemporality,
    DataPoint as BatchDataPoint,
    InstrumentType,
    MetricRecord,
    PointValue,
};
use prost::Message as _;
use serde::Serialize;

pub type Error = std::io::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// How an [`ExportMetricsRequest`] is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Protobuf,
    Json,
}

impl Encoding {
    pub fn content_type(self) -> &'static str {
        match self {
            Encoding::Protobuf => "application/x-protobuf",
            Encoding::Json => "application/json",
        }
    }
}

#[derive(Clone, PartialEq, prost::Message, Serialize)]
pub struct ExportMetricsRequest {
    #[prost(message, repeated, tag = "1")]
    pub metrics: Vec<Metric>,
}

impl ExportMetricsRequest {
    /// Serialize with the given encoding.
    pub fn encode_as(&self, encoding: Encoding) -> Result<Vec<u8>> {
        match encoding {
            Encoding::Protobuf => Ok(self.encode_to_vec()),
            Encoding::Json => serde_json::to_vec(self).map_err(|e| Error::new(std::io::ErrorKind::InvalidData, e)),
        }
    }

    /// Deserialize from protobuf.
    pub fn decode_protobuf(data: &[u8]) -> Result<Self> {
        Self::decode(data).map_err(|e| Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[derive(Clone, PartialEq, prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(string, tag = "3")]
    pub unit: String,
    #[prost(enumeration = "WireInstrumentType", tag = "4")]
    pub instrument_type: i32,
    #[prost(enumeration = "WireTemporality", tag = "5")]
    pub aggregation_temporality: i32,
    #[prost(message, optional, tag = "6")]
    pub aggregation: Option<AggregationSpec>,
    #[prost(message, repeated, tag = "7")]
    pub data_points: Vec<DataPoint>,
}

impl Metric {
    pub fn from_record(
        record: &MetricRecord,
        temporality: AggregationTemporality,
        aggregation: &Aggregation,
    ) -> Self {
        Metric {
            name: record.name.clone(),
            description: record.description.clone(),
            unit: record.unit.clone(),
            instrument_type: WireInstrumentType::from(record.instrument_type) as i32,
            aggregation_temporality: WireTemporality::from(temporality) as i32,
            aggregation: Some(aggregation.into()),
            data_points: record.points.iter().map(DataPoint::from).collect(),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSpec {
    #[prost(enumeration = "WireAggregationKind", tag = "1")]
    pub kind: i32,
    #[prost(double, repeated, tag = "2")]
    pub boundaries: Vec<f64>,
    #[prost(uint32, tag = "3")]
    pub max_buckets: u32,
    #[prost(sint32, tag = "4")]
    pub max_scale: i32,
}

impl From<&Aggregation> for AggregationSpec {
    fn from(value: &Aggregation) -> Self {
        let spec = |kind: WireAggregationKind| AggregationSpec {
            kind: kind as i32,
            ..Default::default()
        };
        match value {
            Aggregation::Drop => spec(WireAggregationKind::Drop),
            Aggregation::Sum => spec(WireAggregationKind::Sum),
            Aggregation::LastValue => spec(WireAggregationKind::LastValue),
            Aggregation::ExplicitBucketHistogram { boundaries } => AggregationSpec {
                boundaries: boundaries.clone(),
                ..spec(WireAggregationKind::ExplicitBucketHistogram)
            },
            Aggregation::Base2ExponentialHistogram { max_buckets, max_scale } => AggregationSpec {
                max_buckets: *max_buckets,
                max_scale: *max_scale,
                ..spec(WireAggregationKind::Base2ExponentialHistogram)
            },
        }
    }
}

#[derive(Clone, PartialEq, prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    #[prost(message, repeated, tag = "1")]
    pub attributes: Vec<KeyValue>,
    #[prost(fixed64, tag = "2")]
    pub start_time_unix_nano: u64,
    #[prost(fixed64, tag = "3")]
    pub time_unix_nano: u64,
    #[prost(oneof = "data_point::Value", tags = "4, 5")]
    pub value: Option<data_point::Value>,
}

pub mod data_point {
    use serde::Serialize;

    #[derive(Clone, PartialEq, prost::Oneof, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub enum Value {
        #[prost(double, tag = "4")]
        AsDouble(f64),
        #[prost(message, tag = "5")]
        Histogram(super::HistogramValue),
    }
}

impl From<&BatchDataPoint> for DataPoint {
    fn from(value: &BatchDataPoint) -> Self {
        let point_value = match &value.value {
            PointValue::Number(n) => data_point::Value::AsDouble(*n),
            PointValue::Histogram {
                count,
                sum,
                boundaries,
                bucket_counts,
            } => data_point::Value::Histogram(HistogramValue {
                count: *count,
                sum: *sum,
                explicit_bounds: boundaries.clone(),
                bucket_counts: bucket_counts.clone(),
            }),
        };
        DataPoint {
            attributes: value
                .attributes
                .iter()
                .map(|(key, value)| KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
            start_time_unix_nano: value.start_time_unix_nano,
            time_unix_nano: value.time_unix_nano,
            value: Some(point_value),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message, Serialize)]
pub struct KeyValue {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramValue {
    #[prost(fixed64, tag = "1")]
    pub count: u64,
    #[prost(double, tag = "2")]
    pub sum: f64,
    #[prost(double, repeated, tag = "3")]
    pub explicit_bounds: Vec<f64>,
    #[prost(fixed64, repeated, tag = "4")]
    pub bucket_counts: Vec<u64>,
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum WireInstrumentType {
    Unspecified = 0,
    Counter = 1,
    UpDownCounter = 2,
    Histogram = 3,
    ObservableCounter = 4,
    ObservableUpDownCounter = 5,
    ObservableGauge = 6,
    Gauge = 7,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum WireTemporality {
    Unspecified = 0,
    Delta = 1,
    Cumulative = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum WireAggregationKind {
    Unspecified = 0,
    Drop = 1,
    Sum = 2,
    LastValue = 3,
    ExplicitBucketHistogram = 4,
    Base2ExponentialHistogram = 5,
}

impl From<InstrumentType> for WireInstrumentType {
    fn from(value: InstrumentType) -> Self {
        match value {
            InstrumentType::Counter => WireInstrumentType::Counter,
            InstrumentType::UpDownCounter => WireInstrumentType::UpDownCounter,
            InstrumentType::Histogram => WireInstrumentType::Histogram,
            InstrumentType::ObservableCounter => WireInstrumentType::ObservableCounter,
            InstrumentType::ObservableUpDownCounter => WireInstrumentType::ObservableUpDownCounter,
            InstrumentType::ObservableGauge => WireInstrumentType::ObservableGauge,
            InstrumentType::Gauge => WireInstrumentType::Gauge,
        }
    }
}

impl From<AggregationTemporality> for WireTemporality {
    fn from(value: AggregationTemporality) -> Self {
        match value {
            AggregationTemporality::Delta => WireTemporality::Delta,
            AggregationTemporality::Cumulative => WireTemporality::Cumulative,
        }
    }
}
