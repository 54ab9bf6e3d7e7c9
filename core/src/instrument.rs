use serde::{
    Deserialize,
    Serialize,
};

/// The category of a metric source.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstrumentType {
    /// A synchronous, monotonically increasing sum.
    Counter,
    /// A synchronous sum that can go up and down.
    UpDownCounter,
    /// A synchronous distribution of recorded values.
    Histogram,
    /// An asynchronous, monotonically increasing sum reported by a callback.
    ObservableCounter,
    /// An asynchronous sum that can go up and down, reported by a callback.
    ObservableUpDownCounter,
    /// An asynchronous instantaneous value reported by a callback.
    ObservableGauge,
    /// A synchronous instantaneous value.
    Gauge,
}

impl InstrumentType {
    pub const ALL: [InstrumentType; 7] = [
        InstrumentType::Counter,
        InstrumentType::UpDownCounter,
        InstrumentType::Histogram,
        InstrumentType::ObservableCounter,
        InstrumentType::ObservableUpDownCounter,
        InstrumentType::ObservableGauge,
        InstrumentType::Gauge,
    ];
}

/// Whether a reported value accumulates since start or only covers the last
/// collection interval.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationTemporality {
    Cumulative,
    Delta,
}

/// The aggregation function applied to an instrument.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Measurements are discarded.
    Drop,
    /// Arithmetic sum of all measurements.
    Sum,
    /// Only the most recent measurement is kept.
    LastValue,
    /// Histogram with fixed, explicitly given bucket boundaries.
    ExplicitBucketHistogram { boundaries: Vec<f64> },
    /// Histogram with exponentially sized buckets.
    Base2ExponentialHistogram { max_buckets: u32, max_scale: i32 },
}

impl Aggregation {
    pub const DEFAULT_BOUNDARIES: [f64; 15] = [
        0.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0, 500.0, 750.0, 1000.0, 2500.0, 5000.0, 7500.0, 10000.0,
    ];

    /// Explicit bucket histogram using the standard boundaries.
    pub fn explicit_bucket_histogram() -> Self {
        Aggregation::ExplicitBucketHistogram {
            boundaries: Self::DEFAULT_BOUNDARIES.to_vec(),
        }
    }

    /// Exponential histogram with 160 buckets and scale 20.
    pub fn base2_exponential_histogram() -> Self {
        Aggregation::Base2ExponentialHistogram {
            max_buckets: 160,
            max_scale: 20,
        }
    }
}
