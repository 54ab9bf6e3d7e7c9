//! Per-instrument selection of aggregation temporality and default aggregation.
//!
//! Selectors are plain functions of the instrument type. Exporters consult them
//! on every export, so a selector may change its answer over the lifetime of an
//! exporter. Any `Fn(InstrumentType) -> _` closure that is `Send + Sync` can be
//! used wherever a selector is expected.

use crate::{
    Aggregation,
    AggregationTemporality,
    InstrumentType,
};

/// Chooses the [`AggregationTemporality`] for an instrument type.
pub trait AggregationTemporalitySelector: Send + Sync {
    fn aggregation_temporality(&self, instrument_type: InstrumentType) -> AggregationTemporality;
}

impl<F> AggregationTemporalitySelector for F
where
    F: Fn(InstrumentType) -> AggregationTemporality + Send + Sync,
{
    fn aggregation_temporality(&self, instrument_type: InstrumentType) -> AggregationTemporality {
        self(instrument_type)
    }
}

/// Reports every instrument type as cumulative. This is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysCumulative;

impl AggregationTemporalitySelector for AlwaysCumulative {
    fn aggregation_temporality(&self, _instrument_type: InstrumentType) -> AggregationTemporality {
        AggregationTemporality::Cumulative
    }
}

/// Delta for monotonic sums and histograms, cumulative for everything else.
/// A common choice for delta-oriented backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaPreferred;

impl AggregationTemporalitySelector for DeltaPreferred {
    fn aggregation_temporality(&self, instrument_type: InstrumentType) -> AggregationTemporality {
        match instrument_type {
            InstrumentType::Counter | InstrumentType::ObservableCounter | InstrumentType::Histogram => {
                AggregationTemporality::Delta
            }
            InstrumentType::UpDownCounter
            | InstrumentType::ObservableUpDownCounter
            | InstrumentType::ObservableGauge
            | InstrumentType::Gauge => AggregationTemporality::Cumulative,
        }
    }
}

/// Delta only where it lets the SDK drop state early: synchronous counters and
/// histograms.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowMemory;

impl AggregationTemporalitySelector for LowMemory {
    fn aggregation_temporality(&self, instrument_type: InstrumentType) -> AggregationTemporality {
        match instrument_type {
            InstrumentType::Counter | InstrumentType::Histogram => AggregationTemporality::Delta,
            _ => AggregationTemporality::Cumulative,
        }
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

/// Chooses the [`Aggregation`] applied to an instrument type absent explicit
/// configuration.
pub trait DefaultAggregationSelector: Send + Sync {
    fn default_aggregation(&self, instrument_type: InstrumentType) -> Aggregation;

    /// Returns a selector that answers `aggregation` for `instrument_type` and
    /// defers to `self` for every other type.
    fn with(self, instrument_type: InstrumentType, aggregation: Aggregation) -> WithAggregation<Self>
    where
        Self: Sized,
    {
        WithAggregation {
            inner: self,
            instrument_type,
            aggregation,
        }
    }
}

impl<F> DefaultAggregationSelector for F
where
    F: Fn(InstrumentType) -> Aggregation + Send + Sync,
{
    fn default_aggregation(&self, instrument_type: InstrumentType) -> Aggregation {
        self(instrument_type)
    }
}

/// The standard mapping: sums for counters, last value for gauges and an
/// explicit bucket histogram for histograms.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAggregation;

impl DefaultAggregationSelector for StandardAggregation {
    fn default_aggregation(&self, instrument_type: InstrumentType) -> Aggregation {
        match instrument_type {
            InstrumentType::Counter
            | InstrumentType::UpDownCounter
            | InstrumentType::ObservableCounter
            | InstrumentType::ObservableUpDownCounter => Aggregation::Sum,
            InstrumentType::ObservableGauge | InstrumentType::Gauge => Aggregation::LastValue,
            InstrumentType::Histogram => Aggregation::explicit_bucket_histogram(),
        }
    }
}

/// See [`DefaultAggregationSelector::with`].
#[derive(Debug, Clone)]
pub struct WithAggregation<S> {
    inner: S,
    instrument_type: InstrumentType,
    aggregation: Aggregation,
}

impl<S: DefaultAggregationSelector> DefaultAggregationSelector for WithAggregation<S> {
    fn default_aggregation(&self, instrument_type: InstrumentType) -> Aggregation {
        if instrument_type == self.instrument_type {
            self.aggregation.clone()
        } else {
            self.inner.default_aggregation(instrument_type)
        }
    }
}
