//! Transport-independent data model for the OTLP/HTTP metric exporter.

mod batch;
mod instrument;
pub mod selector;
pub mod wire;

pub use batch::{
    DataPoint,
    MetricBatch,
    MetricRecord,
    PointValue,
};
pub use instrument::{
    Aggregation,
    AggregationTemporality,
    InstrumentType,
};
pub use selector::{
    AggregationTemporalitySelector,
    AlwaysCumulative,
    DefaultAggregationSelector,
    DeltaPreferred,
    LowMemory,
    StandardAggregation,
};
pub use wire::{
    Encoding,
    ExportMetricsRequest,
};
