pub mod sink;
pub mod jsonl;

pub use sink::{emit, MetricSink, NoopSink, SinkError};
pub use jsonl::JsonlSink;
