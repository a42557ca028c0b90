pub mod chart;
pub mod cli;
pub mod error;
pub mod git;
pub mod logging;
pub mod metric;
pub mod model;
pub mod pipeline;
pub mod series;
pub mod walk;

pub use error::{MetricsError, Result};
pub use metric::{Metric, MetricCalculator};
pub use model::{CommitInfo, MeasurementMap, Sample, Series, SeriesPoint, WalkOptions};
pub use pipeline::{calculate_metrics, run_metrics, MetricsRun};
pub use series::build_series;
pub use walk::walk;
