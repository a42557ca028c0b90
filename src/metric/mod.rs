mod filetypes;

pub use filetypes::Filetypes;

use crate::error::Result;
use crate::git::WorkingTree;
use crate::model::{MeasurementMap, Sample};
use std::io::Write;

/// A measurement taken on every commit's working tree.
pub trait MetricCalculator {
    fn name(&self) -> &'static str;

    /// Whether `calculate` only reads the tree. Read-only metrics run on an
    /// in-memory copy, the others on a temporary checkout on disk.
    fn is_read_only(&self) -> bool;

    /// Measures one working tree. Must only depend on the tree's contents.
    fn calculate(&self, tree: &WorkingTree) -> Result<MeasurementMap>;

    /// Writes a finished chart for `samples` (oldest first) to `out`.
    fn render_graph(&self, samples: &[Sample], out: &mut dyn Write) -> Result<()>;
}

/// The metrics selectable by name on the command line.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    /// Share of files per file extension
    Filetypes,
}

impl Metric {
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as clap::ValueEnum>::from_str(name, true).ok()
    }
}

impl MetricCalculator for Metric {
    fn name(&self) -> &'static str {
        match self {
            Metric::Filetypes => Filetypes.name(),
        }
    }

    fn is_read_only(&self) -> bool {
        match self {
            Metric::Filetypes => Filetypes.is_read_only(),
        }
    }

    fn calculate(&self, tree: &WorkingTree) -> Result<MeasurementMap> {
        match self {
            Metric::Filetypes => Filetypes.calculate(tree),
        }
    }

    fn render_graph(&self, samples: &[Sample], out: &mut dyn Write) -> Result<()> {
        match self {
            Metric::Filetypes => Filetypes.render_graph(samples, out),
        }
    }
}
