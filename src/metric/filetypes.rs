use super::MetricCalculator;
use crate::chart::{self, Chart};
use crate::error::Result;
use crate::git::WorkingTree;
use crate::model::{MeasurementMap, Sample};
use crate::series::build_series;
use std::io::Write;

/// Counts files per extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filetypes;

impl MetricCalculator for Filetypes {
    fn name(&self) -> &'static str {
        "filetypes"
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn calculate(&self, tree: &WorkingTree) -> Result<MeasurementMap> {
        count_filetypes_in_directory(tree, "")
    }

    fn render_graph(&self, samples: &[Sample], out: &mut dyn Write) -> Result<()> {
        let series = build_series(samples);
        tracing::debug!(
            filetypes = ?series.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
            "stacking order"
        );

        let chart = Chart::stacked_percentages("By filetype", "% of files", samples, series);
        chart::write_html(&chart, out)
    }
}

fn count_filetypes_in_directory(tree: &WorkingTree, path: &str) -> Result<MeasurementMap> {
    let mut result = MeasurementMap::new();

    for entry in tree.list_directory(path)? {
        if entry.is_dir {
            let sub_path = if path.is_empty() {
                entry.name
            } else {
                format!("{path}/{}", entry.name)
            };
            for (filetype, count) in count_filetypes_in_directory(tree, &sub_path)? {
                *result.entry(filetype).or_insert(0) += count;
            }
        } else if let Some(ext) = extension(&entry.name) {
            *result.entry(ext.to_string()).or_insert(0) += 1;
        }
    }

    Ok(result)
}

/// The file name from its last dot on, e.g. `.gz` for `a.tar.gz`.
fn extension(name: &str) -> Option<&str> {
    name.rfind('.').map(|idx| &name[idx..])
}
