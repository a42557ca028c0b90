use crate::error::{MetricsError, Result};
use crate::git::{GitRepo, WorkingTree};
use crate::metric::MetricCalculator;
use crate::model::{Sample, WalkOptions};
use crate::walk::walk;

/// Outcome of [`run_metrics`]: the samples and, separately, whether the
/// working tree could be removed afterwards.
#[derive(Debug)]
pub struct MetricsRun {
    pub samples: Result<Vec<Sample>>,
    pub cleanup: Result<()>,
}

/// Measures every commit visited by [`walk`] and returns the samples oldest
/// first.
///
/// Read-only calculators work on an in-memory tree, the others on a
/// temporary checkout that is removed however the run ends. A failed
/// removal is reported as a warning and never replaces the result.
pub fn calculate_metrics<M>(repo: &GitRepo, calculator: &M, options: &WalkOptions) -> Result<Vec<Sample>>
where
    M: MetricCalculator + ?Sized,
{
    let run = run_metrics(repo, calculator, options);
    if let Err(e) = &run.cleanup {
        tracing::warn!(error = %e, "cleanup failed");
        eprintln!("warning: {e}");
    }
    run.samples
}

/// Like [`calculate_metrics`], but hands the cleanup result to the caller.
pub fn run_metrics<M>(repo: &GitRepo, calculator: &M, options: &WalkOptions) -> MetricsRun
where
    M: MetricCalculator + ?Sized,
{
    let tree = if calculator.is_read_only() {
        Ok(WorkingTree::in_memory())
    } else {
        WorkingTree::temporary()
    };
    let mut tree = match tree {
        Ok(tree) => tree,
        Err(e) => {
            return MetricsRun {
                samples: Err(e),
                cleanup: Ok(()),
            }
        }
    };
    if let Some(root) = tree.root() {
        tracing::debug!(path = %root.display(), "using temporary working tree");
    }

    let samples = collect_samples(repo, calculator, options, &mut tree);
    // A panic above still removes the directory when the tree is dropped.
    let cleanup = tree.close();

    MetricsRun { samples, cleanup }
}

fn collect_samples<M>(
    repo: &GitRepo,
    calculator: &M,
    options: &WalkOptions,
    tree: &mut WorkingTree,
) -> Result<Vec<Sample>>
where
    M: MetricCalculator + ?Sized,
{
    let mut samples = Vec::new();

    walk(repo, tree, options, |commit, tree| {
        let measurements = calculator
            .calculate(tree)
            .map_err(|source| MetricsError::Calculate {
                id: commit.id.clone(),
                source: Box::new(source),
            })?;
        tracing::debug!(
            commit = commit.short_id(),
            metric = calculator.name(),
            keys = measurements.len(),
            "measured"
        );
        samples.push(Sample {
            commit: commit.clone(),
            measurements,
        });
        Ok(())
    })?;

    samples.reverse();
    Ok(samples)
}
