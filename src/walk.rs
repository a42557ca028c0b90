use crate::error::{MetricsError, Result};
use crate::git::{GitRepo, WorkingTree};
use crate::model::{CommitInfo, WalkOptions};
use indicatif::{ProgressBar, ProgressStyle};

/// Walks first-parent history from head towards the root, checking out each
/// commit into `tree` before handing it to `observer`.
///
/// Merge parents other than the first are ignored. The walk ends without
/// error at the root commit, at the first commit older than
/// `options.since`, or once `options.max_commits` commits were observed.
pub fn walk<F>(repo: &GitRepo, tree: &mut WorkingTree, options: &WalkOptions, mut observer: F) -> Result<usize>
where
    F: FnMut(&CommitInfo, &WorkingTree) -> Result<()>,
{
    let pb = if options.progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{pos} commits]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Walking history...");
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut current = repo.resolve_head()?;
    let mut observed = 0usize;

    loop {
        if options.is_before_cutoff(&current.timestamp) {
            tracing::debug!(commit = current.short_id(), "commit older than cutoff, stopping");
            break;
        }
        if options.reached_limit(observed) {
            tracing::debug!(observed, "commit limit reached, stopping");
            break;
        }

        repo.checkout(&current, tree)?;
        tracing::debug!(commit = current.short_id(), message = %current.message, "checked out");

        observer(&current, &*tree).map_err(|source| MetricsError::Observer {
            id: current.id.clone(),
            source: Box::new(source),
        })?;
        observed += 1;
        pb.inc(1);

        let Some(parent_id) = current.parent_ids.first() else {
            tracing::debug!(commit = current.short_id(), "reached root commit");
            break;
        };
        current = repo.find_commit(parent_id)?;
    }

    pb.finish_and_clear();
    Ok(observed)
}
