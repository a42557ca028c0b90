use crate::error::{MetricsError, Result};
use crate::git::worktree::FileKind;
use crate::git::WorkingTree;
use crate::model::CommitInfo;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use gix::objs::tree::EntryKind;
use gix::{discover, ObjectId, Repository};
use std::path::Path;

pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Open the repository containing `path`, or the current dir if `None`.
    /// Parent directories are searched until a `.git` is found.
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };

        let repo = discover(&repo_path)?;
        let root = repo.workdir().unwrap_or_else(|| repo.path());
        tracing::debug!(path = %root.display(), "opened repository");

        Ok(Self { repo })
    }

    pub fn resolve_head(&self) -> Result<CommitInfo> {
        let mut head = self.repo.head()?;
        let head_commit = head.peel_to_commit_in_place()?;
        commit_info(&head_commit).map_err(|e| e.at_commit(&head_commit.id.to_string()))
    }

    pub fn find_commit(&self, commit_id: &str) -> Result<CommitInfo> {
        let oid = parse_id(commit_id)?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| MetricsError::from(e).at_commit(commit_id))?;
        commit_info(&commit).map_err(|e| e.at_commit(commit_id))
    }

    /// Replace the contents of `tree` with the files of `commit`.
    ///
    /// Entries named `.`, `..` or `.git`, or containing a backslash, are
    /// refused and nothing of the commit is kept.
    pub fn checkout(&self, commit: &CommitInfo, tree: &mut WorkingTree) -> Result<()> {
        self.materialize(commit, tree)
            .map_err(|e| MetricsError::Checkout {
                id: commit.id.clone(),
                source: Box::new(e),
            })
    }

    fn materialize(&self, commit: &CommitInfo, tree: &mut WorkingTree) -> Result<()> {
        let oid = parse_id(&commit.id)?;
        let commit_tree = self.repo.find_commit(oid)?.tree()?;

        let mut recorder = gix::traverse::tree::Recorder::default();
        commit_tree
            .traverse()
            .depthfirst(&mut recorder)
            .map_err(|e| MetricsError::Parse(format!("Failed to traverse tree: {e}")))?;

        tree.clear()?;
        tree.attach(&self.repo);
        if let Err(e) = self.write_entries(recorder.records, tree) {
            tree.clear()?;
            return Err(e);
        }
        tree.set_commit(&commit.id);
        Ok(())
    }

    fn write_entries(
        &self,
        records: Vec<gix::traverse::tree::recorder::Entry>,
        tree: &mut WorkingTree,
    ) -> Result<()> {
        for entry in records {
            let path = entry.filepath.to_string();
            let kind = match entry.mode.kind() {
                // Submodules are checked out as empty directories, like git
                // does without `--recurse-submodules`.
                EntryKind::Tree | EntryKind::Commit => {
                    tree.add_dir(&path)?;
                    continue;
                }
                EntryKind::Blob => FileKind::Regular,
                EntryKind::BlobExecutable => FileKind::Executable,
                EntryKind::Link => FileKind::Symlink,
            };
            tree.add_file(&path, kind, entry.oid, || self.blob_data(entry.oid))?;
        }
        Ok(())
    }

    fn blob_data(&self, id: ObjectId) -> Result<Vec<u8>> {
        Ok(self.repo.find_object(id)?.detach().data)
    }
}

fn parse_id(commit_id: &str) -> Result<ObjectId> {
    ObjectId::from_hex(commit_id.as_bytes())
        .map_err(|e| MetricsError::Parse(format!("Invalid commit ID '{commit_id}': {e}")))
}

fn commit_info(commit: &gix::Commit<'_>) -> Result<CommitInfo> {
    let secs = commit.time()?.seconds;
    let timestamp = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| MetricsError::InvalidDate(format!("Invalid timestamp: {secs}")))?;
    let author = commit.author()?;
    let message = commit.message()?;

    Ok(CommitInfo {
        id: commit.id.to_string(),
        parent_ids: commit.parent_ids().map(|id| id.to_string()).collect(),
        timestamp,
        author_name: author.name.to_string(),
        message: message.title.to_string(),
    })
}

/// Parses a cutoff date given as RFC3339 or `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&datetime));
        }
    }

    Err(MetricsError::InvalidDate(format!(
        "'{input}' is neither RFC3339 nor YYYY-MM-DD"
    )))
}
