use crate::error::{MetricsError, Result};
use crate::model::DirEntry;
use gix::ObjectId;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// How a blob is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Executable,
    /// The blob holds the link target.
    Symlink,
}

/// The files of exactly one commit.
///
/// A single handle is created per run and overwritten in place for every
/// visited commit. Checkout needs `&mut`, observers get `&`, so one commit's
/// materialization can never overlap with the next.
#[derive(Debug)]
pub enum WorkingTree {
    /// Read-only copy: the directory structure in memory, blob contents
    /// read from the object database on demand.
    Memory(MemoryTree),
    /// Writable copy in a temporary directory, removed when dropped.
    /// Symlinks and executable bits are restored on unix.
    Disk(DiskTree),
}

impl WorkingTree {
    pub fn in_memory() -> Self {
        WorkingTree::Memory(MemoryTree::default())
    }

    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("git-metrics").tempdir()?;
        Ok(WorkingTree::Disk(DiskTree { dir, commit: None }))
    }

    /// Id of the commit currently materialized, if any.
    pub fn commit_id(&self) -> Option<&str> {
        match self {
            WorkingTree::Memory(tree) => tree.commit.as_deref(),
            WorkingTree::Disk(tree) => tree.commit.as_deref(),
        }
    }

    /// Location on disk, for writable trees.
    pub fn root(&self) -> Option<&Path> {
        match self {
            WorkingTree::Memory(_) => None,
            WorkingTree::Disk(tree) => Some(tree.dir.path()),
        }
    }

    /// Lists the entries of `path`, relative to the tree root ("" or "/" for
    /// the root itself), sorted by name. Symlinks are listed as files.
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        match self {
            WorkingTree::Memory(tree) => tree.list_directory(path),
            WorkingTree::Disk(tree) => tree.list_directory(path),
        }
    }

    /// Contents of the file at `path`; the link target for symlinks.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        match self {
            WorkingTree::Memory(tree) => tree.read_file(path),
            WorkingTree::Disk(tree) => tree.read_file(path),
        }
    }

    /// Removes everything so the next commit can be written.
    pub(crate) fn clear(&mut self) -> Result<()> {
        match self {
            WorkingTree::Memory(tree) => {
                tree.root.clear();
                tree.commit = None;
                Ok(())
            }
            WorkingTree::Disk(tree) => tree.clear(),
        }
    }

    /// Lets an in-memory tree read blobs from `repo`.
    pub(crate) fn attach(&mut self, repo: &gix::Repository) {
        if let WorkingTree::Memory(tree) = self {
            if tree.objects.is_none() {
                tree.objects = Some(repo.clone());
            }
        }
    }

    pub(crate) fn add_dir(&mut self, path: &str) -> Result<()> {
        let parts = checked_components(path)?;
        match self {
            WorkingTree::Memory(tree) => tree.dir_mut(&parts, path).map(|_| ()),
            WorkingTree::Disk(tree) => {
                let full = tree.join(&parts);
                fs::create_dir_all(&full).map_err(|source| MetricsError::Path { path: full, source })
            }
        }
    }

    /// Adds a file. `load` is only called when the contents are needed.
    pub(crate) fn add_file<F>(&mut self, path: &str, kind: FileKind, id: ObjectId, load: F) -> Result<()>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let parts = checked_components(path)?;
        match self {
            WorkingTree::Memory(tree) => tree.add_file(&parts, path, id),
            WorkingTree::Disk(tree) => tree.add_file(&parts, kind, load),
        }
    }

    pub(crate) fn set_commit(&mut self, id: &str) {
        let id = Some(id.to_string());
        match self {
            WorkingTree::Memory(tree) => tree.commit = id,
            WorkingTree::Disk(tree) => tree.commit = id,
        }
    }

    /// Releases the tree, reporting a failure to remove a temporary
    /// directory. Dropping the tree also removes it, but silently.
    pub fn close(self) -> Result<()> {
        match self {
            WorkingTree::Memory(_) => Ok(()),
            WorkingTree::Disk(tree) => {
                let path = tree.dir.path().to_path_buf();
                tree.dir
                    .close()
                    .map_err(|source| MetricsError::Cleanup { path, source })
            }
        }
    }
}

/// Splits a path coming from a git tree, refusing anything that could
/// resolve outside the tree root or into a `.git` directory.
fn checked_components(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('/').collect();
    let unsafe_part = parts.iter().any(|part| {
        part.is_empty()
            || *part == "."
            || *part == ".."
            || part.eq_ignore_ascii_case(".git")
            || part.contains(['\\', '\0'])
    });
    if unsafe_part {
        return Err(MetricsError::Parse(format!("Refusing unsafe tree entry '{path}'")));
    }
    Ok(parts)
}

/// Splits a lookup path given by a caller; "" and "/" are the root.
fn lookup_components(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    if parts.contains(&"..") {
        return Err(MetricsError::Parse(format!("Path leaves the working tree: '{path}'")));
    }
    Ok(parts)
}

fn not_found(path: &str) -> MetricsError {
    MetricsError::Path {
        path: PathBuf::from(path),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    }
}

#[derive(Debug)]
enum Node {
    File(ObjectId),
    Dir(BTreeMap<String, Node>),
}

#[derive(Default)]
pub struct MemoryTree {
    root: BTreeMap<String, Node>,
    commit: Option<String>,
    objects: Option<gix::Repository>,
}

impl std::fmt::Debug for MemoryTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTree")
            .field("root", &self.root)
            .field("commit", &self.commit)
            .finish_non_exhaustive()
    }
}

impl MemoryTree {
    fn dir_mut(&mut self, parts: &[&str], path: &str) -> Result<&mut BTreeMap<String, Node>> {
        let mut dir = &mut self.root;
        for part in parts {
            let node = dir
                .entry(part.to_string())
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
            dir = match node {
                Node::Dir(children) => children,
                Node::File(_) => return Err(MetricsError::NotADirectory(path.to_string())),
            };
        }
        Ok(dir)
    }

    fn add_file(&mut self, parts: &[&str], path: &str, id: ObjectId) -> Result<()> {
        let Some((name, parent)) = parts.split_last() else {
            return Err(MetricsError::Parse(format!("Invalid file path: '{path}'")));
        };
        self.dir_mut(parent, path)?.insert(name.to_string(), Node::File(id));
        Ok(())
    }

    fn node(&self, path: &str) -> Result<Option<&Node>> {
        let parts = lookup_components(path)?;
        let Some((name, parents)) = parts.split_last() else {
            return Ok(None);
        };
        let mut dir = &self.root;
        for part in parents {
            dir = match dir.get(*part) {
                Some(Node::Dir(children)) => children,
                Some(Node::File(_)) => return Err(MetricsError::NotADirectory(path.to_string())),
                None => return Err(not_found(path)),
            };
        }
        dir.get(*name).map(Some).ok_or_else(|| not_found(path))
    }

    fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let dir = match self.node(path)? {
            None => &self.root,
            Some(Node::Dir(children)) => children,
            Some(Node::File(_)) => return Err(MetricsError::NotADirectory(path.to_string())),
        };
        Ok(dir
            .iter()
            .map(|(name, node)| DirEntry {
                name: name.clone(),
                is_dir: matches!(node, Node::Dir(_)),
            })
            .collect())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let Some(Node::File(id)) = self.node(path)? else {
            return Err(MetricsError::Parse(format!("Not a file: '{path}'")));
        };
        let repo = self
            .objects
            .as_ref()
            .ok_or_else(|| MetricsError::Parse("No repository attached to the working tree".to_string()))?;
        Ok(repo.find_object(*id)?.detach().data)
    }
}

#[derive(Debug)]
pub struct DiskTree {
    dir: TempDir,
    commit: Option<String>,
}

impl DiskTree {
    fn join(&self, parts: &[&str]) -> PathBuf {
        let mut full = self.dir.path().to_path_buf();
        full.extend(parts);
        full
    }

    fn clear(&mut self) -> Result<()> {
        let root = self.dir.path();
        let entries = fs::read_dir(root).map_err(|source| MetricsError::Path {
            path: root.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let removed = if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.map_err(|source| MetricsError::Path { path, source })?;
        }
        self.commit = None;
        Ok(())
    }

    fn add_file<F>(&mut self, parts: &[&str], kind: FileKind, load: F) -> Result<()>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let full = self.join(parts);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| MetricsError::Path {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let data = load()?;
        write_blob(&full, kind, data).map_err(|source| MetricsError::Path { path: full, source })
    }

    fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let full = self.join(&lookup_components(path)?);
        let read = fs::read_dir(&full).map_err(|source| MetricsError::Path {
            path: full.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for entry in read {
            let entry = entry.map_err(|source| MetricsError::Path {
                path: full.clone(),
                source,
            })?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort();
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.join(&lookup_components(path)?);
        let read = || -> std::io::Result<Vec<u8>> {
            if fs::symlink_metadata(&full)?.file_type().is_symlink() {
                return Ok(link_target_bytes(&fs::read_link(&full)?));
            }
            fs::read(&full)
        };
        read().map_err(|source| MetricsError::Path { path: full.clone(), source })
    }
}

#[cfg(unix)]
fn write_blob(full: &Path, kind: FileKind, data: Vec<u8>) -> std::io::Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::fs::PermissionsExt;

    match kind {
        FileKind::Symlink => std::os::unix::fs::symlink(OsStr::from_bytes(&data), full),
        FileKind::Regular => fs::write(full, data),
        FileKind::Executable => {
            fs::write(full, data)?;
            fs::set_permissions(full, fs::Permissions::from_mode(0o755))
        }
    }
}

// Without unix symlinks and modes, like git with `core.symlinks=false`.
#[cfg(not(unix))]
fn write_blob(full: &Path, _kind: FileKind, data: Vec<u8>) -> std::io::Result<()> {
    fs::write(full, data)
}

#[cfg(unix)]
fn link_target_bytes(target: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    target.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn link_target_bytes(target: &Path) -> Vec<u8> {
    target.to_string_lossy().into_owned().into_bytes()
}
