mod common;

use common::*;
use git_metrics::git::{GitRepo, WorkingTree};
use git_metrics::metric::{Filetypes, Metric, MetricCalculator};
use git_metrics::model::{DirEntry, MeasurementMap};
use git_metrics::MetricsError;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn expected(pairs: &[(&str, u64)]) -> MeasurementMap {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn checked_out(dir: &Path, tree: &mut WorkingTree) {
    let repo = GitRepo::open(Some(dir)).unwrap();
    let head = repo.resolve_head().unwrap();
    repo.checkout(&head, tree).unwrap();
}

#[test]
fn counts_extensions_and_skips_files_without_one() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_files_at(
        dir.path(),
        &[("a.go", ""), ("b.go", ""), ("c.txt", ""), ("README", "")],
        T0,
    );

    let mut tree = WorkingTree::in_memory();
    checked_out(dir.path(), &mut tree);

    let counts = Filetypes.calculate(&tree).unwrap();
    assert_eq!(counts, expected(&[(".go", 2), (".txt", 1)]));
}

#[test]
fn nested_directories_are_counted_flat() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_files_at(
        dir.path(),
        &[
            ("main.go", ""),
            ("pkg/a/a.go", ""),
            ("pkg/a/deep/b.go", ""),
            ("docs/guide.md", ""),
            ("docs/Makefile", ""),
            ("dist/app.tar.gz", ""),
            (".gitignore", "target\n"),
        ],
        T0,
    );

    for mut tree in [WorkingTree::in_memory(), WorkingTree::temporary().unwrap()] {
        checked_out(dir.path(), &mut tree);
        let counts = Filetypes.calculate(&tree).unwrap();
        assert_eq!(
            counts,
            expected(&[(".go", 3), (".md", 1), (".gz", 1), (".gitignore", 1)])
        );
        tree.close().unwrap();
    }
}

#[test]
fn calculate_is_idempotent() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_files_at(dir.path(), &[("src/lib.rs", ""), ("Cargo.toml", ""), ("x.rs", "")], T0);

    let mut tree = WorkingTree::in_memory();
    checked_out(dir.path(), &mut tree);

    let first = Metric::Filetypes.calculate(&tree).unwrap();
    let second = Metric::Filetypes.calculate(&tree).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, expected(&[(".rs", 2), (".toml", 1)]));
}

#[test]
fn metric_is_selected_by_name() {
    assert_eq!(Metric::from_name("filetypes"), Some(Metric::Filetypes));
    assert_eq!(Metric::from_name("FileTypes"), Some(Metric::Filetypes));
    assert_eq!(Metric::from_name("lines"), None);

    let metric = Metric::Filetypes;
    assert_eq!(metric.name(), "filetypes");
    assert!(metric.is_read_only());
}

#[test]
fn empty_tree_yields_empty_map() {
    let tree = WorkingTree::in_memory();
    assert!(Filetypes.calculate(&tree).unwrap().is_empty());
}

#[test]
fn memory_and_disk_trees_list_the_same_entries() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_files_at(dir.path(), &[("z.txt", ""), ("src/main.rs", ""), ("a.md", "")], T0);

    let mut memory = WorkingTree::in_memory();
    let mut disk = WorkingTree::temporary().unwrap();
    checked_out(dir.path(), &mut memory);
    checked_out(dir.path(), &mut disk);

    let root = vec![
        DirEntry { name: "a.md".to_string(), is_dir: false },
        DirEntry { name: "src".to_string(), is_dir: true },
        DirEntry { name: "z.txt".to_string(), is_dir: false },
    ];
    assert_eq!(memory.list_directory("/").unwrap(), root);
    assert_eq!(disk.list_directory("").unwrap(), root);
    assert_eq!(
        memory.list_directory("src").unwrap(),
        disk.list_directory("/src/").unwrap()
    );

    assert!(memory.list_directory("missing").is_err());
    assert!(memory.list_directory("a.md").is_err());
    assert!(disk.list_directory("missing").is_err());
}

#[test]
fn checkout_overwrites_the_previous_commit() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    let first = commit_files_at(dir.path(), &[("old.c", "int x;\n")], T0);
    fs::remove_file(dir.path().join("old.c")).unwrap();
    let second = commit_files_at(dir.path(), &[("new.h", "")], T0 + DAY);

    let repo = GitRepo::open(Some(dir.path())).unwrap();
    let mut disk = WorkingTree::temporary().unwrap();

    repo.checkout(&repo.find_commit(&first).unwrap(), &mut disk).unwrap();
    let root = disk.root().unwrap().to_path_buf();
    assert_eq!(fs::read_to_string(root.join("old.c")).unwrap(), "int x;\n");

    repo.checkout(&repo.find_commit(&second).unwrap(), &mut disk).unwrap();
    assert_eq!(disk.commit_id(), Some(second.as_str()));
    assert!(!root.join("old.c").exists());
    assert!(root.join("new.h").exists());

    disk.close().unwrap();
    assert!(!root.exists());
}

#[test]
fn memory_and_disk_trees_read_the_same_contents() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_files_at(
        dir.path(),
        &[("src/main.rs", "fn main() {}\n"), ("notes.txt", "hello\n")],
        T0,
    );

    let mut memory = WorkingTree::in_memory();
    let mut disk = WorkingTree::temporary().unwrap();
    checked_out(dir.path(), &mut memory);
    checked_out(dir.path(), &mut disk);

    assert_eq!(memory.read_file("src/main.rs").unwrap(), b"fn main() {}\n");
    assert_eq!(memory.read_file("notes.txt").unwrap(), disk.read_file("/notes.txt").unwrap());
    assert_eq!(memory.read_file("src/main.rs").unwrap(), disk.read_file("src/main.rs").unwrap());

    for tree in [&memory, &disk] {
        assert!(tree.read_file("src").is_err());
        assert!(tree.read_file("missing.rs").is_err());
        assert!(tree.read_file("../notes.txt").is_err());
    }
    disk.close().unwrap();
}

#[test]
fn checkout_refuses_entries_leaving_the_tree() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    let marker = "escaped-from-checkout.txt";

    for hostile in ["..", ".git", ".GIT"] {
        let inner = make_tree(dir.path(), &[(marker, "owned\n")], &[]);
        let outer = make_tree(dir.path(), &[("ok.txt", "fine\n")], &[(hostile, &inner)]);
        let id = commit_tree_at(dir.path(), &outer, &format!("add {hostile}"), T0);

        let repo = GitRepo::open(Some(dir.path())).unwrap();
        let commit = repo.find_commit(&id).unwrap();

        for mut tree in [WorkingTree::in_memory(), WorkingTree::temporary().unwrap()] {
            let root = tree.root().map(Path::to_path_buf);
            let err = repo.checkout(&commit, &mut tree).unwrap_err();

            assert!(matches!(err, MetricsError::Checkout { .. }), "{err:?}");
            assert!(err.to_string().contains(&id));
            assert_eq!(tree.commit_id(), None);
            assert!(tree.list_directory("").unwrap().is_empty());
            if let Some(root) = root {
                assert!(!root.parent().unwrap().join(marker).exists());
                assert!(!root.join(hostile).join(marker).exists());
            }
            tree.close().unwrap();
        }
    }
    assert!(!dir.path().join(marker).exists());
}

#[cfg(unix)]
#[test]
fn disk_checkout_keeps_symlinks_and_executable_bits() {
    use std::os::unix::fs::{symlink, PermissionsExt};

    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    write_file(dir.path(), "run.sh", "#!/bin/sh\necho hi\n");
    write_file(dir.path(), "plain.txt", "text\n");
    fs::set_permissions(dir.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
    symlink("run.sh", dir.path().join("link.sh")).unwrap();
    commit_all_at(dir.path(), "scripts", T0);

    let mut disk = WorkingTree::temporary().unwrap();
    let mut memory = WorkingTree::in_memory();
    checked_out(dir.path(), &mut disk);
    checked_out(dir.path(), &mut memory);
    let root = disk.root().unwrap().to_path_buf();

    let link = root.join("link.sh");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), Path::new("run.sh"));
    assert_eq!(disk.read_file("link.sh").unwrap(), b"run.sh");
    assert_eq!(memory.read_file("link.sh").unwrap(), b"run.sh");

    let mode = |name: &str| fs::metadata(root.join(name)).unwrap().permissions().mode();
    assert_eq!(mode("run.sh") & 0o111, 0o111);
    assert_eq!(mode("plain.txt") & 0o111, 0);

    // a symlink still counts as a file
    let counts = Filetypes.calculate(&disk).unwrap();
    assert_eq!(counts, expected(&[(".sh", 2), (".txt", 1)]));
    assert_eq!(counts, Filetypes.calculate(&memory).unwrap());
    disk.close().unwrap();
}
