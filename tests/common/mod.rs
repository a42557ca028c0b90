#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

pub fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    assert!(Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

fn git_at(dir: &Path, args: &[&str], epoch: i64) {
    let date = format!("{epoch} +0000");
    assert!(Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_DATE", &date)
        .env("GIT_COMMITTER_DATE", &date)
        .status()
        .unwrap()
        .success());
}

pub fn git_output(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(out.status.success());
    String::from_utf8(out.stdout).unwrap().trim().to_string()
}

/// Runs git with `input` on stdin and returns its trimmed stdout.
pub fn git_stdin(dir: &Path, args: &[&str], input: &str) -> String {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    String::from_utf8(out.stdout).unwrap().trim().to_string()
}

pub fn init_git_repo(dir: &Path) {
    // init and basic identity
    git(dir, &["init"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "core.safecrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.sync_all().unwrap();
}

/// Commits everything in the work tree with author and committer time
/// `epoch`, returning the new commit id.
pub fn commit_all_at(dir: &Path, message: &str, epoch: i64) -> String {
    git(dir, &["add", "-A"]);
    git_at(dir, &["commit", "-m", message], epoch);
    head(dir)
}

pub fn commit_files_at(dir: &Path, files: &[(&str, &str)], epoch: i64) -> String {
    for (name, content) in files {
        write_file(dir, name, content);
    }
    let names: Vec<&str> = files.iter().map(|(n, _)| *n).collect();
    commit_all_at(dir, &format!("add {}", names.join(", ")), epoch)
}

/// Writes one blob per `(name, content)` and a tree holding them, plus
/// the `(name, tree id)` subtrees, without touching the work tree. Names
/// are taken verbatim, so they can be anything `git mktree` accepts.
pub fn make_tree(dir: &Path, files: &[(&str, &str)], subtrees: &[(&str, &str)]) -> String {
    let mut listing = String::new();
    for (name, content) in files {
        let blob = git_stdin(dir, &["hash-object", "-w", "--stdin"], content);
        listing.push_str(&format!("100644 blob {blob}\t{name}\n"));
    }
    for (name, tree) in subtrees {
        listing.push_str(&format!("040000 tree {tree}\t{name}\n"));
    }
    git_stdin(dir, &["mktree"], &listing)
}

/// Commits `tree` on top of HEAD (if any) and moves HEAD to it.
pub fn commit_tree_at(dir: &Path, tree: &str, message: &str, epoch: i64) -> String {
    let date = format!("{epoch} +0000");
    let mut cmd = Command::new("git");
    cmd.args(["commit-tree", tree, "-m", message])
        .current_dir(dir)
        .env("GIT_AUTHOR_DATE", &date)
        .env("GIT_COMMITTER_DATE", &date);
    let parent = Command::new("git")
        .args(["rev-parse", "--verify", "-q", "HEAD"])
        .current_dir(dir)
        .output()
        .unwrap();
    if parent.status.success() {
        let parent = String::from_utf8(parent.stdout).unwrap().trim().to_string();
        cmd.args(["-p", &parent]);
    }
    let out = cmd.output().unwrap();
    assert!(out.status.success());
    let id = String::from_utf8(out.stdout).unwrap().trim().to_string();
    git(dir, &["update-ref", "HEAD", &id]);
    id
}

pub fn merge_no_ff_at(dir: &Path, branch: &str, epoch: i64) -> String {
    git_at(dir, &["merge", "--no-ff", branch, "-m", &format!("merge {branch}")], epoch);
    head(dir)
}

pub fn checkout(dir: &Path, args: &[&str]) {
    let mut full = vec!["checkout"];
    full.extend_from_slice(args);
    git(dir, &full);
}

pub fn head(dir: &Path) -> String {
    git_output(dir, &["rev-parse", "HEAD"])
}

pub fn current_branch(dir: &Path) -> String {
    git_output(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
}

/// Base timestamp for test commits: 2023-11-14T22:13:20Z.
pub const T0: i64 = 1_700_000_000;
pub const DAY: i64 = 86_400;
