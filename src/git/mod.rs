mod repo;
mod worktree;

pub use repo::{parse_date, GitRepo};
pub use worktree::WorkingTree;
