use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetricsError>;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Commit error: {0}")]
    CommitTree(#[from] Box<gix::object::commit::Error>),
    #[error("Failed to read commit {id}: {source}")]
    Commit {
        id: String,
        #[source]
        source: Box<MetricsError>,
    },
    #[error("Failed to check out commit {id}: {source}")]
    Checkout {
        id: String,
        #[source]
        source: Box<MetricsError>,
    },
    #[error("Failed running observer on commit {id}: {source}")]
    Observer {
        id: String,
        #[source]
        source: Box<MetricsError>,
    },
    #[error("Failed to calculate metric on commit {id}: {source}")]
    Calculate {
        id: String,
        #[source]
        source: Box<MetricsError>,
    },
    #[error("Failed to remove temporary directory {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl MetricsError {
    pub(crate) fn at_commit(self, id: &str) -> Self {
        MetricsError::Commit {
            id: id.to_string(),
            source: Box::new(self),
        }
    }
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::discover::Error> for MetricsError {
    fn from(err: gix::discover::Error) -> Self {
        MetricsError::GitDiscover(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for MetricsError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        MetricsError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for MetricsError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        MetricsError::HeadPeel(Box::new(err))
    }
}

impl From<gix::object::find::existing::Error> for MetricsError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        MetricsError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for MetricsError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        MetricsError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for MetricsError {
    fn from(err: gix::objs::decode::Error) -> Self {
        MetricsError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for MetricsError {
    fn from(err: gix::object::commit::Error) -> Self {
        MetricsError::CommitTree(Box::new(err))
    }
}
