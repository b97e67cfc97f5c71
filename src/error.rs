// src/error.rs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide error type.
///
/// Per-item failures inside a pool stage are soft: the item is dropped from
/// the stage output and counted. `ToolUnavailable` and `AlreadyExists` are
/// fatal for the whole run, see [`Error::is_fatal`].
#[derive(Debug, Error)]
pub enum Error {
    /// An expected input file is missing.
    #[error("provided path {0} is not a file")]
    NotFound(PathBuf),

    /// A caller-supplied output path already exists; never overwritten.
    #[error("provided output path {0} already exists")]
    AlreadyExists(PathBuf),

    /// The external executable could not be launched at all.
    #[error("couldn't run '{tool}', please ensure that '{tool}' is installed and in your path")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// Diameter computation precondition violated (disconnected or cyclic
    /// structure, or unparseable Newick text).
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    /// Statistics requested over an empty collection.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// True for categories that abort the entire run: a missing executable
    /// can never produce useful output, and a caller-supplied output path
    /// that already exists must never be clobbered.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ToolUnavailable { .. } | Error::AlreadyExists(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
