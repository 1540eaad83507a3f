use std::path::PathBuf;
use thiserror::Error;

use crate::results::SearchResults;

#[derive(Error, Debug)]
pub enum FindpassError {
    // Command synthesis
    #[error("error parsing the search command: {source}")]
    CommandParse {
        command: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("invalid name pattern `{0}`")]
    InvalidPattern(String),

    #[error("invalid regular expression `{pattern}`")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid value for '{constraint}': {reason}")]
    InvalidConstraintValue {
        constraint: &'static str,
        reason:     String,
    },

    // Runtime
    #[error("error running the search command `{program}`")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("read error on {stream}")]
    StreamRead {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("the find pass after a quick search could not start")]
    SecondPass {
        /// Summary of the finished quick pass.
        results: Box<SearchResults>,
        #[source]
        source:  Box<FindpassError>,
    },

    #[error("a search is already running")]
    Busy,

    // Settings
    #[error("cannot read settings file")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse settings file")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot write settings file")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FindpassError {
    /// The command line this error is about, if applicable.
    /// Callers use this to show the failing command next to the message.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::CommandParse { command, .. } => Some(command),
            Self::CommandSpawn { program, .. } => Some(program),
            Self::SecondPass { source, .. } => source.command(),
            _ => None,
        }
    }

    /// What was found before the run failed, if anything was.
    pub fn partial_results(&self) -> Option<&SearchResults> {
        match self {
            Self::SecondPass { results, .. } => Some(results.as_ref()),
            _ => None,
        }
    }

    /// Whether the run can continue after this error.
    ///
    /// Only single stream reads are recoverable: the line is skipped and the
    /// read loop keeps going. Everything else ends the run (or never starts it).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StreamRead { .. })
    }
}
