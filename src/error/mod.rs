use std::path::PathBuf;

/// Errors raised while building a chromothripsis benchmark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("FASTA error: {0}")]
    Fasta(String),

    #[error("RepeatMasker parsing error: {0}")]
    RepeatMasker(String),

    #[error("chromosome '{0}' not found in reference")]
    UnknownChromosome(String),

    #[error(
        "insufficient reference on {chromosome}: {region_len} bases left after \
         {padding} bases of padding cannot hold a fragment of {fragment_size} bases"
    )]
    InsufficientReference {
        chromosome: String,
        region_len: u64,
        padding: u64,
        fragment_size: u64,
    },

    #[error("insufficient fragments: requested {requested}, {available} available")]
    InsufficientFragments { requested: usize, available: usize },

    #[error("no '{class_family}' repeat annotations on {chromosome}")]
    NoAnnotations {
        chromosome: String,
        class_family: String,
    },

    #[error("invalid fragment #{index} on {chromosome}: [{start}, {end})")]
    InvalidFragment {
        chromosome: String,
        index: usize,
        start: u64,
        end: u64,
    },
}

impl Error {
    /// Wraps an `io::Error` with the path it happened on.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
