use std::{fmt::Display, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// Source file does not exist
    FileNotFound(PathBuf),
    /// Line number argument is missing, non-numeric or negative
    InvalidArgument(String),
    /// A side-car index exists but does not decode into a valid offset index
    CorruptIndex(&'static str),
    /// On request for a line beyond the indexed lines
    LineNotFound { line: usize, lines: usize },
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {}", e),
            Self::FileNotFound(path) => {
                write!(f, "The specified file does not exist: {}", path.display())
            }
            Self::InvalidArgument(msg) => write!(f, "{}", msg),
            Self::CorruptIndex(reason) => write!(f, "corrupt index: {}", reason),
            Self::LineNotFound { line, lines } => {
                write!(f, "Cannot find line {} ({} lines indexed)", line, lines)
            }
        }
    }
}
