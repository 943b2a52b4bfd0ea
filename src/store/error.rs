use std::{
    error::Error,
    fmt::{Display, Formatter},
    io,
    path::PathBuf,
    time::Duration,
};

/// Failure to read or write the persisted document.
#[derive(Debug)]
pub enum StoreError {
    /// Nothing is stored under the document key. Usually means the store was never initialized.
    Missing,
    /// The stored value is not a valid document. Stored data is left untouched.
    Corrupt(serde_json::Error),
    /// The backend itself failed.
    Backend(anyhow::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "no stored document found, storage was never initialized"),
            Self::Corrupt(err) => write!(f, "stored document is corrupted: {err}"),
            Self::Backend(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Missing => None,
            Self::Corrupt(err) => Some(err),
            Self::Backend(err) => Some(&**err),
        }
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(value: anyhow::Error) -> Self {
        Self::Backend(value)
    }
}

/// Failure to register a file for a check-in.
#[derive(Debug)]
pub enum RegisterError {
    /// The path can't be inspected or opened for reading.
    Unreadable { path: PathBuf, source: io::Error },
    /// The path exists but isn't a regular file.
    NotAFile(PathBuf),
    /// Registration took longer than the configured limit.
    TimedOut(Duration),
}

impl Display for RegisterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable { path, source } => {
                write!(f, "can't read {}: {source}", path.display())
            }
            Self::NotAFile(path) => write!(f, "{} is not a regular file", path.display()),
            Self::TimedOut(limit) => write!(f, "file registration timed out after {limit:?}"),
        }
    }
}

impl Error for RegisterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } => Some(source),
            Self::NotAFile(_) | Self::TimedOut(_) => None,
        }
    }
}
