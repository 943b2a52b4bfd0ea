use std::{
    error::Error,
    fmt::{Display, Formatter},
};

use crate::store::error::{RegisterError, StoreError};

/// Input the user has to fix. Nothing is written when one of these is returned.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    MissingTitle,
    MissingDeadline,
    InvalidDeadline(String),
    NoTaskSelected,
    UnknownTask(String),
    NoFiles,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "please enter a task title"),
            Self::MissingDeadline => write!(f, "please set a deadline"),
            Self::InvalidDeadline(value) => write!(f, "can't understand deadline `{value}`"),
            Self::NoTaskSelected => write!(f, "please select a task first"),
            Self::UnknownTask(id) => write!(f, "there is no task with id {id}"),
            Self::NoFiles => write!(f, "please choose at least one file to upload"),
        }
    }
}

impl Error for ValidationError {}

/// Failure of a user command.
#[derive(Debug)]
pub enum CommandError {
    Validation(ValidationError),
    Store(StoreError),
    Register(RegisterError),
}

impl CommandError {
    /// Whether the session can go on after showing the error to the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Register(_))
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Register(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Register(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CommandError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CommandError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RegisterError> for CommandError {
    fn from(value: RegisterError) -> Self {
        Self::Register(value)
    }
}
