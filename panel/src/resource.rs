use std::fmt::{Display, Formatter};

use crate::admin::AdminError;

pub enum CreateResourceError {
    AlreadyExists,
    Error(anyhow::Error),
}

pub enum UpdateResourceError {
    NotFound,
    Error(anyhow::Error),
}

pub enum DeleteResourceError {
    StillActive,
    StillInUse,
    NotFound,
    Error(anyhow::Error),
}

impl Display for CreateResourceError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateResourceError::AlreadyExists => write!(formatter, "Resource already exists"),
            CreateResourceError::Error(error) => write!(formatter, "Error: {}", error),
        }
    }
}

impl Display for UpdateResourceError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateResourceError::NotFound => write!(formatter, "Resource not found"),
            UpdateResourceError::Error(error) => write!(formatter, "Error: {}", error),
        }
    }
}

impl Display for DeleteResourceError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteResourceError::StillActive => write!(formatter, "Resource is still set to active"),
            DeleteResourceError::StillInUse => write!(formatter, "Resource is still in use"),
            DeleteResourceError::NotFound => write!(formatter, "Resource not found"),
            DeleteResourceError::Error(error) => write!(formatter, "Error: {}", error),
        }
    }
}

impl From<anyhow::Error> for CreateResourceError {
    fn from(error: anyhow::Error) -> Self {
        CreateResourceError::Error(error)
    }
}

impl From<anyhow::Error> for UpdateResourceError {
    fn from(error: anyhow::Error) -> Self {
        UpdateResourceError::Error(error)
    }
}

impl From<anyhow::Error> for DeleteResourceError {
    fn from(error: anyhow::Error) -> Self {
        DeleteResourceError::Error(error)
    }
}

impl From<CreateResourceError> for AdminError {
    fn from(value: CreateResourceError) -> Self {
        match value {
            CreateResourceError::AlreadyExists => AdminError::AlreadyExists(value.to_string()),
            CreateResourceError::Error(error) => AdminError::Internal(error.to_string()),
        }
    }
}

impl From<UpdateResourceError> for AdminError {
    fn from(value: UpdateResourceError) -> Self {
        match value {
            UpdateResourceError::NotFound => AdminError::NotFound(value.to_string()),
            UpdateResourceError::Error(error) => AdminError::Internal(error.to_string()),
        }
    }
}

impl From<DeleteResourceError> for AdminError {
    fn from(value: DeleteResourceError) -> Self {
        match value {
            DeleteResourceError::NotFound => AdminError::NotFound(value.to_string()),
            DeleteResourceError::Error(error) => AdminError::Internal(error.to_string()),
            _ => AdminError::Precondition(value.to_string()),
        }
    }
}
