use std::io;

use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum CompactError {
    #[error("Invalid source path '{0}'")]
    InvalidSource(String),
    #[error("Invalid destination path '{0}'")]
    InvalidDestination(String),
    #[error("Invalid namespace")]
    InvalidNamespace,
    #[error("The namespace '{0}' has already been added")]
    AlreadyExists(String),
    #[error("Unknown namespace '{0}'")]
    UnknownNamespace(String),
    #[error("Unable to find '{0}'")]
    NotFound(String),
    #[error("You must pass one or more arrays containing valid namespace names")]
    NoGroups,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Transform error: {0}")]
    Transform(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl CompactError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CompactError::InvalidSource(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CompactError::InvalidDestination(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CompactError::InvalidNamespace => StatusCode::BAD_REQUEST,
            CompactError::AlreadyExists(_) => StatusCode::CONFLICT,
            CompactError::UnknownNamespace(_) => StatusCode::NOT_FOUND,
            CompactError::NotFound(_) => StatusCode::NOT_FOUND,
            CompactError::NoGroups => StatusCode::BAD_REQUEST,
            CompactError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CompactError::Transform(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CompactError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CompactError::PermissionDenied => StatusCode::FORBIDDEN,
            CompactError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<toml::de::Error> for CompactError {
    fn from(src: toml::de::Error) -> CompactError {
        CompactError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<JsonError> for CompactError {
    fn from(src: JsonError) -> CompactError {
        CompactError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for CompactError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::PermissionDenied => CompactError::PermissionDenied,
            _ => CompactError::Io(format!("IOError: {x}")),
        }
    }
}

impl From<JoinError> for CompactError {
    fn from(x: JoinError) -> Self {
        CompactError::Transform(format!("transform task did not complete: {x}"))
    }
}
