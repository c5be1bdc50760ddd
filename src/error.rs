//! Error types for the consignment service

use thiserror::Error;
use std::io;

/// Result type alias for consignment service operations
pub type Result<T> = std::result::Result<T, ConsignmentError>;

/// Custom error types for the consignment service
#[derive(Error, Debug)]
pub enum ConsignmentError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Protocol parse error: {0}")]
    Protocol(String),

    #[error("Frame exceeds {limit} bytes")]
    FrameTooLong { limit: usize },

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Repository full: capacity of {limit} consignments reached")]
    CapacityExceeded { limit: usize },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for ConsignmentError {
    fn from(err: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        ConsignmentError::Protocol(format!("Parse error: {:?}", err))
    }
}
