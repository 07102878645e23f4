use thiserror::Error;

use crate::domain::utils::id::LaneId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scenario JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write statistics: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to build internal domain model: {0}")]
    ModelConstructionError(String),

    #[error("Lane {0} is not part of the intersection")]
    UnknownLane(LaneId),

    #[error("Vehicle spec '{0}' is not registered")]
    UnknownVehicleSpec(String),

    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
