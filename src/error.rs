use thiserror::Error;

/// Failures talking to the sightings backend.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid API url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// Why a location source could not produce a position.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("location service unavailable")]
    Unavailable,

    #[error("invalid position: {0}")]
    Invalid(#[from] CoordinateError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadiusError {
    #[error("radius must be one of 10, 25, 50, 100 or 250 km (got {0})")]
    Unsupported(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreError {
    #[error("score must be between 1 and 5, or 0 to clear (got {0})")]
    OutOfRange(u8),
}
