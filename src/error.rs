use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Hour out of range (expected 0-23): {0}")]
    InvalidHour(u32),

    #[error("Signal not found: {0}")]
    UnknownSignal(String),

    #[error("Region not found: {0}")]
    UnknownRegion(String),

    #[error("Signal {0} has no AI recommendation")]
    NoRecommendation(String),

    #[error("Failed to parse config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SignalError>;
