use thiserror::Error;

use pvgpool::PoolError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("Invalid rotation interval: min {min_millis}ms is greater than max {max_millis}ms")]
    InvalidInterval { min_millis: u64, max_millis: u64 },
    #[error("Unknown quality level: {0}")]
    UnknownQuality(String),
}
