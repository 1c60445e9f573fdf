use thiserror::Error;

/// Failures that leave no meaningful palette to write.
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("harvested data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("harvested data contains no blocks")]
    NoBlocks,

    #[error("{block}: default permutation has no value for `{state}`")]
    MissingDefault { block: String, state: String },
}

pub type Result<T> = std::result::Result<T, PaletteError>;
