use thiserror::Error;

/// All error conditions the core can surface to a host.
///
/// The core never logs; every variant carries the value that triggered it so
/// a host can format its own diagnostic without the core reaching for a
/// logging crate.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SearchError {
    #[error("column {0} is not a legal move (full or out of range)")]
    IllegalMove(u8),

    #[error("no moves left to undo")]
    NoHistory,

    #[error("oracle returned {got} evaluations for a batch of {expected} states")]
    OracleShapeBatch { expected: usize, got: usize },

    #[error("oracle policy vector has length {0}, expected 7")]
    OracleShapePolicy(usize),

    #[error("oracle value {0} is outside [-1, 1]")]
    OracleShapeValue(f32),

    #[error("move picker invoked with no completed playouts")]
    EmptySearch,

    #[error("playouts must be positive, got {0}")]
    ConfigInvalidPlayouts(u32),

    #[error("batch_size must be positive, got {0}")]
    ConfigInvalidBatchSize(usize),

    #[error("temperature must be positive, got {0}")]
    ConfigInvalidTemperature(f32),

    #[error("c_puct must be non-negative, got {0}")]
    ConfigInvalidCPuct(f32),

    #[error("dir_alpha must be positive, got {0}")]
    ConfigInvalidDirAlpha(f32),
}
