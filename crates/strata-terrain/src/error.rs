//! Error types for terrain generation and layer access.

/// Errors surfaced by generation and by terrain mutation.
///
/// "Nothing here" conditions (no tile for a height, no tile at a position,
/// nothing to delete) are not errors; they are returned as `None` or counts.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TerrainError {
    /// A setting is outside the range generation can work with.
    #[error("invalid terrain config: {0}")]
    InvalidConfig(String),

    /// A layer index does not name a layer of the terrain.
    #[error("layer index {index} out of range (terrain has {len} layers)")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of layers in the terrain.
        len: usize,
    },
}
