use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MazeError {
    /// The grid has no cells, so there is neither a start nor a goal
    #[error("invalid grid: {rows}x{columns} has no cells")]
    InvalidGrid { rows: usize, columns: usize },
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}
