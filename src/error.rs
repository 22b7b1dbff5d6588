/// Errors that can occur when building an engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GomokuError {
    #[error(
        "invalid board size {column}x{row}: both dimensions must be between 1 and {max} and the cell count must fit in usize",
        max = i32::MAX
    )]
    InvalidSize { column: usize, row: usize },
}
