#![forbid(unsafe_code)]

//! Errors from reactive container operations.

/// Errors from fallible reactive operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactiveError {
    /// Positional access outside the current length.
    IndexOutOfRange { index: usize, len: usize },
    /// The container was disposed before the call.
    Disposed,
}

impl std::fmt::Display for ReactiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::Disposed => write!(f, "reactive container already disposed"),
        }
    }
}

impl std::error::Error for ReactiveError {}
