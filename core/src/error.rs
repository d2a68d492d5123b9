use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Slot,
    Position,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Slot => f.write_str("slot"),
            IndexKind::Position => f.write_str("position"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{kind} {index} out of range for {len} frames")]
    IndexOutOfRange {
        kind: IndexKind,
        index: usize,
        len: usize,
    },
}

impl PuzzleError {
    pub(crate) fn out_of_range(kind: IndexKind, index: usize, len: usize) -> Self {
        PuzzleError::IndexOutOfRange { kind, index, len }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error("snapshot version {found} does not match {expected}")]
    Version { found: u32, expected: u32 },
    #[error("snapshot is for collection '{found}', not '{expected}'")]
    Collection { found: String, expected: String },
    #[error("snapshot holds {found} frames but the collection has {expected}")]
    FrameCount { found: usize, expected: usize },
    #[error("snapshot state is inconsistent: {0}")]
    Corrupt(&'static str),
}
