use std::fmt;

/// Errors raised by container operations and by the archive readers.
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    #[error("{op}: dimension mismatch ({left} vs. {right})")]
    DimMismatch {
        op: &'static str,
        left: usize,
        right: usize,
    },

    #[error("{op}: shape mismatch ({rows}x{cols} vs. {other_rows}x{other_cols})")]
    ShapeMismatch {
        op: &'static str,
        rows: usize,
        cols: usize,
        other_rows: usize,
        other_cols: usize,
    },

    #[error("index {index} out of bounds for dimension {dim}")]
    IndexOutOfBounds { index: usize, dim: usize },

    #[error("range [{offset}, {offset} + {len}) out of bounds for dimension {dim}")]
    RangeOutOfBounds {
        offset: usize,
        len: usize,
        dim: usize,
    },

    #[error(
        "view of extent {extent} starting at {offset} does not fit a buffer of length {len}"
    )]
    InvalidLayout {
        offset: usize,
        extent: usize,
        len: usize,
    },

    #[error("{op}: {what} of {value} exceeds the format limit of {limit}")]
    TooLarge {
        op: &'static str,
        what: &'static str,
        value: usize,
        limit: usize,
    },

    #[error("{op} requires a non-empty container")]
    Empty { op: &'static str },

    #[error(
        "Failed to read {what} from stream. {detail} \
         File position at start is {start}, currently {current}"
    )]
    Format {
        what: &'static str,
        detail: String,
        start: u64,
        current: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `Result<T, MatrixError>`.
pub type Result<T> = std::result::Result<T, MatrixError>;

/// IEEE special value met while parsing text data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialValue {
    Infinity,
    NaN,
}

/// Non-fatal warning produced by a read; the read itself succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advisory {
    pub value: SpecialValue,
    /// Byte offset of the token in the input stream.
    pub offset: u64,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            SpecialValue::Infinity => write!(f, "infinite value read at byte {}", self.offset),
            SpecialValue::NaN => write!(f, "NaN value read at byte {}", self.offset),
        }
    }
}

/// Shorten a diagnostic token to at most 20 characters.
pub(crate) fn truncate_token(token: &str) -> String {
    if token.chars().count() > 20 {
        let head: String = token.chars().take(17).collect();
        format!("{}...", head)
    } else {
        token.to_string()
    }
}
