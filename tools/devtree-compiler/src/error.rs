use devtree_abi::decode::DevTreeError;
use std::path::PathBuf;

/// A descriptor was rejected before any encoding took place.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("device #{index} ({name:?}): unknown device type {tag:?}")]
    UnknownDeviceType {
        index: usize,
        name: String,
        tag: String,
    },
    #[error("device #{index} ({name:?}): field `{field}` out of range: {reason}")]
    FieldOutOfRange {
        index: usize,
        name: String,
        field: &'static str,
        reason: String,
    },
    #[error(
        "device #{index} ({name:?}): MMIO region base {base:#x} is null or not aligned to {alignment:#x}"
    )]
    AlignmentViolation {
        index: usize,
        name: String,
        base: u64,
        alignment: u64,
    },
    #[error("device #{index}: invalid name {name:?}: {reason}")]
    InvalidName {
        index: usize,
        name: String,
        reason: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A value does not fit the wire width of its field.
    #[error("device #{index} ({name:?}): value {value:#x} does not fit field `{field}`")]
    EncodingOverflow {
        index: usize,
        name: String,
        field: &'static str,
        value: u64,
    },

    /// A blob-global layout field (entry count, name table offset) overflowed.
    #[error("layout field `{field}` overflows its width (value {value:#x})")]
    LayoutOverflow { field: &'static str, value: u64 },

    #[error("corrupt device tree blob")]
    CorruptBlob(#[from] DevTreeError),

    #[error("malformed board description")]
    Board(#[from] serde_json::Error),

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
