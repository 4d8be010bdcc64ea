//! Error types for the OnyxChain virtual machine value model.
//!
//! Every failure raised here is local to one contract invocation. The
//! interpreter turns any [`VmError`] into a FAULT for the running script and
//! keeps the node going.

use crate::stack_item::StackItemType;
use thiserror::Error;

/// Errors raised by stack item accessors, containers and the serializer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// An accessor was called on a variant that cannot produce the value.
    #[error("Not support {from} to {to}")]
    InvalidConversion {
        /// Variant of the item the accessor was called on.
        from: StackItemType,
        /// Name of the requested representation.
        to: &'static str,
    },

    /// A depth-guarded walk entered a container beyond the configured limit.
    #[error("Over max struct depth: {limit}")]
    DepthExceeded {
        /// The configured nesting limit.
        limit: usize,
    },

    /// Index outside `[0, len)`.
    #[error("Index out of range: {index} (len {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the container at the time of the call.
        len: usize,
    },

    /// The item cannot be used as a map key.
    #[error("{0} cannot be used as a map key")]
    InvalidMapKey(StackItemType),

    /// Too many elements were visited while cloning or serializing.
    #[error("Over max item count: {limit}")]
    ItemLimitExceeded {
        /// The configured element budget.
        limit: usize,
    },

    /// The serializer has no encoding for this variant.
    #[error("Unsupported stack item type for serialization: {0}")]
    Unsupported(StackItemType),

    /// Malformed serialized data.
    #[error("Format error: {0}")]
    Format(String),
}

impl VmError {
    /// Creates a conversion error for `from` requested as `to`.
    pub fn conversion(from: StackItemType, to: &'static str) -> Self {
        Self::InvalidConversion { from, to }
    }

    /// Creates an index error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Creates a format error with the given message.
    pub fn format<S: Into<String>>(message: S) -> Self {
        Self::Format(message.into())
    }

    /// Returns true if this error came from a nesting or element budget.
    pub fn is_limit_error(&self) -> bool {
        matches!(
            self,
            Self::DepthExceeded { .. } | Self::ItemLimitExceeded { .. }
        )
    }
}

/// Result type for value model operations.
pub type VmResult<T> = Result<T, VmError>;
