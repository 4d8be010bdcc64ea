//! Limits applied by the value model.
//!
//! The interpreter owns one [`VmLimits`] per engine and passes it to every
//! depth-guarded operation. The `*_with_limits` forms of clone, equality and
//! serialization take it explicitly; the plain forms use [`VmLimits::DEFAULT`].

#[cfg(feature = "serde-types")]
use serde::{Deserialize, Serialize};

/// Maximum nesting depth a Struct clone or compare may enter.
pub const MAX_STRUCT_DEPTH: usize = 10;

/// Maximum number of children a single Struct clone may visit.
pub const MAX_CLONE_LENGTH: usize = 1024;

/// Maximum number of elements a single Struct or Map comparison may visit.
pub const MAX_COMPARABLE_ITEMS: usize = 2048;

/// Maximum size in bytes of a serialized byte array payload.
pub const MAX_ITEM_SIZE: usize = 1024 * 1024;

/// Maximum number of items in one serialized graph.
pub const MAX_ITEMS: usize = 2048;

/// How `Array::remove_at` interprets its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-types", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-types", serde(rename_all = "lowercase"))]
pub enum RemoveAtMode {
    /// Removes exactly the element at `index`.
    #[default]
    Exact,
    /// Compatibility with the legacy engine: removes the element at
    /// `index - 1`. Only for replaying historical ledgers.
    Legacy,
}

/// Restrictions on the value model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-types", serde(default))]
pub struct VmLimits {
    /// The maximum nesting depth for Struct clone/equality and serialization.
    pub max_struct_depth: usize,

    /// The maximum number of children visited by one Struct clone.
    pub max_clone_length: usize,

    /// The maximum number of elements visited by one Struct or Map comparison.
    pub max_comparable_items: usize,

    /// The maximum size of a byte array payload in the serializer.
    pub max_item_size: usize,

    /// The maximum number of items in a serialized graph.
    pub max_items: usize,

    /// Index semantics of `Array::remove_at`.
    pub remove_at_mode: RemoveAtMode,
}

impl VmLimits {
    /// The default limits.
    pub const DEFAULT: Self = Self {
        max_struct_depth: MAX_STRUCT_DEPTH,
        max_clone_length: MAX_CLONE_LENGTH,
        max_comparable_items: MAX_COMPARABLE_ITEMS,
        max_item_size: MAX_ITEM_SIZE,
        max_items: MAX_ITEMS,
        remove_at_mode: RemoveAtMode::Exact,
    };

    /// Returns a copy with a different struct depth limit.
    pub fn with_max_struct_depth(mut self, depth: usize) -> Self {
        self.max_struct_depth = depth;
        self
    }

    /// Returns a copy with a different `remove_at` mode.
    pub fn with_remove_at_mode(mut self, mode: RemoveAtMode) -> Self {
        self.remove_at_mode = mode;
        self
    }

    /// Parses limits from a TOML table. Missing keys take their defaults.
    #[cfg(feature = "serde-types")]
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

impl Default for VmLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
