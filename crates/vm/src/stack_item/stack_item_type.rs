//! Stack item type tags.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

#[cfg(feature = "serde-types")]
use serde::{Deserialize, Serialize};

/// The type tag of a stack item. The discriminant is the serialized tag byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde-types", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum StackItemType {
    Boolean = 0x20,
    Integer = 0x21,
    ByteArray = 0x28,
    Array = 0x40,
    Struct = 0x41,
    Map = 0x48,
    InteropInterface = 0x60,
}

impl StackItemType {
    /// Returns the tag byte.
    pub fn to_byte(self) -> u8 {
        self.into()
    }

    /// Parses a tag byte, returning `None` for unknown tags.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::try_from(byte).ok()
    }

    /// Boolean, Integer and ByteArray.
    pub fn is_primitive(self) -> bool {
        matches!(self, Self::Boolean | Self::Integer | Self::ByteArray)
    }

    /// Array, Struct and Map.
    pub fn is_compound(self) -> bool {
        matches!(self, Self::Array | Self::Struct | Self::Map)
    }
}

impl fmt::Display for StackItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::ByteArray => "ByteArray",
            Self::Array => "Array",
            Self::Struct => "Struct",
            Self::Map => "Map",
            Self::InteropInterface => "InteropInterface",
        };
        f.write_str(name)
    }
}
