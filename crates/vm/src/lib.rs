//! # OnyxChain Virtual Machine value model
//!
//! The stack item types of the OnyxChain NeoVM-style bytecode VM.
//!
//! Every instruction, native contract call and storage serialization path
//! operates on [`StackItem`]. Contract bytecode is untrusted, so every
//! operation here is total: conversions return [`VmError`] on a mismatched
//! variant, and every recursive walk over containers (struct clone, struct
//! and map equality, serialization) is bounded by [`VmLimits`].
//!
//! ## Variants
//!
//! - **Boolean**, **Integer**, **ByteArray**: immutable primitives, the only
//!   valid map keys.
//! - **InteropInterface**: an opaque host object handle compared by identity.
//! - **Array**: a mutable sequence with reference semantics.
//! - **Struct**: a mutable sequence with value semantics, deep-cloned on copy.
//! - **Map**: an insertion-ordered mapping from [`MapKey`] to items.
//!
//! ## Example
//!
//! ```rust
//! use onyx_vm::{StackItem, VmLimits};
//!
//! let s = StackItem::from_struct(vec![StackItem::from_int(1)]);
//! let copy = s.clone_value(&VmLimits::default()).unwrap();
//! assert!(copy.equals(&s));
//!
//! copy.as_struct().unwrap().set(0, StackItem::from_int(2)).unwrap();
//! assert!(!copy.equals(&s));
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

/// Stack item binary encoding
pub mod binary_serializer;
/// VM error types and result handling
pub mod error;
/// Nesting and size limits
pub mod limits;
/// Polymorphic data types for VM values
pub mod stack_item;

pub use binary_serializer::BinarySerializer;
pub use error::{VmError, VmResult};
pub use limits::{
    RemoveAtMode, VmLimits, MAX_CLONE_LENGTH, MAX_COMPARABLE_ITEMS, MAX_STRUCT_DEPTH,
};
pub use stack_item::{
    Array, InteropHandle, InteropInterface, Map, MapKey, StackItem, StackItemType, Struct,
};
