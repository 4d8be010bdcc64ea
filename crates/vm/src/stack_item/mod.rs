//! Stack item module for the OnyxChain virtual machine.
//!
//! This module provides the value types manipulated by the VM: primitive
//! items, the Array/Struct/Map containers and opaque interop handles.

pub mod array;
pub mod interop_interface;
pub mod map;
#[allow(clippy::module_inception)]
pub mod stack_item;
pub mod stack_item_type;
pub mod struct_item;

pub use array::Array;
pub use interop_interface::{InteropHandle, InteropInterface};
pub use map::{Map, MapKey};
pub use stack_item::StackItem;
pub use stack_item_type::StackItemType;
pub use struct_item::Struct;
