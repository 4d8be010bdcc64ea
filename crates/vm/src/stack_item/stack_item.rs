//! Stack item implementation for the OnyxChain VM.
//!
//! [`StackItem`] is the closed set of values the interpreter, the native
//! contract bridge and the serializer operate on. Every accessor is total:
//! a mismatched variant yields [`VmError::InvalidConversion`], never a panic.

use crate::error::{VmError, VmResult};
use crate::limits::VmLimits;
use crate::stack_item::array::Array;
use crate::stack_item::interop_interface::{InteropHandle, InteropInterface};
use crate::stack_item::map::{Map, MapKey};
use crate::stack_item::stack_item_type::StackItemType;
use crate::stack_item::struct_item::Struct;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{One, Zero};

/// Represents a value in the VM.
#[derive(Debug, Clone)]
pub enum StackItem {
    /// A truth value.
    Boolean(bool),

    /// An arbitrary-precision signed integer.
    Integer(BigInt),

    /// An immutable byte sequence.
    ByteArray(Vec<u8>),

    /// An opaque handle to a host object.
    InteropInterface(InteropHandle),

    /// A sequence with reference semantics.
    Array(Array),

    /// A sequence with value semantics.
    Struct(Struct),

    /// A mapping from key-eligible items to items.
    Map(Map),
}

impl StackItem {
    /// Creates a boolean stack item.
    pub fn from_bool(value: bool) -> Self {
        StackItem::Boolean(value)
    }

    /// Creates an integer stack item.
    pub fn from_int<T: Into<BigInt>>(value: T) -> Self {
        StackItem::Integer(value.into())
    }

    /// Creates a byte array stack item.
    pub fn from_byte_array<T: Into<Vec<u8>>>(value: T) -> Self {
        StackItem::ByteArray(value.into())
    }

    /// Creates an array stack item with fresh storage.
    pub fn from_array<T: Into<Vec<StackItem>>>(value: T) -> Self {
        StackItem::Array(Array::new(value.into()))
    }

    /// Creates a struct stack item with fresh storage.
    pub fn from_struct<T: Into<Vec<StackItem>>>(value: T) -> Self {
        StackItem::Struct(Struct::new(value.into()))
    }

    /// Creates a map stack item with fresh storage.
    pub fn from_map<T: Into<IndexMap<MapKey, StackItem>>>(value: T) -> Self {
        StackItem::Map(Map::new(value.into()))
    }

    /// Creates an interop stack item wrapping a host object.
    pub fn from_interface<T: InteropInterface + 'static>(value: T) -> Self {
        StackItem::InteropInterface(InteropHandle::new(value))
    }

    /// Returns the type of the stack item.
    pub fn stack_item_type(&self) -> StackItemType {
        match self {
            StackItem::Boolean(_) => StackItemType::Boolean,
            StackItem::Integer(_) => StackItemType::Integer,
            StackItem::ByteArray(_) => StackItemType::ByteArray,
            StackItem::InteropInterface(_) => StackItemType::InteropInterface,
            StackItem::Array(_) => StackItemType::Array,
            StackItem::Struct(_) => StackItemType::Struct,
            StackItem::Map(_) => StackItemType::Map,
        }
    }

    fn conversion_error(&self, to: &'static str) -> VmError {
        VmError::conversion(self.stack_item_type(), to)
    }

    /// Gets the integer value. Only an Integer has one.
    pub fn get_big_integer(&self) -> VmResult<BigInt> {
        match self {
            StackItem::Integer(value) => Ok(value.clone()),
            _ => Err(self.conversion_error("integer")),
        }
    }

    /// Gets the boolean value. Only a Boolean has one.
    pub fn get_boolean(&self) -> VmResult<bool> {
        match self {
            StackItem::Boolean(value) => Ok(*value),
            _ => Err(self.conversion_error("boolean")),
        }
    }

    /// Gets the byte representation.
    ///
    /// A ByteArray yields its contents, an Integer its little-endian two's
    /// complement encoding (empty for zero) and a Boolean `[1]` or `[0]`.
    pub fn get_byte_array(&self) -> VmResult<Vec<u8>> {
        match self {
            StackItem::ByteArray(value) => Ok(value.clone()),
            StackItem::Integer(value) => Ok(integer_to_bytes(value)),
            StackItem::Boolean(value) => Ok(vec![u8::from(*value)]),
            _ => Err(self.conversion_error("byte array")),
        }
    }

    /// Gets the host handle of an Interop item.
    pub fn get_interface(&self) -> VmResult<InteropHandle> {
        match self {
            StackItem::InteropInterface(handle) => Ok(handle.clone()),
            _ => Err(self.conversion_error("interface")),
        }
    }

    /// Gets the host object of an Interop item as a concrete type.
    pub fn get_interface_as<T: 'static>(&self) -> VmResult<&T> {
        match self {
            StackItem::InteropInterface(handle) => handle
                .downcast_ref::<T>()
                .ok_or_else(|| self.conversion_error(std::any::type_name::<T>())),
            _ => Err(self.conversion_error("interface")),
        }
    }

    /// Gets the elements of an Array or Struct. Children are shared.
    pub fn get_array(&self) -> VmResult<Vec<StackItem>> {
        match self {
            StackItem::Array(array) => Ok(array.items()),
            StackItem::Struct(structure) => Ok(structure.items()),
            _ => Err(self.conversion_error("array")),
        }
    }

    /// Gets the elements of a Struct or Array. Children are shared.
    pub fn get_struct(&self) -> VmResult<Vec<StackItem>> {
        match self {
            StackItem::Array(array) => Ok(array.items()),
            StackItem::Struct(structure) => Ok(structure.items()),
            _ => Err(self.conversion_error("struct")),
        }
    }

    /// Gets the entries of a Map.
    pub fn get_map(&self) -> VmResult<IndexMap<MapKey, StackItem>> {
        match self {
            StackItem::Map(map) => Ok(map.entries()),
            _ => Err(self.conversion_error("map")),
        }
    }

    /// Borrows the Array handle for in-place mutation.
    pub fn as_array(&self) -> VmResult<&Array> {
        match self {
            StackItem::Array(array) => Ok(array),
            _ => Err(self.conversion_error("array")),
        }
    }

    /// Borrows the Struct handle for in-place mutation.
    pub fn as_struct(&self) -> VmResult<&Struct> {
        match self {
            StackItem::Struct(structure) => Ok(structure),
            _ => Err(self.conversion_error("struct")),
        }
    }

    /// Borrows the Map handle for in-place mutation.
    pub fn as_map(&self) -> VmResult<&Map> {
        match self {
            StackItem::Map(map) => Ok(map),
            _ => Err(self.conversion_error("map")),
        }
    }

    /// True for Boolean, Integer and ByteArray.
    pub fn is_map_key(&self) -> bool {
        matches!(
            self,
            StackItem::Boolean(_) | StackItem::Integer(_) | StackItem::ByteArray(_)
        )
    }

    /// Number of elements of a container; 1 for every other variant.
    pub fn count(&self) -> usize {
        match self {
            StackItem::Array(array) => array.len(),
            StackItem::Struct(structure) => structure.len(),
            StackItem::Map(map) => map.len(),
            _ => 1,
        }
    }

    /// Checks if two stack items are equal, using the default limits.
    ///
    /// Never fails: a comparison that exceeds the nesting limit or the
    /// element budget is reported as not equal.
    pub fn equals(&self, other: &StackItem) -> bool {
        match self.equals_with_limits(other, &VmLimits::DEFAULT) {
            Ok(equal) => equal,
            Err(err) => {
                log::debug!("equality treated as false: {err}");
                false
            }
        }
    }

    /// Checks if two stack items are equal.
    ///
    /// Primitives compare by value within the same variant. Arrays and
    /// interop handles compare by identity. Structs compare element-wise and
    /// maps entry-wise, both bounded by `max_struct_depth` and by
    /// `max_comparable_items` elements visited in total.
    pub fn equals_with_limits(&self, other: &StackItem, limits: &VmLimits) -> VmResult<bool> {
        let mut remaining = limits.max_comparable_items;
        self.equals_at_depth(other, 0, limits, &mut remaining)
    }

    fn equals_at_depth(
        &self,
        other: &StackItem,
        depth: usize,
        limits: &VmLimits,
        remaining: &mut usize,
    ) -> VmResult<bool> {
        match (self, other) {
            (StackItem::Boolean(a), StackItem::Boolean(b)) => Ok(a == b),
            (StackItem::Integer(a), StackItem::Integer(b)) => Ok(a == b),
            (StackItem::ByteArray(a), StackItem::ByteArray(b)) => Ok(a == b),
            (StackItem::InteropInterface(a), StackItem::InteropInterface(b)) => Ok(a.ptr_eq(b)),
            (StackItem::Array(a), StackItem::Array(b)) => Ok(a.ptr_eq(b)),
            (StackItem::Struct(a), StackItem::Struct(b)) => {
                if a.ptr_eq(b) {
                    log::trace!("struct identity shortcut at depth {depth}");
                    return Ok(true);
                }
                check_depth(depth, limits)?;

                let (left, right) = (a.items(), b.items());
                if left.len() != right.len() {
                    return Ok(false);
                }
                for (x, y) in left.iter().zip(right.iter()) {
                    take_comparison(remaining, limits)?;
                    if !x.equals_at_depth(y, depth + 1, limits, remaining)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (StackItem::Map(a), StackItem::Map(b)) => {
                if a.ptr_eq(b) {
                    log::trace!("map identity shortcut at depth {depth}");
                    return Ok(true);
                }
                check_depth(depth, limits)?;

                let (left, right) = (a.entries(), b.entries());
                if left.len() != right.len() {
                    return Ok(false);
                }
                for (key, value) in &left {
                    take_comparison(remaining, limits)?;
                    let Some(other_value) = right.get(key) else {
                        return Ok(false);
                    };
                    if !value.equals_at_depth(other_value, depth + 1, limits, remaining)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Copies the item into a slot that must not alias a Struct.
    ///
    /// A Struct is deep-cloned; every other variant is shared.
    pub fn clone_value(&self, limits: &VmLimits) -> VmResult<StackItem> {
        match self {
            StackItem::Struct(structure) => {
                Ok(StackItem::Struct(structure.clone_with_limits(limits)?))
            }
            other => Ok(other.clone()),
        }
    }

    /// Clears all references held by a container.
    ///
    /// Children are shared through reference counting, so a graph that
    /// contains itself is only reclaimed once its cycles are cleared.
    pub fn clear_references(&self) {
        match self {
            StackItem::Array(array) => array.clear(),
            StackItem::Struct(structure) => structure.clear(),
            StackItem::Map(map) => map.clear(),
            _ => {}
        }
    }
}

/// Drops detached children without recursing once per nesting level.
///
/// Containers whose storage is uniquely owned are emptied into the worklist
/// before they are dropped, so their own `Drop` finds nothing left to walk.
pub(crate) fn release_items(items: Vec<StackItem>) {
    let mut pending = items;
    while let Some(item) = pending.pop() {
        match &item {
            StackItem::Array(array) => array.detach_into(&mut pending),
            StackItem::Struct(structure) => structure.detach_into(&mut pending),
            StackItem::Map(map) => map.detach_into(&mut pending),
            _ => {}
        }
    }
}

fn check_depth(depth: usize, limits: &VmLimits) -> VmResult<()> {
    if depth >= limits.max_struct_depth {
        log::debug!("comparison aborted at depth {depth}");
        return Err(VmError::DepthExceeded {
            limit: limits.max_struct_depth,
        });
    }
    Ok(())
}

fn take_comparison(remaining: &mut usize, limits: &VmLimits) -> VmResult<()> {
    *remaining = remaining.checked_sub(1).ok_or_else(|| {
        log::debug!("comparison aborted after {} elements", limits.max_comparable_items);
        VmError::ItemLimitExceeded {
            limit: limits.max_comparable_items,
        }
    })?;
    Ok(())
}

fn integer_to_bytes(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_signed_bytes_le()
    }
}

impl PartialEq for StackItem {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<bool> for StackItem {
    fn from(value: bool) -> Self {
        StackItem::Boolean(value)
    }
}

impl From<BigInt> for StackItem {
    fn from(value: BigInt) -> Self {
        StackItem::Integer(value)
    }
}

impl From<i64> for StackItem {
    fn from(value: i64) -> Self {
        StackItem::Integer(BigInt::from(value))
    }
}

impl From<Vec<u8>> for StackItem {
    fn from(value: Vec<u8>) -> Self {
        StackItem::ByteArray(value)
    }
}

impl From<&[u8]> for StackItem {
    fn from(value: &[u8]) -> Self {
        StackItem::ByteArray(value.to_vec())
    }
}

impl From<Array> for StackItem {
    fn from(value: Array) -> Self {
        StackItem::Array(value)
    }
}

impl From<Struct> for StackItem {
    fn from(value: Struct) -> Self {
        StackItem::Struct(value)
    }
}

impl From<Map> for StackItem {
    fn from(value: Map) -> Self {
        StackItem::Map(value)
    }
}

impl From<InteropHandle> for StackItem {
    fn from(value: InteropHandle) -> Self {
        StackItem::InteropInterface(value)
    }
}

/// Boolean singletons used by the interpreter.
impl StackItem {
    /// The True value.
    pub fn true_value() -> Self {
        StackItem::Boolean(true)
    }

    /// The False value.
    pub fn false_value() -> Self {
        StackItem::Boolean(false)
    }

    /// Integer one.
    pub fn one() -> Self {
        StackItem::Integer(BigInt::one())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_bytes() {
        assert_eq!(StackItem::from_int(0).get_byte_array().unwrap(), Vec::<u8>::new());
        assert_eq!(StackItem::from_int(1).get_byte_array().unwrap(), vec![0x01]);
        assert_eq!(StackItem::from_int(-1).get_byte_array().unwrap(), vec![0xff]);
        assert_eq!(StackItem::from_int(128).get_byte_array().unwrap(), vec![0x80, 0x00]);
        assert_eq!(StackItem::from_int(-129).get_byte_array().unwrap(), vec![0x7f, 0xff]);
    }

    #[test]
    fn test_boolean_bytes() {
        assert_eq!(StackItem::true_value().get_byte_array().unwrap(), vec![1]);
        assert_eq!(StackItem::false_value().get_byte_array().unwrap(), vec![0]);
    }

    #[test]
    fn test_cross_variant_equality() {
        assert!(!StackItem::from_int(1).equals(&StackItem::from_bool(true)));
        assert!(!StackItem::from_int(1).equals(&StackItem::from_byte_array(vec![1])));
        assert!(StackItem::one().equals(&StackItem::from_int(1)));
    }

    #[test]
    fn test_struct_value_equality() {
        let a = StackItem::from_struct(vec![StackItem::from_int(1), StackItem::from_bool(true)]);
        let b = StackItem::from_struct(vec![StackItem::from_int(1), StackItem::from_bool(true)]);
        let c = StackItem::from_struct(vec![StackItem::from_int(2), StackItem::from_bool(true)]);

        assert!(a.equals(&b));
        assert!(!a.equals(&c));
        assert!(!a.equals(&StackItem::from_array(vec![
            StackItem::from_int(1),
            StackItem::from_bool(true),
        ])));
    }

    #[test]
    fn test_clone_value() {
        let inner = Array::default();
        let original = StackItem::from_struct(vec![StackItem::Array(inner.clone())]);

        let copy = original.clone_value(&VmLimits::DEFAULT).unwrap();
        assert!(copy.equals(&original));
        assert!(!copy.as_struct().unwrap().ptr_eq(original.as_struct().unwrap()));

        let array = StackItem::Array(inner);
        let shared = array.clone_value(&VmLimits::DEFAULT).unwrap();
        assert!(shared.equals(&array));
    }

    #[test]
    fn test_interface_downcast() {
        #[derive(Debug)]
        struct Context;

        impl InteropInterface for Context {
            fn interface_type(&self) -> &str {
                "Context"
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        let item = StackItem::from_interface(Context);
        assert!(item.get_interface_as::<Context>().is_ok());
        assert!(matches!(
            item.get_interface_as::<String>(),
            Err(VmError::InvalidConversion {
                from: StackItemType::InteropInterface,
                ..
            })
        ));
    }
}
