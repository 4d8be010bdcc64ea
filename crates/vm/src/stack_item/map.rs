//! Map stack item implementation for the OnyxChain VM.
//!
//! Keys are restricted to [`MapKey`]: Boolean, Integer and ByteArray. The
//! interpreter converts a popped item with `MapKey::try_from` before calling
//! into the map, so a non-key variant never reaches the storage.

use crate::error::{VmError, VmResult};
use crate::stack_item::stack_item::release_items;
use crate::stack_item::StackItem;
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A stack item that is allowed to be a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Boolean(bool),
    Integer(BigInt),
    ByteArray(Vec<u8>),
}

impl TryFrom<&StackItem> for MapKey {
    type Error = VmError;

    fn try_from(item: &StackItem) -> Result<Self, Self::Error> {
        match item {
            StackItem::Boolean(value) => Ok(Self::Boolean(*value)),
            StackItem::Integer(value) => Ok(Self::Integer(value.clone())),
            StackItem::ByteArray(value) => Ok(Self::ByteArray(value.clone())),
            other => Err(VmError::InvalidMapKey(other.stack_item_type())),
        }
    }
}

impl TryFrom<StackItem> for MapKey {
    type Error = VmError;

    fn try_from(item: StackItem) -> Result<Self, Self::Error> {
        match item {
            StackItem::Boolean(value) => Ok(Self::Boolean(value)),
            StackItem::Integer(value) => Ok(Self::Integer(value)),
            StackItem::ByteArray(value) => Ok(Self::ByteArray(value)),
            other => Err(VmError::InvalidMapKey(other.stack_item_type())),
        }
    }
}

impl From<MapKey> for StackItem {
    fn from(key: MapKey) -> Self {
        match key {
            MapKey::Boolean(value) => StackItem::Boolean(value),
            MapKey::Integer(value) => StackItem::Integer(value),
            MapKey::ByteArray(value) => StackItem::ByteArray(value),
        }
    }
}

/// Represents a map of stack items in the VM.
#[derive(Clone, Default)]
pub struct Map {
    inner: Rc<RefCell<IndexMap<MapKey, StackItem>>>,
}

impl Map {
    /// Creates a new map with the specified entries.
    pub fn new(entries: IndexMap<MapKey, StackItem>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(entries)),
        }
    }

    /// Returns a snapshot of the entries in insertion order.
    pub fn entries(&self) -> IndexMap<MapKey, StackItem> {
        self.inner.borrow().clone()
    }

    /// Gets the value for the specified key.
    pub fn get(&self, key: &MapKey) -> Option<StackItem> {
        self.inner.borrow().get(key).cloned()
    }

    /// Returns true if the key is present.
    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.inner.borrow().contains_key(key)
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(&self, key: MapKey, value: StackItem) -> Option<StackItem> {
        self.inner.borrow_mut().insert(key, value)
    }

    /// Removes a key, keeping the order of the remaining entries.
    pub fn remove(&self, key: &MapKey) -> Option<StackItem> {
        self.inner.borrow_mut().shift_remove(key)
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> Vec<MapKey> {
        self.inner.borrow().keys().cloned().collect()
    }

    /// Returns the values in insertion order.
    pub fn values(&self) -> Vec<StackItem> {
        self.inner.borrow().values().cloned().collect()
    }

    /// Gets the number of entries.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Same as [`Map::len`].
    pub fn count(&self) -> usize {
        self.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.inner.borrow_mut());
        drop(removed);
    }

    /// Returns true if both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Identity of the underlying storage.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    /// Moves the values into `pending` if this is the last handle.
    pub(crate) fn detach_into(&self, pending: &mut Vec<StackItem>) {
        if Rc::strong_count(&self.inner) != 1 {
            return;
        }
        if let Ok(mut entries) = self.inner.try_borrow_mut() {
            pending.extend(entries.drain(..).map(|(_, value)| value));
        }
    }
}

impl Drop for Map {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_into(&mut pending);
        if !pending.is_empty() {
            release_items(pending);
        }
    }
}

impl From<IndexMap<MapKey, StackItem>> for Map {
    fn from(entries: IndexMap<MapKey, StackItem>) -> Self {
        Self::new(entries)
    }
}

impl FromIterator<(MapKey, StackItem)> for Map {
    fn from_iter<I: IntoIterator<Item = (MapKey, StackItem)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Map");
        debug.field("id", &format_args!("{:#x}", self.id()));
        match self.inner.try_borrow() {
            Ok(entries) => debug.field("len", &entries.len()),
            Err(_) => debug.field("len", &"<borrowed>"),
        };
        debug.finish()
    }
}
