//! Struct stack item implementation for the OnyxChain VM.
//!
//! A Struct stores its children the same way an Array does, but behaves as a
//! value: it is compared element by element and is deep-cloned before being
//! copied into a slot that must not alias the original.

use crate::error::{VmError, VmResult};
use crate::limits::VmLimits;
use crate::stack_item::stack_item::release_items;
use crate::stack_item::StackItem;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Represents a struct of stack items in the VM.
#[derive(Clone, Default)]
pub struct Struct {
    inner: Rc<RefCell<Vec<StackItem>>>,
}

impl Struct {
    /// Creates a new struct with the specified items.
    pub fn new(items: Vec<StackItem>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(items)),
        }
    }

    /// Returns a snapshot of the items. Children are shared, not copied.
    pub fn items(&self) -> Vec<StackItem> {
        self.inner.borrow().clone()
    }

    /// Gets the item at the specified index.
    pub fn get(&self, index: usize) -> VmResult<StackItem> {
        let items = self.inner.borrow();
        items
            .get(index)
            .cloned()
            .ok_or_else(|| VmError::index_out_of_range(index, items.len()))
    }

    /// Sets the item at the specified index.
    pub fn set(&self, index: usize, item: StackItem) -> VmResult<()> {
        let previous = {
            let mut items = self.inner.borrow_mut();
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or_else(|| VmError::index_out_of_range(index, len))?;
            std::mem::replace(slot, item)
        };
        drop(previous);
        Ok(())
    }

    /// Adds an item to the end of the struct.
    pub fn add(&self, item: StackItem) {
        self.inner.borrow_mut().push(item);
    }

    /// Removes and returns the last item in the struct.
    pub fn pop(&self) -> VmResult<StackItem> {
        self.inner
            .borrow_mut()
            .pop()
            .ok_or_else(|| VmError::index_out_of_range(0, 0))
    }

    /// Removes exactly the element at `index`.
    pub fn remove_at(&self, index: usize) -> VmResult<StackItem> {
        let mut items = self.inner.borrow_mut();
        if index >= items.len() {
            return Err(VmError::index_out_of_range(index, items.len()));
        }
        Ok(items.remove(index))
    }

    /// Gets the number of items in the struct.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Same as [`Struct::len`].
    pub fn count(&self) -> usize {
        self.len()
    }

    /// Returns true if the struct is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Removes all items from the struct.
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

    /// Moves the children into `pending` if this is the last handle.
    pub(crate) fn detach_into(&self, pending: &mut Vec<StackItem>) {
        if Rc::strong_count(&self.inner) != 1 {
            return;
        }
        if let Ok(mut items) = self.inner.try_borrow_mut() {
            pending.append(&mut items);
        }
    }

    /// Deep-clones the struct with the default limits.
    pub fn deep_clone(&self) -> VmResult<Self> {
        self.clone_with_limits(&VmLimits::DEFAULT)
    }

    /// Deep-clones the struct.
    ///
    /// Nested structs are duplicated recursively. Arrays, maps and interop
    /// handles keep their identity and are shared with the original.
    /// Fails with [`VmError::DepthExceeded`] when a struct at depth
    /// `max_struct_depth` would be entered (the receiver is depth 0), and with
    /// [`VmError::ItemLimitExceeded`] after `max_clone_length` children.
    pub fn clone_with_limits(&self, limits: &VmLimits) -> VmResult<Self> {
        let mut visited = 0usize;
        self.clone_at_depth(0, limits, &mut visited)
    }

    fn clone_at_depth(
        &self,
        depth: usize,
        limits: &VmLimits,
        visited: &mut usize,
    ) -> VmResult<Self> {
        if depth >= limits.max_struct_depth {
            log::debug!("struct clone aborted at depth {depth}");
            return Err(VmError::DepthExceeded {
                limit: limits.max_struct_depth,
            });
        }

        let items = self.items();
        let mut cloned = Vec::with_capacity(items.len());
        for item in items {
            *visited += 1;
            if *visited > limits.max_clone_length {
                log::debug!("struct clone aborted after {} children", limits.max_clone_length);
                return Err(VmError::ItemLimitExceeded {
                    limit: limits.max_clone_length,
                });
            }

            cloned.push(match item {
                StackItem::Struct(inner) => {
                    StackItem::Struct(inner.clone_at_depth(depth + 1, limits, visited)?)
                }
                other => other,
            });
        }

        Ok(Self::new(cloned))
    }
}

impl Drop for Struct {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_into(&mut pending);
        if !pending.is_empty() {
            release_items(pending);
        }
    }
}

impl From<Vec<StackItem>> for Struct {
    fn from(items: Vec<StackItem>) -> Self {
        Self::new(items)
    }
}

impl fmt::Debug for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Struct");
        debug.field("id", &format_args!("{:#x}", self.id()));
        match self.inner.try_borrow() {
            Ok(items) => debug.field("len", &items.len()),
            Err(_) => debug.field("len", &"<borrowed>"),
        };
        debug.finish()
    }
}
