//! Array stack item implementation for the OnyxChain VM.
//!
//! An Array has reference semantics: cloning the handle aliases the same
//! storage, and two Arrays are equal only when they are the same instance.

use crate::error::{VmError, VmResult};
use crate::limits::RemoveAtMode;
use crate::stack_item::stack_item::release_items;
use crate::stack_item::StackItem;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Represents an array of stack items in the VM.
#[derive(Clone, Default)]
pub struct Array {
    inner: Rc<RefCell<Vec<StackItem>>>,
}

impl Array {
    /// Creates a new array with the specified items.
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

    /// Adds an item to the end of the array.
    pub fn add(&self, item: StackItem) {
        self.inner.borrow_mut().push(item);
    }

    /// Removes and returns the last item in the array.
    pub fn pop(&self) -> VmResult<StackItem> {
        self.inner
            .borrow_mut()
            .pop()
            .ok_or_else(|| VmError::index_out_of_range(0, 0))
    }

    /// Removes exactly the element at `index`, shifting later elements left.
    pub fn remove_at(&self, index: usize) -> VmResult<StackItem> {
        self.remove_at_with_mode(index, RemoveAtMode::Exact)
    }

    /// Removes an element using the given index semantics.
    ///
    /// [`RemoveAtMode::Legacy`] reproduces the historical engine, which
    /// removed the element before `index`; index 0 has no such element.
    pub fn remove_at_with_mode(&self, index: usize, mode: RemoveAtMode) -> VmResult<StackItem> {
        let mut items = self.inner.borrow_mut();
        let len = items.len();
        let position = match mode {
            RemoveAtMode::Exact => index,
            RemoveAtMode::Legacy => index
                .checked_sub(1)
                .ok_or_else(|| VmError::index_out_of_range(index, len))?,
        };

        if position >= len {
            return Err(VmError::index_out_of_range(index, len));
        }

        Ok(items.remove(position))
    }

    /// Gets the number of items in the array.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Same as [`Array::len`].
    pub fn count(&self) -> usize {
        self.len()
    }

    /// Returns true if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Removes all items from the array.
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
}

impl Drop for Array {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_into(&mut pending);
        if !pending.is_empty() {
            release_items(pending);
        }
    }
}

impl From<Vec<StackItem>> for Array {
    fn from(items: Vec<StackItem>) -> Self {
        Self::new(items)
    }
}

// Never walks children: an Array may contain itself.
impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Array");
        debug.field("id", &format_args!("{:#x}", self.id()));
        match self.inner.try_borrow() {
            Ok(items) => debug.field("len", &items.len()),
            Err(_) => debug.field("len", &"<borrowed>"),
        };
        debug.finish()
    }
}
