//! Host object handles.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A host-side object that can be wrapped by a stack item.
pub trait InteropInterface: fmt::Debug {
    /// Gets the type name of the interop interface.
    fn interface_type(&self) -> &str;

    /// Allows downcasting to concrete types.
    fn as_any(&self) -> &dyn Any;
}

/// An opaque reference to a host object. Clones share the same object.
#[derive(Clone)]
pub struct InteropHandle {
    inner: Rc<dyn InteropInterface>,
}

impl InteropHandle {
    /// Wraps a host object.
    pub fn new<T: InteropInterface + 'static>(value: T) -> Self {
        Self {
            inner: Rc::new(value),
        }
    }

    /// Wraps a host object the host keeps a reference to.
    pub fn from_rc(inner: Rc<dyn InteropInterface>) -> Self {
        Self { inner }
    }

    /// Returns the host object.
    pub fn interface(&self) -> &dyn InteropInterface {
        self.inner.as_ref()
    }

    /// Downcasts the host object.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Host identity: true iff both handles point at the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.inner) as *const (),
            Rc::as_ptr(&other.inner) as *const (),
        )
    }
}

impl fmt::Debug for InteropHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interop({})", self.inner.interface_type())
    }
}
