//! Host values exposed to scripts

use std::any::Any;
use std::cell::RefCell;
use std::fmt;

use crate::types::TypeRef;

/// A host value carried inside the object graph
///
/// Scripts reach the value only through native methods registered on its
/// type.
pub struct WrappedValue {
    type_ref: TypeRef,
    inner: RefCell<Box<dyn Any>>,
}

impl WrappedValue {
    /// Wrap `inner` as an instance of `type_ref`
    pub fn new<T: Any>(type_ref: TypeRef, inner: T) -> Self {
        Self {
            type_ref,
            inner: RefCell::new(Box::new(inner)),
        }
    }

    /// The wrapped value's type
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Whether the host value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.inner.borrow().is::<T>()
    }

    /// Run `f` on a shared borrow of the host value, if it is a `T`
    pub fn with_ref<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let inner = self.inner.borrow();
        inner.downcast_ref::<T>().map(f)
    }

    /// Run `f` on a mutable borrow of the host value, if it is a `T`
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut inner = self.inner.borrow_mut();
        inner.downcast_mut::<T>().map(f)
    }
}

impl fmt::Debug for WrappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedValue")
            .field("type", &self.type_ref.name())
            .finish()
    }
}
