//! Shared store handles and the per-thread default store
//!
//! Models bind to a store through a [`StoreHandle`]. A handle can be
//! passed explicitly, or installed as the current thread's default with
//! [`StoreHandle::make_current`]. The default is never set implicitly.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use super::errors::StoreResult;
use super::store::Store;

thread_local! {
    static CURRENT: RefCell<Option<StoreHandle>> = const { RefCell::new(None) };
}

/// Cheaply clonable, single-threaded handle to a [`Store`].
#[derive(Clone)]
pub struct StoreHandle {
    inner: Rc<RefCell<Store>>,
}

impl StoreHandle {
    /// Wraps an opened store.
    pub fn new(store: Store) -> Self {
        Self {
            inner: Rc::new(RefCell::new(store)),
        }
    }

    /// Opens the store at `path` and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Store::open(path).map(Self::new)
    }

    /// Immutably borrows the store.
    ///
    /// # Panics
    ///
    /// Panics if the store is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Store> {
        self.inner.borrow()
    }

    /// Mutably borrows the store.
    ///
    /// # Panics
    ///
    /// Panics if the store is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Store> {
        self.inner.borrow_mut()
    }

    /// Returns true if both handles point at the same store.
    pub fn ptr_eq(&self, other: &StoreHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Installs this handle as the current thread's default store.
    ///
    /// The previous default is restored when the returned guard drops.
    pub fn make_current(&self) -> CurrentStoreGuard {
        let previous = CURRENT.with(|current| current.replace(Some(self.clone())));
        CurrentStoreGuard { previous }
    }

    /// Returns the current thread's default store, if one is installed.
    pub fn current() -> Option<StoreHandle> {
        CURRENT.with(|current| current.borrow().clone())
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(store) => f.debug_tuple("StoreHandle").field(&store.path()).finish(),
            Err(_) => f.write_str("StoreHandle(<borrowed>)"),
        }
    }
}

impl From<Store> for StoreHandle {
    fn from(store: Store) -> Self {
        Self::new(store)
    }
}

/// Restores the previous default store on drop.
#[must_use = "the default store is uninstalled as soon as the guard drops"]
pub struct CurrentStoreGuard {
    previous: Option<StoreHandle>,
}

impl Drop for CurrentStoreGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}
