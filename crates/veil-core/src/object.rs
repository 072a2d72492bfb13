//! Uniform identify/destroy contract for every created object.
//!
//! Each facade type implements [`CryptoObject`] and reports a class tag that
//! is constant and unique per concrete type. Type-erased objects travel as a
//! [`Handle`]; getting the concrete type back goes through `Any`, so a
//! handle of the wrong type is rejected by the compiler-generated type id
//! rather than by comparing tags.
//!
//! Destruction is ownership: dropping an object releases what it owns and
//! then drops the backend it wraps. Destroying twice or using an object after
//! destroy cannot be expressed.

use std::any::{Any, type_name};
use std::fmt;

use crate::error::{CryptoError, CryptoResult};

/// Base contract of every object handed out by a facade constructor.
pub trait CryptoObject: Any + Send {
    /// Process-wide constant tag naming the concrete type.
    fn class(&self) -> &'static str;
}

/// Implement [`CryptoObject`] for a type with the given class tag.
#[macro_export]
macro_rules! crypto_object {
    ($ty:ty, $class:literal) => {
        impl $crate::object::CryptoObject for $ty {
            fn class(&self) -> &'static str {
                $class
            }
        }
    };
}

/// A type-erased, exclusively owned crypto object.
pub struct Handle(Box<dyn CryptoObject>);

impl Handle {
    /// Erase a concrete object into a handle.
    pub fn new<T: CryptoObject>(object: T) -> Self {
        Self(Box::new(object))
    }

    /// Class tag of the wrapped object.
    #[must_use]
    pub fn class(&self) -> &'static str {
        self.0.class()
    }

    /// Whether the handle wraps a `T`.
    #[must_use]
    pub fn is<T: CryptoObject>(&self) -> bool {
        let any: &dyn Any = &*self.0;
        any.is::<T>()
    }

    /// Borrow the wrapped object as a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the handle wraps another type.
    pub fn downcast_ref<T: CryptoObject>(&self) -> CryptoResult<&T> {
        let class = self.class();
        let any: &dyn Any = &*self.0;
        any.downcast_ref::<T>()
            .ok_or_else(|| mismatch::<T>(class))
    }

    /// Mutably borrow the wrapped object as a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the handle wraps another type.
    pub fn downcast_mut<T: CryptoObject>(&mut self) -> CryptoResult<&mut T> {
        let class = self.class();
        let any: &mut dyn Any = &mut *self.0;
        any.downcast_mut::<T>()
            .ok_or_else(|| mismatch::<T>(class))
    }

    /// Recover the concrete object. A handle of another type is consumed
    /// and its object released.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the handle wraps another type.
    pub fn into_inner<T: CryptoObject>(self) -> CryptoResult<T> {
        let class = self.class();
        let any: Box<dyn Any> = self.0;
        any.downcast::<T>()
            .map(|object| *object)
            .map_err(|_| mismatch::<T>(class))
    }

    /// Release the object and everything it owns.
    pub fn destroy(self) {
        drop(self);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.class()).finish()
    }
}

fn mismatch<T>(actual: &str) -> CryptoError {
    CryptoError::InvalidParams(format!(
        "handle holds a {actual}, expected {}",
        type_name::<T>()
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug)]
    struct Backend {
        drops: Arc<AtomicUsize>,
    }

    impl Drop for Backend {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug)]
    struct Facade {
        _backend: Backend,
        drops: Arc<AtomicUsize>,
    }

    impl Drop for Facade {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug)]
    struct Other;

    crypto_object!(Facade, "Facade");
    crypto_object!(Other, "Other");

    fn facade(drops: &Arc<AtomicUsize>) -> Facade {
        Facade {
            _backend: Backend {
                drops: Arc::clone(drops),
            },
            drops: Arc::clone(drops),
        }
    }

    #[test]
    fn test_handle_reports_class() {
        let handle = Handle::new(Other);
        assert_eq!(handle.class(), "Other");
        assert!(handle.is::<Other>());
        assert!(!handle.is::<Facade>());
    }

    #[test]
    fn test_downcast_mismatch_is_invalid_params() {
        let handle = Handle::new(Other);
        let err = handle.downcast_ref::<Facade>().unwrap_err();
        assert!(matches!(err, CryptoError::InvalidParams(_)));
    }

    #[test]
    fn test_into_inner_mismatch_is_invalid_params() {
        let drops = Arc::new(AtomicUsize::new(0));
        let err = Handle::new(facade(&drops))
            .into_inner::<Other>()
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidParams(_)));
        assert_eq!(drops.load(Ordering::SeqCst), 2);

        assert!(Handle::new(Other).into_inner::<Other>().is_ok());
    }

    #[test]
    fn test_destroy_releases_whole_chain_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let handle = Handle::new(facade(&drops));
        assert!(handle.downcast_ref::<Facade>().is_ok());
        handle.destroy();
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }
}
