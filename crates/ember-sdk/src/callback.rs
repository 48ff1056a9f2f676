//! Callback capability stored in the registries.

use std::fmt;
use std::rc::Rc;

/// A handler invoked when its timer or GPIO key fires.
///
/// Handlers take no arguments: a GPIO handler that needs the triggering pin
/// level reads it back from the device itself. Cloning is cheap and shares the
/// underlying closure.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn()>);

impl Callback {
    /// Wrap a closure or function.
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Bind an opaque context value that is passed to `f` on every invocation.
    pub fn with_context<T: 'static>(context: T, f: fn(&T)) -> Self {
        Self(Rc::new(move || f(&context)))
    }

    /// Adopt a nullable C function pointer. `None` stays absent so the
    /// registries can reject it.
    #[must_use]
    pub fn from_raw(f: Option<extern "C" fn()>) -> Option<Self> {
        f.map(|f| Self::new(move || f()))
    }

    /// Run the handler.
    pub fn invoke(&self) {
        (self.0)();
    }

    /// Whether two handles share the same closure.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<F: Fn() + 'static> From<F> for Callback {
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&Rc::as_ptr(&self.0)).finish()
    }
}
