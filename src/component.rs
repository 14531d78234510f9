use http::Extensions;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Long-lived state shared by every handler, filter and task handler of a router.
///
/// It is handed to the `init` hook of each registered component before the router starts serving
/// and is attached to every request, where handlers read it with
/// [`RequestExt::data`](./ext/trait.RequestExt.html#tymethod.data). Values are keyed by their type.
/// Cloning is cheap.
#[derive(Clone, Default)]
pub struct Environment {
    data: Arc<Extensions>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    /// Returns the value of type `T`, if one was stored.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.data.get::<T>()
    }

    /// Stores `value`, replacing any previous value of the same type.
    ///
    /// Only effective during the registration phase; once the environment is shared the value is
    /// copied on write and the existing clones keep the old data.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        Arc::make_mut(&mut self.data).insert(value);
    }

    pub(crate) fn extend(&mut self, other: &Environment) {
        Arc::make_mut(&mut self.data).extend(other.data.as_ref().clone());
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment").field("len", &self.data.len()).finish()
    }
}
