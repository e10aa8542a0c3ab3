//! Request-scoped context carrying a logger
//!
//! [`RequestContext`] is an immutable, parent-linked value bag. Handlers pass
//! it down a call chain; [`attach`] stores a logger in it and [`retrieve`]
//! gets it back, falling back to a no-op logger.

use super::logger::Logger;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

struct Entry {
    parent: Option<Arc<Entry>>,
    key: TypeId,
    value: Arc<dyn Any + Send + Sync>,
}

/// Immutable request context. Cloning is cheap; adding a value returns a new
/// context and leaves the receiver untouched.
#[derive(Clone, Default)]
pub struct RequestContext {
    head: Option<Arc<Entry>>,
}

impl RequestContext {
    /// Empty root context
    pub fn background() -> Self {
        Self::default()
    }

    /// New context carrying `value` under its type. Shadows any outer value
    /// of the same type.
    #[must_use]
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(Entry {
                parent: self.head.clone(),
                key: TypeId::of::<T>(),
                value: Arc::new(value),
            })),
        }
    }

    /// Innermost value of type `T`
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        let key = TypeId::of::<T>();
        let mut cur = self.head.as_deref();
        while let Some(entry) = cur {
            if entry.key == key {
                return entry.value.downcast_ref::<T>();
            }
            cur = entry.parent.as_deref();
        }
        None
    }

    /// Whether both handles are the same context value
    #[must_use]
    pub fn ptr_eq(&self, other: &RequestContext) -> bool {
        match (&self.head, &other.head) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// See [`attach`]
    #[must_use]
    pub fn with_logger(&self, logger: &Logger) -> Self {
        attach(self, Some(logger))
    }

    /// See [`retrieve`]
    pub fn logger(&self) -> Logger {
        retrieve(self)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0;
        let mut cur = self.head.as_deref();
        while let Some(entry) = cur {
            depth += 1;
            cur = entry.parent.as_deref();
        }
        f.debug_struct("RequestContext")
            .field("values", &depth)
            .finish()
    }
}

/// Private key type; no other module can name it, so no other value can
/// collide with the stored logger.
struct LoggerKey(Logger);

/// Store `logger` in a new context derived from `ctx`.
///
/// Returns `ctx` unchanged when `logger` is `None`, or when `ctx` already
/// carries a logger equal to the family's current logger. A stored no-op
/// logger is never current and is always replaced.
#[must_use]
pub fn attach(ctx: &RequestContext, logger: Option<&Logger>) -> RequestContext {
    let Some(logger) = logger else {
        return ctx.clone();
    };

    if let Some(LoggerKey(stored)) = ctx.value::<LoggerKey>() {
        if !stored.is_nop() && *stored == stored.current() {
            return ctx.clone();
        }
    }

    ctx.with_value(LoggerKey(logger.clone()))
}

/// Logger carried by `ctx`, or a no-op logger.
///
/// The stored logger wins over the family's current logger; when the two are
/// equal the current one is returned.
pub fn retrieve(ctx: &RequestContext) -> Logger {
    match ctx.value::<LoggerKey>() {
        Some(LoggerKey(stored)) => {
            let current = stored.current();
            if current == *stored {
                current
            } else {
                stored.clone()
            }
        }
        None => Logger::nop(),
    }
}
