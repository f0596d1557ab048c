//! Listener handles and registration specs.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::emitter::EventEmitter;
use crate::error::{EmitterError, EmitterResult};

/// Error a listener may return to abort delivery.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by listener callbacks.
pub type ListenerResult = Result<(), ListenerError>;

type Callback<A> = dyn Fn(&EventEmitter<A>, &[A]) -> ListenerResult;

/// Identity of a listener, derived from the address of its shared callable.
///
/// Only meaningful while the listener is alive. Used for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A shared, cheaply clonable callback.
///
/// Clones of a `Listener` share the same callable and compare equal. This
/// identity is what the emitter uses to deduplicate registrations and to
/// find the record to remove in `off`. Two listeners built from separate
/// `Listener::new` calls are always distinct, even when built from the same
/// closure type.
pub struct Listener<A = Value> {
    callback: Rc<Callback<A>>,
}

impl<A> Listener<A> {
    /// Wrap a fallible callback.
    ///
    /// The callback receives the emitter performing the delivery and the
    /// arguments passed to `emit`.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&EventEmitter<A>, &[A]) -> ListenerResult + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Wrap a callback that cannot fail.
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(&EventEmitter<A>, &[A]) + 'static,
    {
        Self::new(move |emitter, args| {
            callback(emitter, args);
            Ok(())
        })
    }

    /// Invoke the callback.
    ///
    /// # Errors
    ///
    /// Returns whatever error the callback returns.
    pub fn call(&self, emitter: &EventEmitter<A>, args: &[A]) -> ListenerResult {
        (self.callback)(emitter, args)
    }

    /// Returns `true` if both handles share the same callable.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.callback), Rc::as_ptr(&other.callback))
    }

    /// Identity of this listener.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        ListenerId(Rc::as_ptr(&self.callback).cast::<()>().addr())
    }
}

impl<A> Clone for Listener<A> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<A> PartialEq for Listener<A> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<A> Eq for Listener<A> {}

impl<A> fmt::Debug for Listener<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id()).finish()
    }
}

/// What can be handed to `on`/`once`.
///
/// A spec is resolved once, at registration time, into a callable plus a
/// one-shot flag. Tagged specs may nest; the outermost `once` flag wins.
pub enum ListenerSpec<A = Value> {
    /// Nothing to register. Registration is skipped.
    Empty,
    /// A plain callable.
    Direct(Listener<A>),
    /// A callable carrying a one-shot flag.
    Tagged {
        /// The wrapped spec.
        listener: Box<ListenerSpec<A>>,
        /// Whether the listener is removed after its first invocation.
        once: bool,
    },
    /// An untyped value that must downcast to a [`Listener`] or a
    /// [`ListenerSpec`] to be accepted.
    Dynamic(Box<dyn Any>),
}

impl<A: 'static> ListenerSpec<A> {
    /// Wrap a spec with a one-shot flag.
    pub fn tagged(listener: impl Into<Self>, once: bool) -> Self {
        Self::Tagged {
            listener: Box::new(listener.into()),
            once,
        }
    }

    /// Resolve this spec into a listener and its one-shot flag.
    ///
    /// Returns `Ok(None)` for a top-level [`ListenerSpec::Empty`].
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidListener`] when a dynamic value is
    /// neither a listener nor a spec, or when a tag wraps nothing.
    pub fn resolve(self) -> EmitterResult<Option<(Listener<A>, bool)>> {
        let mut once = None;
        let mut current = self;

        loop {
            current = match current {
                Self::Empty if once.is_some() => return Err(EmitterError::InvalidListener),
                Self::Empty => return Ok(None),
                Self::Direct(listener) => return Ok(Some((listener, once.unwrap_or(false)))),
                Self::Tagged { listener, once: flag } => {
                    if once.is_none() {
                        once = Some(flag);
                    }
                    *listener
                },
                Self::Dynamic(value) => Self::from_dynamic(value)?,
            };
        }
    }

    fn from_dynamic(value: Box<dyn Any>) -> EmitterResult<Self> {
        let value = match value.downcast::<Listener<A>>() {
            Ok(listener) => return Ok(Self::Direct(*listener)),
            Err(value) => value,
        };

        value
            .downcast::<Self>()
            .map(|spec| *spec)
            .map_err(|_| EmitterError::InvalidListener)
    }
}

impl<A> From<Listener<A>> for ListenerSpec<A> {
    fn from(listener: Listener<A>) -> Self {
        Self::Direct(listener)
    }
}

impl<A> From<&Listener<A>> for ListenerSpec<A> {
    fn from(listener: &Listener<A>) -> Self {
        Self::Direct(listener.clone())
    }
}

impl<A> From<Option<Listener<A>>> for ListenerSpec<A> {
    fn from(listener: Option<Listener<A>>) -> Self {
        listener.map_or(Self::Empty, Self::Direct)
    }
}

impl<A> From<Box<dyn Any>> for ListenerSpec<A> {
    fn from(value: Box<dyn Any>) -> Self {
        Self::Dynamic(value)
    }
}

impl<A> fmt::Debug for ListenerSpec<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Direct(listener) => f.debug_tuple("Direct").field(listener).finish(),
            Self::Tagged { listener, once } => f
                .debug_struct("Tagged")
                .field("listener", listener)
                .field("once", once)
                .finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}
