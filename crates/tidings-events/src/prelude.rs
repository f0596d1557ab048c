//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tidings_events::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use tidings_events::prelude::*;
//!
//! # fn main() -> EmitterResult<()> {
//! let emitter: EventEmitter = EventEmitter::new();
//!
//! emitter.once("ready", Listener::from_fn(|_, _| {}))?;
//! emitter.emit_empty("ready")?;
//!
//! assert!(!emitter.has_listeners("ready"));
//! # Ok(())
//! # }
//! ```

// Emitter
pub use crate::{EventEmitter, VERSION};

// Errors
pub use crate::{EmitterError, EmitterResult};

// Listeners
pub use crate::{Listener, ListenerError, ListenerId, ListenerResult, ListenerSpec};
