//! Tidings Events - a synchronous publish/subscribe event emitter.
//!
//! This crate provides:
//! - [`EventEmitter`], which keeps named event channels of listeners
//! - Persistent (`on`) and one-shot (`once`) registration, deduplicated by
//!   listener identity
//! - Synchronous, in-order delivery on `emit`
//!
//! # Architecture
//!
//! Each event name maps to a channel: an ordered list of listener records.
//! Registration order is delivery order. A listener is a shared callable
//! ([`Listener`]) and two registrations of the same handle on one channel
//! collapse into one.
//!
//! Delivery is single-threaded and runs to completion on the calling thread.
//! A listener that returns an error stops delivery for that `emit` call and
//! the error is handed back to the caller.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use serde_json::json;
//! use tidings_events::{EventEmitter, Listener};
//!
//! # fn main() -> Result<(), tidings_events::EmitterError> {
//! let emitter: EventEmitter = EventEmitter::new();
//! let total = Rc::new(Cell::new(0_i64));
//!
//! let sink = Rc::clone(&total);
//! let add = Listener::from_fn(move |_, args: &[serde_json::Value]| {
//!     let sum: i64 = args.iter().filter_map(serde_json::Value::as_i64).sum();
//!     sink.set(sink.get().saturating_add(sum));
//! });
//!
//! emitter.on("add", add.clone())?.on("add", add)?;
//! emitter.emit("add", &[json!(1), json!(2)])?;
//!
//! // Registered once despite two `on` calls.
//! assert_eq!(total.get(), 3);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod emitter;
mod error;
mod listener;

pub use emitter::{EventEmitter, VERSION};
pub use error::{EmitterError, EmitterResult};
pub use listener::{Listener, ListenerError, ListenerId, ListenerResult, ListenerSpec};
