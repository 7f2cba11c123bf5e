//! Core reactive primitives for Lattice ARIA.
//!
//! This crate provides the state layer shared by the Lattice ARIA behaviors:
//!
//! - **Signal/Slot System**: ordered, synchronous, re-entrant notification
//! - **Stores**: writable values with change notification, following the
//!   subscribe/set/get contract of component frameworks
//! - **Logging**: `tracing` targets and helpers
//!
//! # Signal Example
//!
//! ```
//! use lattice_aria_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Store Example
//!
//! ```
//! use lattice_aria_core::Store;
//!
//! let query = Store::new(String::new());
//! let length = Store::new(0usize);
//!
//! let length_handle = length.clone();
//! query.subscribe(move |text: &String| {
//!     length_handle.set(text.len());
//! });
//!
//! query.set("ba".to_string());
//! assert_eq!(length.get(), 2);
//! ```

pub mod logging;
pub mod signal;
pub mod store;

pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use store::Store;
