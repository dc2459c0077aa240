#![forbid(unsafe_code)]

//! getx: reactive state, dependency injection, and navigation state.
//!
//! This crate re-exports the three layers and adds logging setup:
//!
//! - [`reactive`]: observables, status cells, collections, workers.
//! - [`di`]: the instance container and route bindings.
//! - [`nav`]: locations, route trees, navigation configs.
//! - [`logging`]: install a `tracing` subscriber from a [`LogConfig`].
//!
//! Most applications only need the [`prelude`].

pub mod logging;
pub mod prelude;

pub use getx_di as di;
pub use getx_nav as nav;
pub use getx_reactive as reactive;

pub use logging::{LogConfig, LogInitError, init_logging};
