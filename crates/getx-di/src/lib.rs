#![forbid(unsafe_code)]

//! Dependency injection for getx.
//!
//! # Role in getx
//! `getx-di` owns instance lifetimes. A [`Container`] is created by the
//! application and passed by reference; bindings attached to routes fill it
//! when a route becomes active, and the navigation layer releases
//! route-owned entries when the route leaves the page stack.
//!
//! # Primary responsibilities
//! - **Container**: instances, lazy singletons, and factories keyed by type
//!   plus optional tag, with a permanence flag.
//! - **Binding/BindingsBuilder**: route-entry registration hooks.
//! - **Controller**: `on_init`/`on_close` lifecycle for registered instances.

pub mod binding;
pub mod container;
pub mod error;

pub use binding::{Binding, BindingsBuilder};
pub use container::{Container, Controller, PutOptions};
pub use error::DiError;
