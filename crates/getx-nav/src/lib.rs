#![forbid(unsafe_code)]

//! Navigation for getx.
//!
//! # Role in getx
//! `getx-nav` turns location strings into page branches and keeps the
//! active branch observable. It depends on `getx-reactive` for the
//! observable core and on `getx-di` to run page bindings and release
//! route-owned instances.
//!
//! # Primary responsibilities
//! - **Location**: parse and serialize `path[?query][#fragment]`.
//! - **RouteTree/RouteMatcher**: flatten nested pages and match locations.
//! - **NavConfig**: immutable branch + location + optional state payload.
//! - **NavState**: the observable active config.

pub mod config;
pub mod error;
pub mod location;
pub mod page;
pub mod route;
pub mod state;

pub use config::{NavConfig, NavConfigPatch};
pub use error::{LocationError, NavError, RouteError};
pub use location::Location;
pub use page::PageDescriptor;
pub use route::{RouteMatch, RouteMatcher, RouteTree};
pub use state::NavState;
