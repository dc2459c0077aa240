#![forbid(unsafe_code)]

//! Reactive state for getx.
//!
//! # Role in getx
//! `getx-reactive` is the observer core. Everything that can change and be
//! watched lives here; dependency injection (`getx-di`) and navigation
//! (`getx-nav`) build on it.
//!
//! # Primary responsibilities
//! - **ListenerRegistry**: ordered, weakly-held callbacks with RAII guards.
//! - **Observable**: equality-gated value cell with a stream bridge.
//! - **Tracking/Observer**: automatic dependency capture and rebuild.
//! - **StateCell/Status**: loading/success/error/empty/custom state machine
//!   with an async producer driver.
//! - **RxList/RxMap**: collections that notify on every mutation.
//! - **Workers**: `ever`, `once`, `ever_all`.
//!
//! # Threading
//! Everything is single-threaded (`Rc`/`RefCell`) and notification is
//! synchronous: a listener has run by the time the mutating call returns.
//! There is no batching; N mutations produce N notifications.

pub mod condition;
pub mod error;
pub mod listenable;
pub mod listeners;
pub mod observable;
pub mod rx_list;
pub mod rx_map;
pub mod state;
pub mod status;
pub mod stream;
pub mod tracking;
pub mod workers;

pub use condition::Condition;
pub use error::ReactiveError;
pub use listenable::{Listenable, SourceId};
pub use listeners::{ListenerRegistry, Subscription};
pub use observable::Observable;
pub use rx_list::RxList;
pub use rx_map::RxMap;
pub use state::{AsyncOptions, StateCell};
pub use status::{IsEmpty, Status, StatusError};
pub use stream::ValueStream;
pub use tracking::{Dependencies, Observer, track, untracked};
pub use workers::{Worker, ever, ever_all, once};
