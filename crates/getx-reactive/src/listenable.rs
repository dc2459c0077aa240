#![forbid(unsafe_code)]

//! The seam shared by every reactive container.
//!
//! Read tracking and workers only need to know three things about a source:
//! how to be told that it changed, whether it is still alive, and a stable
//! identity to deduplicate repeated reads.

use std::rc::Rc;

use crate::listeners::Subscription;

/// Stable identity of a reactive source (address of its shared state).
pub type SourceId = usize;

/// A reactive source that can report changes without exposing its value.
pub trait Listenable {
    /// Register a value-agnostic change callback.
    ///
    /// Disposed sources hand back an inert subscription.
    fn listen_change(&self, callback: Rc<dyn Fn()>) -> Subscription;

    /// Identity shared by every handle to the same underlying state.
    fn source_id(&self) -> SourceId;

    /// Whether the source was disposed.
    fn is_disposed(&self) -> bool;
}

/// Derive a [`SourceId`] from shared state.
pub(crate) fn source_id_of<S>(shared: &Rc<S>) -> SourceId {
    Rc::as_ptr(shared).cast::<()>() as usize
}
