#![forbid(unsafe_code)]

//! Status tags for asynchronous or derived values.
//!
//! # Invariants
//!
//! 1. `Success` always carries a payload; no other variant does.
//! 2. Equality is structural, except for [`StatusError`], which compares by
//!    identity: two independent failures are never the same status even if
//!    their messages match.
//! 3. Emptiness is a compile-time capability ([`IsEmpty`]), not a runtime
//!    type inspection.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::error::Error;
use std::fmt;
use std::rc::Rc;

/// Tagged state of a value: loading, success, error, empty, or custom.
#[derive(Debug, Clone, PartialEq)]
pub enum Status<T> {
    /// A producer is running; any previous value is stale.
    Loading,
    /// The value is present.
    Success(T),
    /// The producer failed.
    Error(StatusError),
    /// The producer succeeded with nothing to show.
    Empty,
    /// Application-defined state with a label.
    Custom(String),
}

impl<T> Default for Status<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> Status<T> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Payload of a `Success`.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Cause of an `Error`.
    #[must_use]
    pub fn error(&self) -> Option<&StatusError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Short name of the variant, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
            Self::Empty => "empty",
            Self::Custom(_) => "custom",
        }
    }
}

struct ErrorInner {
    message: String,
    cause: Option<Box<dyn Error + 'static>>,
}

/// Cause carried by [`Status::Error`].
///
/// Cheap to clone. Clones are equal to each other; independently created
/// errors are not.
#[derive(Clone)]
pub struct StatusError {
    inner: Rc<ErrorInner>,
}

impl StatusError {
    /// Wrap an error, keeping it as the `source()`.
    pub fn new(cause: impl Error + 'static) -> Self {
        Self {
            inner: Rc::new(ErrorInner {
                message: cause.to_string(),
                cause: Some(Box::new(cause)),
            }),
        }
    }

    /// Wrap an error under a caller-chosen message.
    pub fn with_message(message: impl Into<String>, cause: impl Error + 'static) -> Self {
        Self {
            inner: Rc::new(ErrorInner {
                message: message.into(),
                cause: Some(Box::new(cause)),
            }),
        }
    }

    /// An error with a message and no underlying cause.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ErrorInner {
                message: message.into(),
                cause: None,
            }),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// The wrapped original error, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.cause.as_deref()
    }

    /// Downcast the original error.
    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.cause().and_then(|c| c.downcast_ref::<E>())
    }
}

impl PartialEq for StatusError {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusError")
            .field("message", &self.inner.message)
            .field("has_cause", &self.inner.cause.is_some())
            .finish()
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.message)
    }
}

impl Error for StatusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause()
    }
}

/// Capability to report emptiness, used by empty detection in
/// `StateCell::run_async`.
pub trait IsEmpty {
    fn is_empty_value(&self) -> bool;
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for str {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for [T] {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for VecDeque<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> IsEmpty for HashMap<K, V, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsEmpty for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T, S> IsEmpty for HashSet<T, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for BTreeSet<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: IsEmpty + ?Sized> IsEmpty for Rc<T> {
    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl Error for Boom {}

    #[test]
    fn predicates_and_accessors() {
        let s: Status<i32> = Status::Success(3);
        assert!(s.is_success());
        assert_eq!(s.data(), Some(&3));
        assert!(s.error().is_none());
        assert_eq!(s.kind(), "success");

        let e: Status<i32> = Status::Error(StatusError::new(Boom));
        assert!(e.is_error());
        assert_eq!(e.error().map(StatusError::message), Some("boom"));
        assert!(e.data().is_none());

        assert!(Status::<i32>::default().is_loading());
        assert!(Status::<i32>::Empty.is_empty());
        assert!(Status::<i32>::Custom("paused".into()).is_custom());
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Status::Success(vec![1]), Status::Success(vec![1]));
        assert_ne!(Status::Success(1), Status::Success(2));
        assert_eq!(Status::<u8>::Custom("a".into()), Status::Custom("a".into()));
    }

    #[test]
    fn errors_compare_by_identity() {
        let a = StatusError::msg("x");
        let b = StatusError::msg("x");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn cause_is_preserved() {
        let err = StatusError::with_message("load failed", Boom);
        assert_eq!(err.to_string(), "load failed");
        assert!(err.downcast_ref::<Boom>().is_some());
        assert!(err.source().is_some());
        assert!(StatusError::msg("plain").source().is_none());
    }

    #[test]
    fn emptiness_per_type() {
        assert!(String::new().is_empty_value());
        assert!(!"x".is_empty_value());
        assert!(Vec::<u8>::new().is_empty_value());
        assert!(HashMap::<u8, u8>::new().is_empty_value());
        assert!(BTreeSet::<u8>::new().is_empty_value());
        assert!(None::<u8>.is_empty_value());
        assert!(!Some(0).is_empty_value());
        assert!(!Rc::new(vec![0u8]).is_empty_value());
    }
}
