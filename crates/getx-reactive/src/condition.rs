#![forbid(unsafe_code)]

//! Conditions for the conditional-add helpers: a plain `bool` or a closure
//! producing one.

/// Something that evaluates to a `bool` exactly once.
pub trait Condition {
    fn evaluate(self) -> bool;
}

impl Condition for bool {
    fn evaluate(self) -> bool {
        self
    }
}

impl<F: FnOnce() -> bool> Condition for F {
    fn evaluate(self) -> bool {
        self()
    }
}
