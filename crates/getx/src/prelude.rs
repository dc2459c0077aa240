//! Common imports.

pub use getx_di::{Binding, BindingsBuilder, Container, Controller, DiError, PutOptions};
pub use getx_nav::{
    Location, NavConfig, NavConfigPatch, NavError, NavState, PageDescriptor, RouteMatcher,
    RouteTree,
};
pub use getx_reactive::{
    AsyncOptions, Condition, IsEmpty, Listenable, Observable, Observer, RxList, RxMap,
    StateCell, Status, StatusError, Subscription, Worker, ever, ever_all, once,
};
