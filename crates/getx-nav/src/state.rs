#![forbid(unsafe_code)]

//! Reactive navigation state.
//!
//! [`NavState`] owns the active [`NavConfig`] in an [`Observable`] and keeps
//! the dependency [`Container`] in step with the active branch:
//!
//! 1. Pages that left the branch release their route-owned entries.
//! 2. Pages that entered the branch run their bindings, outermost first.
//! 3. The new config is stored and listeners are notified.
//!
//! Replacing the config always notifies, even with an identical config.
//! Pages are identified by their absolute pattern, so `/users/1` to
//! `/users/2` keeps the `/users/:id` bindings alive.

use std::rc::Rc;

use getx_di::Container;
use getx_reactive::{Listenable, Observable, SourceId, Subscription};
use tracing::{debug, info_span};

use crate::config::NavConfig;
use crate::error::NavError;
use crate::location::Location;
use crate::page::PageDescriptor;
use crate::route::{RouteMatcher, RouteTree};

/// The active navigation configuration, observable.
pub struct NavState<S: Clone + 'static = ()> {
    routes: Rc<dyn RouteMatcher>,
    container: Rc<Container>,
    current: Observable<Option<NavConfig<S>>>,
}

impl<S: Clone + 'static> NavState<S> {
    /// Navigation over `tree` with no active config.
    #[must_use]
    pub fn new(tree: RouteTree, container: Rc<Container>) -> Self {
        Self::with_matcher(Rc::new(tree), container)
    }

    #[must_use]
    pub fn with_matcher(routes: Rc<dyn RouteMatcher>, container: Rc<Container>) -> Self {
        Self {
            routes,
            container,
            current: Observable::new(None),
        }
    }

    /// Navigate to `path`.
    pub fn to_named(&self, path: &str) -> Result<NavConfig<S>, NavError> {
        self.navigate(path, None)
    }

    /// Navigate to `path` carrying `state`.
    pub fn to_named_with_state(&self, path: &str, state: S) -> Result<NavConfig<S>, NavError> {
        self.navigate(path, Some(state))
    }

    fn navigate(&self, path: &str, state: Option<S>) -> Result<NavConfig<S>, NavError> {
        let location = Location::parse(path)?;
        let matched = self
            .routes
            .match_route(&location)
            .ok_or_else(|| NavError::NoMatch(location.to_string()))?;
        let mut config = NavConfig::from_match(matched);
        if let Some(state) = state {
            config = config.with_state(state);
        }
        self.set_config(config.clone())?;
        Ok(config)
    }

    /// Make `config` active.
    pub fn set_config(&self, config: NavConfig<S>) -> Result<(), NavError> {
        if self.current.is_disposed() {
            return Err(NavError::Disposed);
        }
        let _span = info_span!("navigate", location = %config.location()).entered();
        let previous: Vec<Rc<PageDescriptor>> = self
            .current
            .peek()
            .map(|c| c.branch().to_vec())
            .unwrap_or_default();

        for page in previous.iter().rev() {
            if !contains(config.branch(), page) {
                let released = self.container.release_route(page.name());
                debug!(route = page.name(), released, "page left");
            }
        }
        for page in config.branch() {
            if !contains(&previous, page) {
                for binding in page.bindings() {
                    self.container.run_binding(page.name(), binding.as_ref());
                }
                debug!(route = page.name(), "page entered");
            }
        }
        self.current.replace(Some(config));
        Ok(())
    }

    /// Active config, tracked.
    #[must_use]
    pub fn current(&self) -> Option<NavConfig<S>> {
        self.current.get()
    }

    /// Current page of the active config, tracked.
    #[must_use]
    pub fn current_page(&self) -> Option<Rc<PageDescriptor>> {
        self.current
            .with(|c| c.as_ref().and_then(|c| c.current_page().cloned()))
    }

    /// Canonical location of the active config, tracked.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        self.current
            .with(|c| c.as_ref().map(NavConfig::location_string))
    }

    /// Listen for config changes.
    pub fn listen(&self, callback: impl Fn(Option<&NavConfig<S>>) + 'static) -> Subscription {
        self.current.listen(move |c| callback(c.as_ref()))
    }

    #[must_use]
    pub fn container(&self) -> &Rc<Container> {
        &self.container
    }

    /// Release every active page's entries and stop notifying.
    pub fn dispose(&self) {
        if self.current.is_disposed() {
            return;
        }
        let branch = self
            .current
            .peek()
            .map(|c| c.branch().to_vec())
            .unwrap_or_default();
        for page in branch.iter().rev() {
            self.container.release_route(page.name());
        }
        self.current.dispose();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.current.is_disposed()
    }
}

impl<S: Clone + 'static> Listenable for NavState<S> {
    fn listen_change(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.current.listen_change(callback)
    }

    fn source_id(&self) -> SourceId {
        self.current.source_id()
    }

    fn is_disposed(&self) -> bool {
        self.current.is_disposed()
    }
}

fn contains(branch: &[Rc<PageDescriptor>], page: &PageDescriptor) -> bool {
    branch.iter().any(|p| p.name() == page.name())
}
