#![forbid(unsafe_code)]

//! Navigation configuration: the active page branch, its location, and an
//! optional caller-defined state payload.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use crate::location::Location;
use crate::page::PageDescriptor;
use crate::route::{RouteMatch, RouteMatcher};

/// An immutable navigation configuration.
///
/// `branch` runs from the outermost page to the current one. A config with
/// an empty branch has no current page.
#[derive(Debug, Clone, PartialEq)]
pub struct NavConfig<S = ()> {
    branch: Vec<Rc<PageDescriptor>>,
    location: Location,
    parameters: BTreeMap<String, String>,
    state: Option<S>,
}

/// Field replacements for [`NavConfig::copy_with`]. `None` keeps the
/// current value.
#[derive(Debug, Clone)]
pub struct NavConfigPatch<S = ()> {
    pub branch: Option<Vec<Rc<PageDescriptor>>>,
    pub location: Option<Location>,
    /// Replaces the whole parameter map, path parameters included.
    pub parameters: Option<BTreeMap<String, String>>,
    pub state: Option<S>,
}

impl<S> Default for NavConfigPatch<S> {
    fn default() -> Self {
        Self {
            branch: None,
            location: None,
            parameters: None,
            state: None,
        }
    }
}

impl<S> NavConfig<S> {
    /// Build a config from parts. Parameters come from the location's query.
    #[must_use]
    pub fn new(branch: Vec<Rc<PageDescriptor>>, location: Location, state: Option<S>) -> Self {
        let parameters = query_parameters(&location);
        Self {
            branch,
            location,
            parameters,
            state,
        }
    }

    /// Resolve `path` against `matcher`.
    ///
    /// Returns `None` when the path does not parse or nothing matches.
    pub fn from_route<M>(matcher: &M, path: &str) -> Option<Self>
    where
        M: RouteMatcher + ?Sized,
    {
        let location = match Location::parse(path) {
            Ok(location) => location,
            Err(err) => {
                debug!(path, error = %err, "unparseable route");
                return None;
            }
        };
        matcher.match_route(&location).map(Self::from_match)
    }

    #[must_use]
    pub fn from_match(m: RouteMatch) -> Self {
        Self {
            branch: m.branch,
            location: m.location,
            parameters: m.parameters,
            state: None,
        }
    }

    /// Attach a state payload.
    #[must_use]
    pub fn with_state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    /// Last page of the branch.
    #[must_use]
    pub fn current_page(&self) -> Option<&Rc<PageDescriptor>> {
        self.branch.last()
    }

    #[must_use]
    pub fn branch(&self) -> &[Rc<PageDescriptor>] {
        &self.branch
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Canonical location string.
    #[must_use]
    pub fn location_string(&self) -> String {
        self.location.to_string()
    }

    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    #[must_use]
    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }
}

impl<S: Clone> NavConfig<S> {
    /// Copy with the given fields replaced.
    ///
    /// Given `parameters` are used verbatim. Otherwise a replaced location
    /// without a replaced branch keeps the old path parameters and refreshes
    /// the query ones, and a replaced branch and location carries query
    /// parameters only. Use [`NavConfig::from_match`] or pass `parameters`
    /// to keep path parameters across a branch change.
    #[must_use]
    pub fn copy_with(&self, patch: NavConfigPatch<S>) -> Self {
        let parameters = match (patch.parameters, &patch.location) {
            (Some(parameters), _) => parameters,
            (None, Some(location)) => {
                let mut params = query_parameters(location);
                if patch.branch.is_none() {
                    let stale: Vec<&String> = self
                        .location
                        .query()
                        .iter()
                        .map(|(k, _)| k)
                        .collect();
                    for (k, v) in &self.parameters {
                        if !stale.contains(&k) {
                            params.insert(k.clone(), v.clone());
                        }
                    }
                }
                params
            }
            (None, None) => self.parameters.clone(),
        };
        Self {
            branch: patch.branch.unwrap_or_else(|| self.branch.clone()),
            location: patch.location.unwrap_or_else(|| self.location.clone()),
            parameters,
            state: patch.state.or_else(|| self.state.clone()),
        }
    }
}

fn query_parameters(location: &Location) -> BTreeMap<String, String> {
    location.query().iter().rev().cloned().collect()
}
