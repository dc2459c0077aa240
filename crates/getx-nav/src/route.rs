#![forbid(unsafe_code)]

//! Route tree: flattened page patterns and location matching.
//!
//! # Matching rules
//! - A pattern matches a location with the same number of segments.
//! - Literal segments compare exactly against the decoded segment.
//! - `:name` segments capture the decoded segment as a parameter.
//! - When several patterns match, the one whose first differing segment is
//!   literal wins; remaining ties go to the earlier registration.
//!
//! The branch of a match runs from the outermost ancestor page to the
//! matched page.

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::RouteError;
use crate::location::Location;
use crate::page::PageDescriptor;

/// Resolves locations to page branches.
pub trait RouteMatcher {
    fn match_route(&self, location: &Location) -> Option<RouteMatch>;
}

/// The result of matching a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub branch: Vec<Rc<PageDescriptor>>,
    /// Path parameters merged over query parameters.
    pub parameters: BTreeMap<String, String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };
        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        let mut seen = HashSet::new();
        let mut segments = Vec::new();
        for raw in pattern.split('/').filter(|s| !s.is_empty()) {
            if let Some(name) = raw.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("empty parameter name"));
                }
                if !seen.insert(name) {
                    return Err(invalid("repeated parameter name"));
                }
                segments.push(Segment::Param(name.to_string()));
            } else if raw.contains(['?', '#']) {
                return Err(invalid("query or fragment in pattern"));
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }
        Ok(Self { segments })
    }

    fn canonical(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for seg in &self.segments {
            out.push('/');
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Param(name) => {
                    out.push(':');
                    out.push_str(name);
                }
            }
        }
        out
    }

    /// Captured parameters if `segments` match, else `None`.
    fn captures(&self, segments: &[String]) -> Option<Vec<(String, String)>> {
        if segments.len() != self.segments.len() {
            return None;
        }
        let mut params = Vec::new();
        for (pat, seg) in self.segments.iter().zip(segments) {
            match pat {
                Segment::Literal(lit) if lit == seg => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.push((name.clone(), seg.clone())),
            }
        }
        Some(params)
    }

    fn specificity(&self) -> Vec<bool> {
        self.segments
            .iter()
            .map(|s| matches!(s, Segment::Literal(_)))
            .collect()
    }
}

#[derive(Debug)]
struct RouteEntry {
    pattern: RoutePattern,
    page: Rc<PageDescriptor>,
    parent: Option<usize>,
}

/// Flattened page tree.
#[derive(Debug, Default)]
pub struct RouteTree {
    entries: Vec<RouteEntry>,
}

impl RouteTree {
    /// Flatten `pages` and their children into absolute patterns.
    pub fn new(pages: impl IntoIterator<Item = PageDescriptor>) -> Result<Self, RouteError> {
        let mut tree = Self::default();
        let mut seen = HashSet::new();
        for page in pages {
            tree.insert(&page, "", None, &mut seen)?;
        }
        debug!(routes = tree.entries.len(), "route tree built");
        Ok(tree)
    }

    fn insert(
        &mut self,
        page: &PageDescriptor,
        prefix: &str,
        parent: Option<usize>,
        seen: &mut HashSet<String>,
    ) -> Result<(), RouteError> {
        let raw = page.name();
        if !raw.starts_with('/') {
            return Err(RouteError::InvalidPattern {
                pattern: raw.to_string(),
                reason: "must start with '/'",
            });
        }
        let pattern = RoutePattern::parse(&format!("{prefix}{raw}"))?;
        let full = pattern.canonical();
        if !seen.insert(full.clone()) {
            return Err(RouteError::DuplicateRoute(full));
        }
        let index = self.entries.len();
        self.entries.push(RouteEntry {
            pattern,
            page: Rc::new(page.with_name(full.clone())),
            parent,
        });
        let child_prefix = if full == "/" { String::new() } else { full };
        for child in page.children() {
            self.insert(child, &child_prefix, Some(index), seen)?;
        }
        Ok(())
    }

    /// All absolute patterns in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.page.name())
    }

    /// Look up a page by absolute pattern.
    #[must_use]
    pub fn page(&self, pattern: &str) -> Option<&Rc<PageDescriptor>> {
        self.entries
            .iter()
            .find(|e| e.page.name() == pattern)
            .map(|e| &e.page)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn branch_of(&self, mut index: usize) -> Vec<Rc<PageDescriptor>> {
        let mut branch = vec![Rc::clone(&self.entries[index].page)];
        while let Some(parent) = self.entries[index].parent {
            branch.push(Rc::clone(&self.entries[parent].page));
            index = parent;
        }
        branch.reverse();
        branch
    }
}

impl RouteMatcher for RouteTree {
    fn match_route(&self, location: &Location) -> Option<RouteMatch> {
        let mut best: Option<(usize, Vec<bool>, Vec<(String, String)>)> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            let Some(captured) = entry.pattern.captures(location.segments()) else {
                continue;
            };
            let rank = entry.pattern.specificity();
            if best.as_ref().is_none_or(|(_, r, _)| rank > *r) {
                best = Some((index, rank, captured));
            }
        }
        let Some((index, _, captured)) = best else {
            trace!(location = %location, "no route matched");
            return None;
        };
        let mut parameters: BTreeMap<String, String> = location
            .query()
            .iter()
            .rev()
            .cloned()
            .collect();
        parameters.extend(captured);
        Some(RouteMatch {
            branch: self.branch_of(index),
            parameters,
            location: location.clone(),
        })
    }
}
