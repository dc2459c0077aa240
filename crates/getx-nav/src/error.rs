#![forbid(unsafe_code)]

//! Errors from location parsing, route tree construction, and navigation.

/// A location string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// Nothing but whitespace.
    Empty,
    /// The path does not start with `/`.
    NotAbsolute(String),
    /// A `%` escape is truncated, not hex, or decodes to invalid UTF-8.
    InvalidEscape(String),
}

impl std::fmt::Display for LocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty location"),
            Self::NotAbsolute(loc) => write!(f, "location '{loc}' must start with '/'"),
            Self::InvalidEscape(part) => write!(f, "invalid percent escape in '{part}'"),
        }
    }
}

impl std::error::Error for LocationError {}

/// A route tree could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A page name is not a valid path pattern.
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },
    /// Two pages resolve to the same full pattern.
    DuplicateRoute(String),
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern '{pattern}': {reason}")
            }
            Self::DuplicateRoute(pattern) => write!(f, "duplicate route '{pattern}'"),
        }
    }
}

impl std::error::Error for RouteError {}

/// Navigation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    /// The requested location did not parse.
    Location(LocationError),
    /// No page matches the requested location.
    NoMatch(String),
    /// The navigation state was disposed.
    Disposed,
}

impl std::fmt::Display for NavError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Location(err) => write!(f, "bad location: {err}"),
            Self::NoMatch(loc) => write!(f, "no route matches '{loc}'"),
            Self::Disposed => write!(f, "navigation state already disposed"),
        }
    }
}

impl std::error::Error for NavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Location(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LocationError> for NavError {
    fn from(err: LocationError) -> Self {
        Self::Location(err)
    }
}
