#![forbid(unsafe_code)]

//! Parsed navigation locations.
//!
//! A [`Location`] is `path[?query][#fragment]` with a normalized path:
//! a single leading `/`, no empty segments, no trailing slash. Segments,
//! query pairs and the fragment are stored percent-decoded; [`Display`]
//! re-encodes them, so `Location::parse(&loc.to_string()) == Ok(loc)`.
//!
//! [`Display`]: std::fmt::Display

use std::fmt;
use std::str::FromStr;

use crate::error::LocationError;

/// A normalized, decoded location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    segments: Vec<String>,
    query: Vec<(String, String)>,
    fragment: Option<String>,
}

impl Location {
    /// The root location `/`.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a location string.
    ///
    /// `+` in the query decodes to a space. Query keys without `=` get an
    /// empty value; empty `&&` pairs are skipped.
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(LocationError::Empty);
        }
        let (rest, fragment) = match input.split_once('#') {
            Some((rest, frag)) => (rest, Some(decode(frag, false)?)),
            None => (input, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        if !path.starts_with('/') {
            return Err(LocationError::NotAbsolute(input.to_string()));
        }
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| decode(s, false))
            .collect::<Result<Vec<_>, _>>()?;
        let mut pairs = Vec::new();
        for pair in query.unwrap_or_default().split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            pairs.push((decode(key, true)?, decode(value, true)?));
        }
        Ok(Self {
            segments,
            query: pairs,
            fragment,
        })
    }

    /// Decoded path segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Encoded, normalized path, always starting with `/`.
    #[must_use]
    pub fn path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for seg in &self.segments {
            out.push('/');
            encode_into(&mut out, seg, PATH_SAFE);
        }
        out
    }

    /// Decoded query pairs in their original order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value for `key`.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Append a query pair.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.path();
        for (i, (key, value)) in self.query.iter().enumerate() {
            out.push(if i == 0 { '?' } else { '&' });
            encode_into(&mut out, key, QUERY_SAFE);
            out.push('=');
            encode_into(&mut out, value, QUERY_SAFE);
        }
        if let Some(frag) = &self.fragment {
            out.push('#');
            encode_into(&mut out, frag, FRAGMENT_SAFE);
        }
        f.write_str(&out)
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Location {
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Location {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// Bytes left unescaped beyond ASCII alphanumerics and `-._~`.
const PATH_SAFE: &[u8] = b"!$&'()*,;=:@";
const QUERY_SAFE: &[u8] = b"!$'()*,;:@/?";
const FRAGMENT_SAFE: &[u8] = b"!$&'()*+,;=:@/?";

fn encode_into(out: &mut String, raw: &str, safe: &[u8]) {
    for &b in raw.as_bytes() {
        if b.is_ascii_alphanumeric() || b"-._~".contains(&b) || safe.contains(&b) {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
}

fn decode(raw: &str, plus_is_space: bool) -> Result<String, LocationError> {
    let invalid = || LocationError::InvalidEscape(raw.to_string());
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3).ok_or_else(invalid)?;
                let hex = std::str::from_utf8(hex).map_err(|_| invalid())?;
                let byte = u8::from_str_radix(hex, 16).map_err(|_| invalid())?;
                out.push(byte);
                i += 3;
            }
            b'+' if plus_is_space => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| invalid())
}
