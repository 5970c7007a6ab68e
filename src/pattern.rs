//! Path patterns.
//!
//! A [`PathPattern`] is compiled from a string such as `/user/:userId/post/:postId?tab`. Path
//! segments are either static text, a `:name` parameter matching exactly one segment, or a
//! trailing `*name` splat matching every remaining segment. Names listed after `?` are query
//! parameters: they never decide whether a path matches, but are bound when present.
//!
//! Patterns are tested against a [`Candidate`], the pre-split form of a location, so that a
//! navigation event splits and decodes the path only once no matter how many routes are tested.
//!
//! [`PathPattern`]: struct.PathPattern.html
//! [`Candidate`]: struct.Candidate.html

use std::fmt;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::form_urlencoded;
use crate::error::{BuildError, PatternError};
use crate::params::Params;

/// Characters escaped when a parameter value is written into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn check_token(pattern: &str, name: &str, seen: &[&str]) -> Result<(), PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyName { pattern: pattern.to_string() });
    }
    if seen.iter().any(|s| *s == name) {
        return Err(PatternError::DuplicateToken {
            pattern: pattern.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Splat(String),
}

/// A path split into decoded segments plus its decoded query string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    segments: Vec<String>,
    query: Params,
}

impl Candidate {
    /// Split a pathname and a search string (with or without the leading `?`).
    pub fn new(pathname: &str, search: &str) -> Self {
        let segments = pathname
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();

        let search = search.trim_start_matches('?');
        let query = form_urlencoded::parse(search.as_bytes())
            .into_owned()
            .collect();

        Candidate { segments, query }
    }

    /// Split a url of the form `/path?query`. Any `#fragment` is ignored.
    pub fn parse(url: &str) -> Self {
        let url = url.split('#').next().unwrap_or("");
        match url.find('?') {
            Some(i) => Candidate::new(&url[..i], &url[i..]),
            None => Candidate::new(url, ""),
        }
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    query: Vec<String>,
}

impl PathPattern {
    /// Compile a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let (path, query) = match pattern.find('?') {
            Some(i) => (&pattern[..i], &pattern[i + 1..]),
            None => (pattern, ""),
        };

        if !path.starts_with('/') {
            return Err(PatternError::NotAbsolute { pattern: pattern.to_string() });
        }

        let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut seen: Vec<&str> = vec![];

        for (i, s) in raw.iter().enumerate() {
            if let Some(name) = s.strip_prefix(':') {
                check_token(pattern, name, &seen)?;
                seen.push(name);
                segments.push(Segment::Param(name.to_string()));
            }
            else if let Some(name) = s.strip_prefix('*') {
                check_token(pattern, name, &seen)?;
                if i + 1 != raw.len() {
                    return Err(PatternError::SplatNotLast {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                seen.push(name);
                segments.push(Segment::Splat(name.to_string()));
            }
            else {
                segments.push(Segment::Static(s.to_string()));
            }
        }

        let mut names = vec![];
        for name in query.split('&').filter(|s| !s.is_empty()) {
            check_token(pattern, name, &seen)?;
            seen.push(name);
            names.push(name.to_string());
        }

        Ok(PathPattern { segments, query: names })
    }

    /// Append `child` to this pattern, merging query parameters.
    ///
    /// A splat swallows the rest of the path, so nothing can follow it; `join` is only used after
    /// the caller has checked that the parent has no splat.
    pub fn join(&self, child: &PathPattern) -> PathPattern {
        let mut segments = self.segments.clone();
        segments.extend(child.segments.iter().cloned());
        let mut query = self.query.clone();
        query.extend(child.query.iter().cloned());
        PathPattern { segments, query }
    }

    /// The name of the trailing splat, if the pattern ends in one.
    pub fn splat(&self) -> Option<&str> {
        match self.segments.last() {
            Some(Segment::Splat(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Every token name, path tokens first, then query tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(n) | Segment::Splat(n) => Some(n.as_str()),
                Segment::Static(_) => None,
            })
            .chain(self.query.iter().map(|n| n.as_str()))
    }

    /// Match the whole candidate path.
    pub fn test_exact(&self, candidate: &Candidate) -> Option<Params> {
        self.bind(candidate, true)
    }

    /// Match the start of the candidate path, on segment boundaries.
    pub fn test_prefix(&self, candidate: &Candidate) -> Option<Params> {
        self.bind(candidate, false)
    }

    fn bind(&self, candidate: &Candidate, exact: bool) -> Option<Params> {
        let path = &candidate.segments;
        let mut params = Params::new();
        let mut consumed_all = path.len() == self.segments.len();

        for (i, segment) in self.segments.iter().enumerate() {
            let value = path.get(i)?;
            match segment {
                Segment::Static(s) => {
                    if value != s {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), value.clone());
                }
                Segment::Splat(name) => {
                    params.insert(name.clone(), path[i..].join("/"));
                    consumed_all = true;
                }
            }
        }

        if exact && !consumed_all {
            return None;
        }

        for name in &self.query {
            if let Some(value) = candidate.query.get(name) {
                params.insert(name.clone(), value.clone());
            }
        }

        Some(params)
    }

    /// Build a url from this pattern.
    ///
    /// Every path token must have a value. Query tokens are appended only when a value is given.
    /// Entries of `params` that are not tokens of this pattern are ignored.
    pub fn build(&self, params: &Params) -> Result<String, BuildError> {
        let mut url = String::new();

        for segment in &self.segments {
            url.push('/');
            match segment {
                Segment::Static(s) => url.push_str(s),
                Segment::Param(name) => {
                    let value = self.lookup(params, name)?;
                    url.extend(utf8_percent_encode(value, SEGMENT));
                }
                Segment::Splat(name) => {
                    let value = self.lookup(params, name)?;
                    let parts: Vec<String> = value
                        .split('/')
                        .filter(|s| !s.is_empty())
                        .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
                        .collect();
                    // a splat binds at least one segment
                    if parts.is_empty() {
                        return Err(BuildError::MissingParam {
                            pattern: self.to_string(),
                            param: name.clone(),
                        });
                    }
                    url.push_str(&parts.join("/"));
                }
            }
        }

        if url.is_empty() {
            url.push('/');
        }

        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        for name in &self.query {
            if let Some(value) = params.get(name) {
                query.append_pair(name, value);
                any = true;
            }
        }
        if any {
            url.push('?');
            url.push_str(&query.finish());
        }

        Ok(url)
    }

    fn lookup<'a>(&self, params: &'a Params, name: &str) -> Result<&'a str, BuildError> {
        params
            .get(name)
            .map(|v| v.as_str())
            .ok_or_else(|| BuildError::MissingParam {
                pattern: self.to_string(),
                param: name.to_string(),
            })
    }

    /// Whether some path is matched exactly by both patterns.
    pub fn overlaps(&self, other: &PathPattern) -> bool {
        let mut i = 0;
        loop {
            match (self.segments.get(i), other.segments.get(i)) {
                (None, None) => return true,
                (Some(Segment::Splat(_)), Some(_)) | (Some(_), Some(Segment::Splat(_))) => return true,
                (Some(Segment::Static(a)), Some(Segment::Static(b))) => {
                    if a != b {
                        return false;
                    }
                }
                (Some(_), Some(_)) => {}
                _ => return false,
            }
            i += 1;
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "/")?;
        }
        for segment in &self.segments {
            match segment {
                Segment::Static(s) => write!(f, "/{}", s)?,
                Segment::Param(n) => write!(f, "/:{}", n)?,
                Segment::Splat(n) => write!(f, "/*{}", n)?,
            }
        }
        if !self.query.is_empty() {
            write!(f, "?{}", self.query.join("&"))?;
        }
        Ok(())
    }
}
