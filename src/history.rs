//! Where locations come from.
//!
//! A router reads the current [`Location`] from a [`NavigationSource`] when it is built, listens to
//! it for later changes, and asks it to push or replace urls when a route is navigated to. Two
//! sources are provided: [`MemoryHistory`], an in-memory entry stack, and [`BrowserHistory`], backed
//! by `window.history`.
//!
//! [`Location`]: struct.Location.html
//! [`NavigationSource`]: trait.NavigationSource.html
//! [`MemoryHistory`]: memory/struct.MemoryHistory.html
//! [`BrowserHistory`]: browser/struct.BrowserHistory.html

pub mod memory;
pub mod browser;

pub use crate::history::memory::MemoryHistory;
pub use crate::history::browser::BrowserHistory;

use std::fmt;
use crate::channel::Subscription;
use crate::error::HistoryError;

/// A location: a pathname plus the raw search and hash strings.
///
/// `search` and `hash` keep their leading `?` and `#`, as `window.location` does, and are empty
/// when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// The path, always starting with `/`.
    pub pathname: String,
    /// The query string including `?`, or empty.
    pub search: String,
    /// The fragment including `#`, or empty.
    pub hash: String,
}

impl Location {
    /// Split a url of the form `/path?query#hash`.
    ///
    /// Anything before the path (a scheme and host) is not expected; pass `pathname`, `search`,
    /// and `hash` as the browser reports them.
    pub fn parse(url: &str) -> Self {
        let (rest, hash) = match url.find('#') {
            Some(i) => (&url[..i], &url[i..]),
            None => (url, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };

        let pathname = if pathname.is_empty() {
            "/".to_string()
        }
        else if pathname.starts_with('/') {
            pathname.to_string()
        }
        else {
            format!("/{}", pathname)
        };

        Location {
            pathname,
            search: if search == "?" { String::new() } else { search.to_string() },
            hash: if hash == "#" { String::new() } else { hash.to_string() },
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location {
            pathname: "/".to_string(),
            search: String::new(),
            hash: String::new(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// Something that tracks the current location and can be told to change it.
pub trait NavigationSource {
    /// The location right now.
    fn current_location(&self) -> Location;

    /// Call `listener` with every later location change.
    ///
    /// Changes caused by [`push`] and [`replace`] are reported too.
    ///
    /// [`push`]: #tymethod.push
    /// [`replace`]: #tymethod.replace
    fn listen(&self, listener: Box<dyn Fn(&Location)>) -> Subscription;

    /// Navigate to `url`, adding an entry.
    fn push(&self, url: &str) -> Result<(), HistoryError>;

    /// Navigate to `url`, replacing the current entry.
    fn replace(&self, url: &str) -> Result<(), HistoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_location() {
        let l = Location::parse("/a/b?x=1#top");
        assert_eq!(l.pathname, "/a/b");
        assert_eq!(l.search, "?x=1");
        assert_eq!(l.hash, "#top");
        assert_eq!(l.to_string(), "/a/b?x=1#top");
    }

    #[test]
    fn parse_bare_locations() {
        assert_eq!(Location::parse(""), Location::default());
        assert_eq!(Location::parse("?"), Location::default());
        assert_eq!(Location::parse("a").pathname, "/a");
        assert_eq!(Location::parse("/#x?y").hash, "#x?y");
        assert_eq!(Location::parse("/#x?y").search, "");
    }
}
