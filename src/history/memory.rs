//! An in-memory navigation source.

use std::cell::{Cell, RefCell};
use log::debug;
use crate::channel::{Channel, Subscription};
use crate::error::HistoryError;
use crate::history::{Location, NavigationSource};

/// A stack of entries with a cursor, like the browser's session history.
///
/// Useful outside of the browser and in tests. Every change of the current entry is reported to
/// listeners, including pushing or replacing the location that is already current.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: RefCell<Vec<Location>>,
    index: Cell<usize>,
    changes: Channel<Location>,
}

impl MemoryHistory {
    /// A history with a single entry at `/`.
    pub fn new() -> Self {
        MemoryHistory::starting_at("/")
    }

    /// A history with a single entry at `url`.
    pub fn starting_at(url: &str) -> Self {
        MemoryHistory {
            entries: RefCell::new(vec![Location::parse(url)]),
            index: Cell::new(0),
            changes: Channel::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Position of the current entry.
    pub fn index(&self) -> usize {
        self.index.get()
    }

    /// Every entry, oldest first.
    pub fn entries(&self) -> Vec<Location> {
        self.entries.borrow().clone()
    }

    /// Move back one entry.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Move forward one entry.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Move by `delta` entries.
    ///
    /// Returns `false` and does nothing when the target is out of range or `delta` is zero.
    pub fn go(&self, delta: isize) -> bool {
        let target = self.index.get() as isize + delta;
        if delta == 0 || target < 0 || target as usize >= self.len() {
            return false;
        }
        self.index.set(target as usize);
        self.announce();
        true
    }

    fn announce(&self) {
        let location = self.current_location();
        debug!("memory history at {} ({})", location, self.index.get());
        self.changes.publish(&location);
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        MemoryHistory::new()
    }
}

impl NavigationSource for MemoryHistory {
    fn current_location(&self) -> Location {
        self.entries.borrow()[self.index.get()].clone()
    }

    fn listen(&self, listener: Box<dyn Fn(&Location)>) -> Subscription {
        self.changes.subscribe(listener)
    }

    fn push(&self, url: &str) -> Result<(), HistoryError> {
        {
            let mut entries = self.entries.borrow_mut();
            let next = self.index.get() + 1;
            entries.truncate(next);
            entries.push(Location::parse(url));
            self.index.set(next);
        }
        self.announce();
        Ok(())
    }

    fn replace(&self, url: &str) -> Result<(), HistoryError> {
        {
            let mut entries = self.entries.borrow_mut();
            entries[self.index.get()] = Location::parse(url);
        }
        self.announce();
        Ok(())
    }
}
