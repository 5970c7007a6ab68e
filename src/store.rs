//! Holders of the current state, with a channel announcing each replacement.

use std::cell::RefCell;
use std::rc::Rc;
use crate::channel::Channel;
use crate::node::{Match, NodeState};

/// The current value of a piece of state and the channel it is published on.
pub(crate) struct StateStore<S> {
    current: RefCell<Rc<S>>,
    states: Channel<Rc<S>>,
}

impl<S: 'static> StateStore<S> {
    pub fn new(initial: Rc<S>) -> Self {
        StateStore {
            current: RefCell::new(initial),
            states: Channel::new(),
        }
    }

    pub fn current(&self) -> Rc<S> {
        Rc::clone(&self.current.borrow())
    }

    pub fn states(&self) -> &Channel<Rc<S>> {
        &self.states
    }

    /// Replace the current value and publish it.
    ///
    /// Returns the replaced value, or `None` without publishing if `next` is the value already
    /// held. The new value is in place before any subscriber runs.
    pub fn commit(&self, next: Rc<S>) -> Option<Rc<S>> {
        if Rc::ptr_eq(&self.current.borrow(), &next) {
            return None;
        }
        let previous = self.current.replace(Rc::clone(&next));
        self.states.publish(&next);
        Some(previous)
    }
}

/// Whether two optional matches are the same allocation.
pub(crate) fn same_match(a: Option<&Rc<Match>>, b: Option<&Rc<Match>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// The state of one route, plus a channel for just its match.
pub(crate) struct NodeStore {
    state: StateStore<NodeState>,
    matches: Channel<Option<Rc<Match>>>,
}

impl NodeStore {
    pub fn new(initial: Rc<NodeState>) -> Self {
        NodeStore {
            state: StateStore::new(initial),
            matches: Channel::new(),
        }
    }

    pub fn current(&self) -> Rc<NodeState> {
        self.state.current()
    }

    pub fn states(&self) -> &Channel<Rc<NodeState>> {
        self.state.states()
    }

    pub fn matches(&self) -> &Channel<Option<Rc<Match>>> {
        &self.matches
    }

    /// Replace the node state, publishing the state and then, if it differs, the match.
    ///
    /// Returns whether anything was published.
    pub fn commit(&self, next: Rc<NodeState>) -> bool {
        let previous = match self.state.commit(Rc::clone(&next)) {
            Some(previous) => previous,
            None => return false,
        };
        if !same_match(previous.matched(), next.matched()) {
            self.matches.publish(&next.matched().cloned());
        }
        true
    }
}
