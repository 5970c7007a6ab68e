//! Synchronous multicast channels.
//!
//! A [`Channel`] owns a list of subscriber callbacks. Publishing runs every callback that was
//! subscribed when the publish started, in subscription order, before returning. Subscribers only
//! ever see values published after they subscribed.
//!
//! Callbacks may subscribe, unsubscribe, or publish again while being notified; the subscriber
//! list is snapshotted before the callbacks run, so none of this disturbs the publish in progress.
//!
//! [`Channel`]: struct.Channel.html

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Subscribers<T> {
    next_id: Cell<u64>,
    list: RefCell<Vec<(u64, Callback<T>)>>,
}

/// Remove a subscriber by id, independent of the value type.
trait Detach {
    fn detach(&self, id: u64);
}

impl<T> Detach for Subscribers<T> {
    fn detach(&self, id: u64) {
        self.list.borrow_mut().retain(|(i, _)| *i != id);
    }
}

/// A synchronous multicast channel.
pub struct Channel<T> {
    subscribers: Rc<Subscribers<T>>,
}

impl<T: 'static> Channel<T> {
    /// A channel with no subscribers.
    pub fn new() -> Self {
        Channel {
            subscribers: Rc::new(Subscribers {
                next_id: Cell::new(0),
                list: RefCell::new(vec![]),
            }),
        }
    }

    /// Register a callback for every value published from now on.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = self.subscribers.next_id.get();
        self.subscribers.next_id.set(id + 1);
        self.subscribers
            .list
            .borrow_mut()
            .push((id, Rc::new(callback)));

        let subscribers: Rc<dyn Detach> = self.subscribers.clone();
        Subscription {
            id,
            channel: Rc::downgrade(&subscribers),
        }
    }

    /// Number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.list.borrow().len()
    }

    /// Run every current subscriber with `value`.
    pub(crate) fn publish(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .subscribers
            .list
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(value);
        }
    }
}

impl<T: 'static> Default for Channel<T> {
    fn default() -> Self {
        Channel::new()
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Channel({} subscribers)", self.subscribers.list.borrow().len())
    }
}

/// Handle to a registered callback.
///
/// Dropping a subscription leaves the callback registered; call [`unsubscribe`] to remove it.
///
/// [`unsubscribe`]: struct.Subscription.html#method.unsubscribe
pub struct Subscription {
    id: u64,
    channel: Weak<dyn Detach>,
}

impl Subscription {
    /// Remove the callback from its channel.
    ///
    /// Does nothing if the channel no longer exists.
    pub fn unsubscribe(self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.detach(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Subscription({})", self.id)
    }
}
