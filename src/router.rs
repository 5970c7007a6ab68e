//! The router: a route tree bound to a navigation source.
//!
//! A [`Router`] is built from a [`Routes`] declaration and a [`NavigationSource`]. It matches the
//! source's current location right away, then follows every location the source reports. Each
//! declared route is reachable through a [`RouteHandle`], which exposes the route's state, the
//! channels that state is published on, and navigation to the route.
//!
//! ```
//! use std::rc::Rc;
//! use tree_router::history::MemoryHistory;
//! use tree_router::route::{route, Routes};
//! use tree_router::router::Router;
//!
//! let routes = Routes::new()
//!     .with("home", route().path("/"))
//!     .with("user", route().path("/user/:userId").params(["userId"]));
//!
//! let router = Router::new(&routes, Rc::new(MemoryHistory::new())).unwrap();
//! let user = router.route("user").unwrap();
//!
//! user.push(&[("userId", "42")]).unwrap();
//! assert!(user.is_matching_exact());
//! assert_eq!(user.current_params().unwrap()["userId"], "42");
//! ```
//!
//! # Navigation during a commit
//!
//! Subscribers run while a navigation is being committed. If one of them navigates again, the
//! new location is queued and matched once the current commit has been fully published, so
//! subscribers always observe commits one at a time and in order. With
//! [`Reentrancy::Reject`] set on the [`RouterBuilder`], [`RouteHandle::push`] and
//! [`RouteHandle::replace`] instead fail with [`NavigationError::Reentrant`] without touching the
//! navigation source.
//!
//! [`Router`]: struct.Router.html
//! [`Routes`]: ../route/struct.Routes.html
//! [`NavigationSource`]: ../history/trait.NavigationSource.html
//! [`RouteHandle`]: struct.RouteHandle.html
//! [`RouterBuilder`]: struct.RouterBuilder.html
//! [`Reentrancy::Reject`]: enum.Reentrancy.html#variant.Reject
//! [`RouteHandle::push`]: struct.RouteHandle.html#method.push
//! [`RouteHandle::replace`]: struct.RouteHandle.html#method.replace
//! [`NavigationError::Reentrant`]: ../error/enum.NavigationError.html#variant.Reentrant

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use log::{debug, error, warn};
use crate::channel::{Channel, Subscription};
use crate::error::{BuildError, ConfigError, NavigationError};
use crate::history::{Location, NavigationSource};
use crate::matcher;
use crate::node::{self, Match, NodeState, RouteNode, RouterState};
use crate::params::{self, Params};
use crate::pattern::Candidate;
use crate::route::Routes;
use crate::store::StateStore;

/// What to do when a route is navigated to while a commit is being published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reentrancy {
    /// Navigate, and match the new location after the current commit.
    Queue,
    /// Fail with [`NavigationError::Reentrant`].
    ///
    /// [`NavigationError::Reentrant`]: ../error/enum.NavigationError.html#variant.Reentrant
    Reject,
}

/// What to do with sibling routes whose patterns can match the same path.
///
/// The route declared first always wins such a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Say nothing.
    Allow,
    /// Log a warning.
    Warn,
    /// Fail with [`ConfigError::Overlap`].
    ///
    /// [`ConfigError::Overlap`]: ../error/enum.ConfigError.html#variant.Overlap
    Deny,
}

/// Router settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterOptions {
    /// Handling of navigation during a commit.
    pub reentrancy: Reentrancy,
    /// Handling of overlapping siblings.
    pub overlaps: OverlapPolicy,
}

impl Default for RouterOptions {
    fn default() -> Self {
        RouterOptions {
            reentrancy: Reentrancy::Queue,
            overlaps: OverlapPolicy::Warn,
        }
    }
}

/// Struct used to configure and build a [`Router`].
///
/// [`Router`]: struct.Router.html
#[derive(Debug, Clone, Default)]
pub struct RouterBuilder {
    options: RouterOptions,
}

impl RouterBuilder {
    /// A builder with default options.
    pub fn new() -> Self {
        RouterBuilder::default()
    }

    /// Set the handling of navigation during a commit.
    pub fn reentrancy(mut self, reentrancy: Reentrancy) -> Self {
        self.options.reentrancy = reentrancy;
        self
    }

    /// Set the handling of overlapping siblings.
    pub fn overlaps(mut self, overlaps: OverlapPolicy) -> Self {
        self.options.overlaps = overlaps;
        self
    }

    /// Replace all options at once.
    pub fn options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a router for `routes`, following `source`.
    ///
    /// The source's current location is matched before this returns.
    pub fn build<N>(self, routes: &Routes, source: Rc<N>) -> Result<Router, ConfigError>
    where
        N: NavigationSource + 'static,
    {
        let roots = node::build_forest(routes, self.options.overlaps)?;
        let initial = RouterState::new(
            roots
                .iter()
                .map(|r| (r.id().to_string(), r.store().current()))
                .collect(),
        );

        let inner = Rc::new(RouterInner {
            roots,
            store: StateStore::new(Rc::new(initial)),
            source,
            options: self.options,
            committing: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
            listener: RefCell::new(None),
        });

        let router = Rc::downgrade(&inner);
        let subscription = inner.source.listen(Box::new(move |location: &Location| {
            if let Some(router) = router.upgrade() {
                router.navigate(location.clone());
            }
        }));
        *inner.listener.borrow_mut() = Some(subscription);

        debug!(
            "router built with {} top-level routes ({:?})",
            inner.roots.len(),
            inner.options,
        );

        inner.navigate(inner.source.current_location());

        Ok(Router { inner })
    }
}

struct RouterInner {
    roots: Vec<Rc<RouteNode>>,
    store: StateStore<RouterState>,
    source: Rc<dyn NavigationSource>,
    options: RouterOptions,
    committing: Cell<bool>,
    pending: RefCell<VecDeque<Location>>,
    listener: RefCell<Option<Subscription>>,
}

impl RouterInner {
    /// Match `location`, or queue it if a commit is being published.
    fn navigate(&self, location: Location) {
        // queue the location
        self.pending.borrow_mut().push_back(location);

        if self.committing.get() {
            // the current committer will process the queue
            warn!("navigation queued behind a commit in progress");
            return;
        }

        let _guard = Committing::start(self);

        // now process queued locations
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let location = match next {
                Some(location) => location,
                None => break,
            };
            self.apply(&location);
        }
    }

    fn apply(&self, location: &Location) {
        let candidate = Candidate::new(&location.pathname, &location.search);
        let plan = matcher::plan_forest(&self.roots, self.store.current(), &candidate);
        debug!(
            "navigated to {} ({})",
            location,
            if plan.is_changed() { "changed" } else { "unchanged" },
        );
        plan.commit(&self.store);
    }

    fn find(&self, key: &str) -> Option<Rc<RouteNode>> {
        let mut ids = key.split('.');
        let first = ids.next()?;
        let mut node = self.roots.iter().find(|r| r.id() == first)?;
        for id in ids {
            node = node.child(id)?;
        }
        Some(Rc::clone(node))
    }
}

/// Marks a router as committing until dropped.
///
/// If a subscriber panics the marker is still cleared and the locations queued behind the
/// failed commit are dropped, so the next navigation is processed normally.
struct Committing<'a> {
    router: &'a RouterInner,
}

impl<'a> Committing<'a> {
    fn start(router: &'a RouterInner) -> Self {
        router.committing.set(true);
        Committing { router }
    }
}

impl Drop for Committing<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let dropped = self.router.pending.borrow_mut().drain(..).count();
            error!("commit aborted by a panicking subscriber, {} queued locations dropped", dropped);
        }
        self.router.committing.set(false);
    }
}

impl Drop for RouterInner {
    fn drop(&mut self) {
        if let Some(subscription) = self.listener.get_mut().take() {
            subscription.unsubscribe();
        }
    }
}

/// A route tree bound to a navigation source.
///
/// Cloning a router is cheap; clones share the same tree. The router stops following its source
/// once the router, every clone of it, and every [`RouteHandle`] are dropped.
///
/// [`RouteHandle`]: struct.RouteHandle.html
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

impl Router {
    /// Build a router with default options.
    pub fn new<N>(routes: &Routes, source: Rc<N>) -> Result<Router, ConfigError>
    where
        N: NavigationSource + 'static,
    {
        RouterBuilder::new().build(routes, source)
    }

    /// The options this router was built with.
    pub fn options(&self) -> &RouterOptions {
        &self.inner.options
    }

    /// The state of every top-level route.
    pub fn current_state(&self) -> Rc<RouterState> {
        self.inner.store.current()
    }

    /// Published after every change to any route.
    pub fn state(&self) -> &Channel<Rc<RouterState>> {
        self.inner.store.states()
    }

    /// A top-level route by id.
    pub fn route(&self, id: &str) -> Option<RouteHandle> {
        self.inner
            .roots
            .iter()
            .find(|r| r.id() == id)
            .map(|node| self.handle(node))
    }

    /// Every top-level route, in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = RouteHandle> + '_ {
        self.inner.roots.iter().map(move |node| self.handle(node))
    }

    /// Any route by dotted id, such as `user.post`.
    pub fn lookup(&self, key: &str) -> Option<RouteHandle> {
        self.inner.find(key).map(|node| RouteHandle {
            node,
            router: Rc::clone(&self.inner),
        })
    }

    /// The navigation source's current location.
    pub fn location(&self) -> Location {
        self.inner.source.current_location()
    }

    fn handle(&self, node: &Rc<RouteNode>) -> RouteHandle {
        RouteHandle {
            node: Rc::clone(node),
            router: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.inner.roots)
            .field("options", &self.inner.options)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Push,
    Replace,
}

/// Access to one route of a router.
///
/// A handle keeps its router alive. A handle captured by a subscriber of its own router forms a
/// cycle that lasts until that subscription is removed.
#[derive(Clone)]
pub struct RouteHandle {
    node: Rc<RouteNode>,
    router: Rc<RouterInner>,
}

impl RouteHandle {
    /// The id of this route among its siblings.
    pub fn id(&self) -> &str {
        self.node.id()
    }

    /// Dotted ids from the top-level route down to this one.
    pub fn key(&self) -> &str {
        self.node.key()
    }

    /// The full path pattern of this route.
    pub fn path(&self) -> &str {
        self.node.path()
    }

    /// The route's runtime node.
    pub fn node(&self) -> &Rc<RouteNode> {
        &self.node
    }

    /// The state of this route and its subtree.
    pub fn current_state(&self) -> Rc<NodeState> {
        self.node.store().current()
    }

    /// The match of this route, `None` when it is not active.
    pub fn current_match(&self) -> Option<Rc<Match>> {
        self.current_state().matched().cloned()
    }

    /// The parameters of the current match.
    pub fn current_params(&self) -> Option<Params> {
        self.current_match().and_then(|m| m.params.clone())
    }

    /// Published after every change to this route or any descendant.
    pub fn state(&self) -> &Channel<Rc<NodeState>> {
        self.node.store().states()
    }

    /// Published when this route's own match changes.
    pub fn matches(&self) -> &Channel<Option<Rc<Match>>> {
        self.node.store().matches()
    }

    /// Whether this route is active.
    pub fn is_matching(&self) -> bool {
        self.current_state().is_matching()
    }

    /// Whether this route is the deepest active route.
    pub fn is_matching_exact(&self) -> bool {
        self.current_state().is_matching_exact()
    }

    /// Whether a descendant of this route is the deepest active route.
    pub fn is_matching_child(&self) -> bool {
        self.current_state().is_matching_child()
    }

    /// A direct child by id.
    pub fn child(&self, id: &str) -> Option<RouteHandle> {
        self.node.child(id).map(|node| RouteHandle {
            node: Rc::clone(node),
            router: Rc::clone(&self.router),
        })
    }

    /// Every direct child, in declaration order.
    pub fn children(&self) -> impl Iterator<Item = RouteHandle> + '_ {
        self.node.children().iter().map(move |node| RouteHandle {
            node: Rc::clone(node),
            router: Rc::clone(&self.router),
        })
    }

    /// The url of this route for `params`.
    pub fn href(&self, params: &[(&str, &str)]) -> Result<String, BuildError> {
        self.node.pattern().build(&params::from_pairs(params))
    }

    /// Navigate to this route, adding a history entry.
    pub fn push(&self, params: &[(&str, &str)]) -> Result<(), NavigationError> {
        self.navigate(params, Mode::Push)
    }

    /// Navigate to this route, replacing the current history entry.
    pub fn replace(&self, params: &[(&str, &str)]) -> Result<(), NavigationError> {
        self.navigate(params, Mode::Replace)
    }

    fn navigate(&self, params: &[(&str, &str)], mode: Mode) -> Result<(), NavigationError> {
        if self.router.committing.get() && self.router.options.reentrancy == Reentrancy::Reject {
            return Err(NavigationError::Reentrant { route: self.key().to_string() });
        }

        let url = self.href(params)?;
        debug!("{:?} '{}' -> {}", mode, self.key(), url);

        match mode {
            Mode::Push => self.router.source.push(&url)?,
            Mode::Replace => self.router.source.replace(&url)?,
        }
        Ok(())
    }
}

impl fmt::Debug for RouteHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RouteHandle")
            .field("key", &self.key())
            .field("path", &self.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;
    use crate::route::route;

    fn routes() -> Routes {
        Routes::new()
            .with("home", route().path("/"))
            .with(
                "user",
                route()
                    .path("/user/:userId")
                    .params(["userId"])
                    .nested("post", route().path("/post/:postId").params(["postId"])),
            )
    }

    #[test]
    fn bootstraps_from_current_location() {
        let history = Rc::new(MemoryHistory::starting_at("/user/7/post/8"));
        let router = Router::new(&routes(), history).unwrap();
        let post = router.lookup("user.post").unwrap();
        assert!(post.is_matching_exact());
        assert_eq!(post.current_params(), Some(params::from_pairs(&[("postId", "8"), ("userId", "7")])));
        assert!(router.route("user").unwrap().is_matching_child());
    }

    #[test]
    fn lookup_and_children() {
        let router = Router::new(&routes(), Rc::new(MemoryHistory::new())).unwrap();
        assert_eq!(router.routes().map(|r| r.id().to_string()).collect::<Vec<_>>(), vec!["home", "user"]);
        let user = router.route("user").unwrap();
        let keys: Vec<_> = user.children().map(|c| c.key().to_string()).collect();
        assert_eq!(keys, vec!["user.post"]);
        assert_eq!(user.child("post").map(|c| c.path().to_string()), Some("/user/:userId/post/:postId".to_string()));
        assert!(router.lookup("user.nothing").is_none());
        assert!(router.lookup("").is_none());
    }

    #[test]
    fn dropping_router_stops_listening() {
        let history = Rc::new(MemoryHistory::new());
        let router = Router::new(&routes(), Rc::clone(&history)).unwrap();
        drop(router);
        history.push("/user/1").unwrap();
    }

    #[test]
    fn href_does_not_navigate() {
        let history = Rc::new(MemoryHistory::new());
        let router = Router::new(&routes(), Rc::clone(&history)).unwrap();
        let post = router.lookup("user.post").unwrap();
        assert_eq!(post.href(&[("userId", "1"), ("postId", "a b")]).unwrap(), "/user/1/post/a%20b");
        assert_eq!(history.len(), 1);
    }
}
