#![deny(missing_docs)]

//! A tree of routes that tracks which of them match the current location.
//!
//! Routes are declared as a tree with the [`route`] builder. A [`Router`] built from that tree
//! follows a [`NavigationSource`] (the browser's history or an in-memory one) and, for every
//! location, decides which routes are active:
//!
//! - among siblings, only the first declared route that matches is active,
//! - the deepest active route matches exactly, its ancestors match as pass-through,
//! - every active route carries the values of the parameters declared by it and its ancestors.
//!
//! The state of each route is published on channels that subscribers can follow. States that did
//! not change keep their identity, so subscribers are only told about real changes.
//!
//! ```
//! use std::rc::Rc;
//! use tree_router::history::MemoryHistory;
//! use tree_router::route::{route, Routes};
//! use tree_router::router::Router;
//!
//! let routes = Routes::new()
//!     .with("home", route().path("/"))
//!     .with("user", route()
//!         .path("/user/:userId")
//!         .params(["userId"])
//!         .nested("post", route().path("/post/:postId").params(["postId"])));
//!
//! let history = Rc::new(MemoryHistory::new());
//! let router = Router::new(&routes, history).unwrap();
//!
//! router.lookup("user.post").unwrap().push(&[("userId", "1"), ("postId", "2")]).unwrap();
//!
//! let user = router.route("user").unwrap();
//! assert!(user.is_matching_child());
//! assert_eq!(user.current_params().unwrap()["userId"], "1");
//! assert!(!router.route("home").unwrap().is_matching());
//! ```
//!
//! [`route`]: route/fn.route.html
//! [`Router`]: router/struct.Router.html
//! [`NavigationSource`]: history/trait.NavigationSource.html

pub mod channel;
pub mod error;
pub mod history;
pub mod matcher;
pub mod node;
pub mod params;
pub mod pattern;
pub mod route;
pub mod router;
mod store;

pub use crate::channel::{Channel, Subscription};
pub use crate::error::{BuildError, ConfigError, HistoryError, NavigationError, PatternError};
pub use crate::history::{BrowserHistory, Location, MemoryHistory, NavigationSource};
pub use crate::node::{Match, NodeState, RouterState};
pub use crate::params::Params;
pub use crate::route::{route, RouteDefinition, Routes};
pub use crate::router::{OverlapPolicy, Reentrancy, RouteHandle, Router, RouterBuilder, RouterOptions};
