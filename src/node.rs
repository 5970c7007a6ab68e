//! The runtime route tree and the state it publishes.
//!
//! Every declared route becomes one [`RouteNode`], built once when the router is built and kept
//! for the router's lifetime. A node knows its full path pattern (its ancestors' segments followed
//! by its own), the parameters in scope at its level, and its children in declaration order.
//!
//! The state of a node is a [`NodeState`]: the node's own [`Match`] (or `None` when inactive) and
//! the state of each child, keyed by child id. States are immutable and shared through `Rc`; a new
//! navigation builds new states only for the parts of the tree that changed and reuses the rest.
//!
//! [`RouteNode`]: struct.RouteNode.html
//! [`NodeState`]: struct.NodeState.html
//! [`Match`]: struct.Match.html

use std::fmt;
use std::rc::Rc;
use log::warn;
use crate::error::{ConfigError, PatternError};
use crate::params::Params;
use crate::pattern::{Candidate, PathPattern};
use crate::route::{RouteDefinition, Routes};
use crate::router::OverlapPolicy;
use crate::store::NodeStore;

/// The match of an active route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// `true` when this route is the deepest active route, `false` when one of its descendants is.
    pub exact: bool,
    /// Values of the parameters in scope at this route, `None` when no parameter is in scope.
    pub params: Option<Params>,
}

impl Match {
    /// The value of a single parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.get(name))
            .map(|v| v.as_str())
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ exact: {}", self.exact)?;
        if let Some(params) = &self.params {
            write!(f, ", params: {{")?;
            for (i, (k, v)) in params.iter().enumerate() {
                write!(f, "{}{}: {:?}", if i == 0 { " " } else { ", " }, k, v)?;
            }
            write!(f, " }}")?;
        }
        write!(f, " }}")
    }
}

/// Child states keyed by id, in declaration order.
type ChildStates = Vec<(String, Rc<NodeState>)>;

fn find<'a>(states: &'a ChildStates, id: &str) -> Option<&'a Rc<NodeState>> {
    states.iter().find(|(k, _)| k == id).map(|(_, s)| s)
}

fn write_children(f: &mut fmt::Formatter, states: &ChildStates, mut first: bool) -> fmt::Result {
    for (id, state) in states {
        write!(f, "{}{}: {}", if first { " " } else { ", " }, id, state)?;
        first = false;
    }
    Ok(())
}

/// The state of one route and all of its descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeState {
    matched: Option<Rc<Match>>,
    children: ChildStates,
}

impl NodeState {
    pub(crate) fn new(matched: Option<Rc<Match>>, children: ChildStates) -> Self {
        NodeState { matched, children }
    }

    /// The match of this route, `None` when it is not active.
    pub fn matched(&self) -> Option<&Rc<Match>> {
        self.matched.as_ref()
    }

    /// The state of a direct child.
    pub fn child(&self, id: &str) -> Option<&Rc<NodeState>> {
        find(&self.children, id)
    }

    /// Child states in declaration order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Rc<NodeState>)> + '_ {
        self.children.iter().map(|(id, s)| (id.as_str(), s))
    }

    /// Whether this route is active.
    pub fn is_matching(&self) -> bool {
        self.matched.is_some()
    }

    /// Whether this route is the deepest active route.
    pub fn is_matching_exact(&self) -> bool {
        self.matched.as_ref().map_or(false, |m| m.exact)
    }

    /// Whether one of this route's descendants is the deepest active route.
    pub fn is_matching_child(&self) -> bool {
        self.matched.as_ref().map_or(false, |m| !m.exact)
    }
}

/// Renders as `{ match: { exact: true }, child: { match: null } }`.
impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.matched {
            Some(m) => write!(f, "{{ match: {}", m)?,
            None => write!(f, "{{ match: null")?,
        }
        write_children(f, &self.children, false)?;
        write!(f, " }}")
    }
}

/// The aggregate state of every top-level route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterState {
    routes: ChildStates,
}

impl RouterState {
    pub(crate) fn new(routes: ChildStates) -> Self {
        RouterState { routes }
    }

    /// The state of a top-level route.
    pub fn route(&self, id: &str) -> Option<&Rc<NodeState>> {
        find(&self.routes, id)
    }

    /// Top-level route states in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &Rc<NodeState>)> + '_ {
        self.routes.iter().map(|(id, s)| (id.as_str(), s))
    }
}

impl fmt::Display for RouterState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        write_children(f, &self.routes, true)?;
        write!(f, " }}")
    }
}

/// A route in the runtime tree.
pub struct RouteNode {
    id: String,
    key: String,
    path: String,
    pattern: PathPattern,
    params: Vec<String>,
    scope: Vec<String>,
    children: Vec<Rc<RouteNode>>,
    store: NodeStore,
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("key", &self.key)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("children", &self.children.len())
            .finish()
    }
}

/// Where a node is being built: its parent's key, full pattern, and parameter scope.
struct Parent<'a> {
    key: &'a str,
    pattern: &'a PathPattern,
    scope: &'a [String],
}

impl RouteNode {
    /// The id of this route among its siblings.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Dotted ids from the top-level route down to this one, such as `user.post`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The full path pattern, such as `/user/:userId/post/:postId`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The compiled full path pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Parameters declared by this route itself.
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    /// Parameters visible at this route: those of every ancestor, then its own.
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    /// Child routes in declaration order.
    pub fn children(&self) -> &[Rc<RouteNode>] {
        &self.children
    }

    /// A direct child by id.
    pub fn child(&self, id: &str) -> Option<&Rc<RouteNode>> {
        self.children.iter().find(|c| c.id == id)
    }

    /// Match the whole candidate against this route's full pattern.
    pub fn test_exact(&self, candidate: &Candidate) -> Option<Params> {
        self.pattern.test_exact(candidate)
    }

    /// Match the start of the candidate against this route's full pattern.
    pub fn test_prefix(&self, candidate: &Candidate) -> Option<Params> {
        self.pattern.test_prefix(candidate)
    }

    pub(crate) fn store(&self) -> &NodeStore {
        &self.store
    }

    fn build(
        id: &str,
        definition: &RouteDefinition,
        parent: Option<&Parent>,
        overlaps: OverlapPolicy,
    ) -> Result<Rc<RouteNode>, ConfigError> {
        check_id(id)?;

        let key = match parent {
            Some(p) => format!("{}.{}", p.key, id),
            None => id.to_string(),
        };

        let segment = match definition.segment() {
            Some(s) => s.to_string(),
            None => format!("/{}", id),
        };
        let own = PathPattern::parse(&segment).map_err(|source| ConfigError::Pattern {
            route: key.clone(),
            source,
        })?;

        let declared = definition.param_names();
        if definition.has_params() && declared.is_empty() {
            return Err(ConfigError::EmptyParams { route: key });
        }

        let tokens: Vec<&str> = own.tokens().collect();
        if let Some(token) = tokens.iter().find(|t| !declared.iter().any(|d| d == *t)) {
            return Err(ConfigError::UndeclaredToken { route: key, param: token.to_string() });
        }
        if let Some(param) = declared.iter().find(|d| !tokens.contains(&d.as_str())) {
            return Err(ConfigError::UnboundParam { route: key, param: param.clone() });
        }

        let inherited: &[String] = match parent {
            Some(p) => p.scope,
            None => &[],
        };
        if let Some(param) = declared.iter().find(|d| inherited.contains(*d)) {
            return Err(ConfigError::ShadowedParam { route: key, param: param.clone() });
        }

        let pattern = match parent {
            Some(p) => {
                if let Some(splat) = p.pattern.splat() {
                    return Err(ConfigError::Pattern {
                        route: key,
                        source: PatternError::SplatNotLast {
                            pattern: p.pattern.to_string(),
                            name: splat.to_string(),
                        },
                    });
                }
                p.pattern.join(&own)
            }
            None => own,
        };

        let mut scope = inherited.to_vec();
        for param in declared {
            if !scope.contains(param) {
                scope.push(param.clone());
            }
        }

        let children = match definition.children() {
            Some(routes) if routes.is_empty() => {
                return Err(ConfigError::EmptyBranch { route: key });
            }
            Some(routes) => {
                let here = Parent { key: &key, pattern: &pattern, scope: &scope };
                build_level(routes, Some(&here), overlaps)?
            }
            None => vec![],
        };

        let initial = NodeState::new(
            None,
            children
                .iter()
                .map(|c| (c.id.clone(), c.store.current()))
                .collect(),
        );

        Ok(Rc::new(RouteNode {
            id: id.to_string(),
            key,
            path: pattern.to_string(),
            pattern,
            params: declared.to_vec(),
            scope,
            children,
            store: NodeStore::new(Rc::new(initial)),
        }))
    }
}

fn check_id(id: &str) -> Result<(), ConfigError> {
    let valid = !id.is_empty()
        && !id.chars().any(|c| c.is_whitespace() || "/.?#:*&".contains(c));
    if valid {
        Ok(())
    }
    else {
        Err(ConfigError::InvalidId { id: id.to_string() })
    }
}

fn build_level(
    routes: &Routes,
    parent: Option<&Parent>,
    overlaps: OverlapPolicy,
) -> Result<Vec<Rc<RouteNode>>, ConfigError> {
    let mut nodes: Vec<Rc<RouteNode>> = Vec::with_capacity(routes.len());

    for (id, definition) in routes.iter() {
        let node = RouteNode::build(id, definition, parent, overlaps)?;

        if nodes.iter().any(|n| n.id == node.id) {
            return Err(ConfigError::DuplicateId { route: node.key.clone() });
        }

        for earlier in &nodes {
            if !earlier.pattern.overlaps(&node.pattern) {
                continue;
            }
            match overlaps {
                OverlapPolicy::Allow => {}
                OverlapPolicy::Warn => warn!(
                    "route '{}' ({}) is shadowed by '{}' ({}) for some paths",
                    node.key, node.path, earlier.key, earlier.path,
                ),
                OverlapPolicy::Deny => {
                    return Err(ConfigError::Overlap {
                        first: earlier.key.clone(),
                        first_path: earlier.path.clone(),
                        second: node.key.clone(),
                        second_path: node.path.clone(),
                    });
                }
            }
        }

        nodes.push(node);
    }

    Ok(nodes)
}

/// Build the runtime forest for a route tree.
pub(crate) fn build_forest(
    routes: &Routes,
    overlaps: OverlapPolicy,
) -> Result<Vec<Rc<RouteNode>>, ConfigError> {
    if routes.is_empty() {
        return Err(ConfigError::Empty);
    }
    build_level(routes, None, overlaps)
}
