//! Declaring a route tree.
//!
//! A route tree is a [`Routes`] collection of named [`RouteDefinition`]s. Definitions are authored
//! with the [`route`] builder:
//!
//! ```
//! use tree_router::route::{route, Routes};
//!
//! let routes = Routes::new()
//!     .with("home", route().path("/"))
//!     .with("user", route()
//!         .path("/user/:userId")
//!         .params(["userId"])
//!         .nested("post", route().path("/post/:postId").params(["postId"])));
//!
//! assert_eq!(routes.len(), 2);
//! ```
//!
//! A route without a path segment defaults to `/` followed by its id. Definitions are only
//! checked when a router is built from them.
//!
//! [`Routes`]: struct.Routes.html
//! [`RouteDefinition`]: enum.RouteDefinition.html
//! [`route`]: fn.route.html

use std::iter::FromIterator;

/// The shape of a single declared route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDefinition {
    /// A route with no children and no parameters.
    Leaf {
        /// Path segment, relative to the parent route.
        path: Option<String>,
    },
    /// A route with no children that binds parameters.
    LeafWithParams {
        /// Path segment, relative to the parent route.
        path: Option<String>,
        /// Names of the parameters this route binds.
        params: Vec<String>,
    },
    /// A route with nested routes.
    Branch {
        /// Path segment, relative to the parent route.
        path: Option<String>,
        /// Nested routes, in declaration order.
        children: Routes,
    },
    /// A route with nested routes that binds parameters.
    BranchWithParams {
        /// Path segment, relative to the parent route.
        path: Option<String>,
        /// Names of the parameters this route binds.
        params: Vec<String>,
        /// Nested routes, in declaration order.
        children: Routes,
    },
}

/// Start declaring a route.
pub fn route() -> RouteDefinition {
    RouteDefinition::Leaf { path: None }
}

impl Default for RouteDefinition {
    fn default() -> Self {
        route()
    }
}

impl RouteDefinition {
    /// Set the path segment of this route.
    pub fn path(mut self, segment: impl Into<String>) -> Self {
        let segment = Some(segment.into());
        match &mut self {
            RouteDefinition::Leaf { path }
            | RouteDefinition::LeafWithParams { path, .. }
            | RouteDefinition::Branch { path, .. }
            | RouteDefinition::BranchWithParams { path, .. } => *path = segment,
        }
        self
    }

    /// Declare the parameters this route binds, replacing any declared before.
    pub fn params<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params: Vec<String> = names.into_iter().map(Into::into).collect();
        match self {
            RouteDefinition::Leaf { path }
            | RouteDefinition::LeafWithParams { path, .. } => {
                RouteDefinition::LeafWithParams { path, params }
            }
            RouteDefinition::Branch { path, children }
            | RouteDefinition::BranchWithParams { path, children, .. } => {
                RouteDefinition::BranchWithParams { path, params, children }
            }
        }
    }

    /// Nest a child route under this one.
    pub fn nested(self, id: impl Into<String>, child: RouteDefinition) -> Self {
        match self {
            RouteDefinition::Leaf { path } => RouteDefinition::Branch {
                path,
                children: Routes::new().with(id, child),
            },
            RouteDefinition::LeafWithParams { path, params } => RouteDefinition::BranchWithParams {
                path,
                params,
                children: Routes::new().with(id, child),
            },
            RouteDefinition::Branch { path, children } => RouteDefinition::Branch {
                path,
                children: children.with(id, child),
            },
            RouteDefinition::BranchWithParams { path, params, children } => {
                RouteDefinition::BranchWithParams {
                    path,
                    params,
                    children: children.with(id, child),
                }
            }
        }
    }

    /// The declared path segment, if any.
    pub fn segment(&self) -> Option<&str> {
        match self {
            RouteDefinition::Leaf { path }
            | RouteDefinition::LeafWithParams { path, .. }
            | RouteDefinition::Branch { path, .. }
            | RouteDefinition::BranchWithParams { path, .. } => path.as_ref().map(|p| p.as_str()),
        }
    }

    /// The declared parameter names.
    pub fn param_names(&self) -> &[String] {
        match self {
            RouteDefinition::LeafWithParams { params, .. }
            | RouteDefinition::BranchWithParams { params, .. } => params,
            RouteDefinition::Leaf { .. } | RouteDefinition::Branch { .. } => &[],
        }
    }

    /// The nested routes, for branches.
    pub fn children(&self) -> Option<&Routes> {
        match self {
            RouteDefinition::Branch { children, .. }
            | RouteDefinition::BranchWithParams { children, .. } => Some(children),
            RouteDefinition::Leaf { .. } | RouteDefinition::LeafWithParams { .. } => None,
        }
    }

    /// Whether this definition uses one of the params variants.
    pub fn has_params(&self) -> bool {
        match self {
            RouteDefinition::LeafWithParams { .. } | RouteDefinition::BranchWithParams { .. } => true,
            RouteDefinition::Leaf { .. } | RouteDefinition::Branch { .. } => false,
        }
    }
}

/// An ordered collection of named routes.
///
/// Order matters: when two sibling routes both match a path, the one declared first wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Routes(Vec<(String, RouteDefinition)>);

impl Routes {
    /// An empty collection.
    pub fn new() -> Self {
        Routes(vec![])
    }

    /// Add a route, builder style.
    pub fn with(mut self, id: impl Into<String>, definition: RouteDefinition) -> Self {
        self.push(id, definition);
        self
    }

    /// Add a route.
    pub fn push(&mut self, id: impl Into<String>, definition: RouteDefinition) {
        self.0.push((id.into(), definition));
    }

    /// Iterate over routes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteDefinition)> + '_ {
        self.0.iter().map(|(id, def)| (id.as_str(), def))
    }

    /// Number of routes at this level.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no routes at this level.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, RouteDefinition)> for Routes {
    fn from_iter<I: IntoIterator<Item = (S, RouteDefinition)>>(iter: I) -> Self {
        Routes(iter.into_iter().map(|(id, def)| (id.into(), def)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_moves_between_variants() {
        assert_eq!(route(), RouteDefinition::Leaf { path: None });

        let leaf = route().path("/a").params(["x"]);
        assert_eq!(
            leaf,
            RouteDefinition::LeafWithParams {
                path: Some("/a".to_string()),
                params: vec!["x".to_string()],
            },
        );

        let branch = leaf.nested("b", route());
        assert!(branch.has_params());
        assert_eq!(branch.segment(), Some("/a"));
        assert_eq!(branch.param_names(), &["x".to_string()]);
        assert_eq!(branch.children().map(Routes::len), Some(1));
    }

    #[test]
    fn params_after_nested_keeps_children() {
        let def = route().nested("a", route()).nested("b", route()).params(["id"]);
        let ids: Vec<_> = def
            .children()
            .map(|c| c.iter().map(|(id, _)| id.to_string()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(def.has_params());
    }

    #[test]
    fn routes_keep_declaration_order() {
        let routes: Routes = vec![("z", route()), ("a", route())].into_iter().collect();
        let ids: Vec<_> = routes.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["z", "a"]);
    }
}
