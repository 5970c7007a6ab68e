//! Errors raised while declaring, building, and navigating a route tree.

use thiserror::Error;

/// A path pattern could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `:` or `*` token with no name after it.
    #[error("empty parameter name in pattern '{pattern}'")]
    EmptyName {
        /// The offending pattern.
        pattern: String,
    },

    /// A splat token that is not the final path segment.
    #[error("splat '*{name}' must be the last segment of '{pattern}'")]
    SplatNotLast {
        /// The offending pattern.
        pattern: String,
        /// The splat name.
        name: String,
    },

    /// The same token name appears twice in one pattern.
    #[error("parameter '{name}' appears more than once in '{pattern}'")]
    DuplicateToken {
        /// The offending pattern.
        pattern: String,
        /// The repeated token.
        name: String,
    },

    /// Path patterns are absolute.
    #[error("pattern '{pattern}' must start with '/'")]
    NotAbsolute {
        /// The offending pattern.
        pattern: String,
    },
}

/// A route declaration is inconsistent and no router can be built from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The route tree has no routes at all.
    #[error("route tree is empty")]
    Empty,

    /// A branch was declared without any children.
    #[error("route '{route}' is a branch with no children")]
    EmptyBranch {
        /// Dotted id of the route.
        route: String,
    },

    /// A route declared a params variant with an empty parameter list.
    #[error("route '{route}' declares params but lists none")]
    EmptyParams {
        /// Dotted id of the route.
        route: String,
    },

    /// Route ids are used to build default path segments and lookups.
    #[error("invalid route id '{id}'")]
    InvalidId {
        /// The rejected id.
        id: String,
    },

    /// Two siblings share an id.
    #[error("duplicate route id '{route}'")]
    DuplicateId {
        /// Dotted id of the second route.
        route: String,
    },

    /// The segment of a route failed to compile.
    #[error("route '{route}': {source}")]
    Pattern {
        /// Dotted id of the route.
        route: String,
        /// The compile error.
        source: PatternError,
    },

    /// The path segment contains a token missing from the declared params.
    #[error("route '{route}' uses parameter '{param}' without declaring it")]
    UndeclaredToken {
        /// Dotted id of the route.
        route: String,
        /// The token name.
        param: String,
    },

    /// A declared param does not appear in the route's own segment.
    #[error("route '{route}' declares parameter '{param}' that its path never binds")]
    UnboundParam {
        /// Dotted id of the route.
        route: String,
        /// The parameter name.
        param: String,
    },

    /// A descendant re-declared a parameter an ancestor already binds.
    #[error("route '{route}' redeclares parameter '{param}' bound by an ancestor")]
    ShadowedParam {
        /// Dotted id of the route.
        route: String,
        /// The parameter name.
        param: String,
    },

    /// Two siblings can both exactly match one path.
    #[error("routes '{first}' and '{second}' overlap ('{first_path}' vs '{second_path}')")]
    Overlap {
        /// Dotted id of the route declared first.
        first: String,
        /// Full pattern of the first route.
        first_path: String,
        /// Dotted id of the route declared second.
        second: String,
        /// Full pattern of the second route.
        second_path: String,
    },
}

/// A url could not be built from a pattern and a parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A path token has no bound value.
    #[error("missing parameter '{param}' for '{pattern}'")]
    MissingParam {
        /// The pattern being built.
        pattern: String,
        /// The unbound token.
        param: String,
    },
}

/// The navigation source failed to perform an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A browser object (window, history, location) was unavailable.
    #[error("{0} is not available")]
    Unavailable(&'static str),

    /// A browser call threw.
    #[error("{call} failed: {message}")]
    Js {
        /// The browser API that failed.
        call: &'static str,
        /// Debug rendering of the thrown value.
        message: String,
    },
}

/// Errors returned from imperative navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The url could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The navigation source refused the url.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Navigation was requested while a commit was being published and the
    /// router rejects reentrant navigation.
    #[error("navigation to '{route}' requested while a commit is in progress")]
    Reentrant {
        /// Dotted id of the route that was pushed.
        route: String,
    },
}
