//! Computing the next state of the route tree for a path, and applying it.
//!
//! Matching happens in two phases. [`plan_forest`] walks the tree against a candidate path and
//! builds a [`ForestPlan`]: the next state of every route, computed without touching any store.
//! [`ForestPlan::commit`] then writes those states into the stores, which publishes them.
//!
//! Among siblings the first route (in declaration order) that becomes active wins; every later
//! sibling is deactivated along with its whole subtree. A route that matches the path exactly is
//! the deepest active route and deactivates its children. A route that only matches a prefix is
//! active only if one of its children is; otherwise it is treated as not matching and the next
//! sibling gets its turn.
//!
//! Anything that did not change keeps its previous `Rc`. A match with the same exactness and the
//! same values for the parameters in scope is reused, and so is a state whose match and children
//! are all reused. Navigating to a path that changes nothing therefore publishes nothing.
//!
//! When a plan is committed, the subtree of a route is written in this order:
//!
//! 1. children that are being deactivated, in declaration order,
//! 2. the route itself,
//! 3. the remaining children, in declaration order.
//!
//! So a route's subscribers never see it active while a stale sibling subtree is still marked
//! active, and a deeper route being activated is always announced after its ancestors.
//!
//! Plans can be inspected from outside the crate but only the router commits them, always for
//! the whole forest at once:
//!
//! ```compile_fail
//! use tree_router::matcher::plan_node;
//! ```
//!
//! [`plan_forest`]: fn.plan_forest.html
//! [`ForestPlan`]: struct.ForestPlan.html
//! [`ForestPlan::commit`]: struct.ForestPlan.html#method.commit

use std::rc::Rc;
use log::trace;
use crate::node::{Match, NodeState, RouteNode, RouterState};
use crate::params::{self, Params};
use crate::pattern::Candidate;
use crate::store::{self, StateStore};

/// The pending next state of one route and its subtree.
pub struct MatchPlan {
    node: Rc<RouteNode>,
    previous: Rc<NodeState>,
    next: Rc<NodeState>,
    children: Vec<MatchPlan>,
}

impl MatchPlan {
    /// The route this plan is for.
    pub fn node(&self) -> &Rc<RouteNode> {
        &self.node
    }

    /// The id of the route among its siblings.
    pub fn node_id(&self) -> &str {
        self.node.id()
    }

    /// The state the route will have once committed.
    pub fn new_state(&self) -> &Rc<NodeState> {
        &self.next
    }

    /// Plans for the children.
    ///
    /// Empty for subtrees that were already inactive and stay that way.
    pub fn children(&self) -> &[MatchPlan] {
        &self.children
    }

    /// Whether committing will replace the route's state.
    pub fn is_changed(&self) -> bool {
        !Rc::ptr_eq(&self.previous, &self.next)
    }

    /// Whether the route will be active.
    pub fn is_active(&self) -> bool {
        self.next.matched().is_some()
    }

    fn is_deactivating(&self) -> bool {
        self.previous.matched().is_some() && self.next.matched().is_none()
    }

    /// Write the planned states into the route stores.
    ///
    /// Only reachable through [`ForestPlan::commit`], which also updates the sibling routes and
    /// the aggregate state.
    ///
    /// [`ForestPlan::commit`]: struct.ForestPlan.html#method.commit
    pub(crate) fn commit(self) {
        if !self.is_changed() {
            return;
        }

        let MatchPlan { node, next, children, .. } = self;
        let (leaving, rest): (Vec<_>, Vec<_>) = children
            .into_iter()
            .partition(|child: &MatchPlan| child.is_deactivating());

        for child in leaving {
            child.commit();
        }

        trace!("route '{}' -> {}", node.key(), describe(next.matched()));
        node.store().commit(next);

        for child in rest {
            child.commit();
        }
    }
}

/// The pending next state of the whole tree.
pub struct ForestPlan {
    previous: Rc<RouterState>,
    next: Rc<RouterState>,
    routes: Vec<MatchPlan>,
}

impl ForestPlan {
    /// The aggregate state once committed.
    pub fn new_state(&self) -> &Rc<RouterState> {
        &self.next
    }

    /// Plans for the top-level routes.
    pub fn routes(&self) -> &[MatchPlan] {
        &self.routes
    }

    /// Whether committing will change anything.
    pub fn is_changed(&self) -> bool {
        !Rc::ptr_eq(&self.previous, &self.next)
    }

    /// Write the planned states into the route stores and `root`.
    ///
    /// Top-level routes follow the same order as children of a route, with `root` in the
    /// position of the route itself.
    pub(crate) fn commit(self, root: &StateStore<RouterState>) {
        if !self.is_changed() {
            return;
        }

        let ForestPlan { next, routes, .. } = self;
        let (leaving, rest): (Vec<_>, Vec<_>) = routes
            .into_iter()
            .partition(|route: &MatchPlan| route.is_deactivating());

        for route in leaving {
            route.commit();
        }
        root.commit(next);
        for route in rest {
            route.commit();
        }
    }
}

fn describe(matched: Option<&Rc<Match>>) -> String {
    match matched {
        Some(m) => m.to_string(),
        None => "null".to_string(),
    }
}

/// Plan the next state of the top-level routes for `candidate`.
pub fn plan_forest(
    roots: &[Rc<RouteNode>],
    previous: Rc<RouterState>,
    candidate: &Candidate,
) -> ForestPlan {
    let routes = plan_siblings(roots, candidate);

    let unchanged = routes.iter().all(|r| !r.is_changed());
    let next = if unchanged {
        Rc::clone(&previous)
    }
    else {
        Rc::new(RouterState::new(states_of(&routes)))
    };

    ForestPlan { previous, next, routes }
}

fn states_of(plans: &[MatchPlan]) -> Vec<(String, Rc<NodeState>)> {
    plans
        .iter()
        .map(|p| (p.node_id().to_string(), Rc::clone(&p.next)))
        .collect()
}

fn plan_siblings(nodes: &[Rc<RouteNode>], candidate: &Candidate) -> Vec<MatchPlan> {
    let mut plans = Vec::with_capacity(nodes.len());
    let mut claimed = false;

    for node in nodes {
        let plan = if claimed {
            unmatch(node)
        }
        else {
            plan_node(node, candidate)
        };
        claimed |= plan.is_active();
        plans.push(plan);
    }

    plans
}

/// Plan the next state of one route for `candidate`.
pub(crate) fn plan_node(node: &Rc<RouteNode>, candidate: &Candidate) -> MatchPlan {
    if let Some(params) = node.test_exact(candidate) {
        let children = node.children().iter().map(unmatch).collect();
        return settle(node, true, &params, children);
    }

    if node.test_prefix(candidate).is_some() {
        let children = plan_siblings(node.children(), candidate);
        let deepest = children
            .iter()
            .find_map(|c| c.next.matched())
            .map(|m| m.params.clone().unwrap_or_default());

        if let Some(params) = deepest {
            return settle(node, false, &params, children);
        }
    }

    unmatch(node)
}

/// Plan the deactivation of a route and its subtree.
pub(crate) fn unmatch(node: &Rc<RouteNode>) -> MatchPlan {
    let previous = node.store().current();

    // inactive routes have inactive subtrees
    if previous.matched().is_none() {
        return MatchPlan {
            node: Rc::clone(node),
            next: Rc::clone(&previous),
            previous,
            children: vec![],
        };
    }

    let children: Vec<MatchPlan> = node.children().iter().map(unmatch).collect();
    let next = next_state(&previous, None, &children);
    MatchPlan { node: Rc::clone(node), previous, next, children }
}

fn settle(node: &Rc<RouteNode>, exact: bool, bound: &Params, children: Vec<MatchPlan>) -> MatchPlan {
    let previous = node.store().current();
    let scope = node.scope();

    let params = if scope.is_empty() {
        None
    }
    else {
        Some(params::restrict(scope, bound))
    };

    let matched = match previous.matched() {
        Some(m) if m.exact == exact && params::equal(scope, m.params.as_ref(), params.as_ref()) => {
            Rc::clone(m)
        }
        _ => Rc::new(Match { exact, params }),
    };

    let next = next_state(&previous, Some(matched), &children);
    MatchPlan { node: Rc::clone(node), previous, next, children }
}

fn next_state(
    previous: &Rc<NodeState>,
    matched: Option<Rc<Match>>,
    children: &[MatchPlan],
) -> Rc<NodeState> {
    let reuse = store::same_match(previous.matched(), matched.as_ref())
        && children.iter().all(|c| !c.is_changed());

    if reuse {
        Rc::clone(previous)
    }
    else {
        Rc::new(NodeState::new(matched, states_of(children)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::build_forest;
    use crate::route::{route, Routes};
    use crate::router::OverlapPolicy;

    fn forest() -> Vec<Rc<RouteNode>> {
        let routes = Routes::new()
            .with("home", route().path("/"))
            .with(
                "user",
                route()
                    .path("/user/:userId")
                    .params(["userId"])
                    .nested("profile", route())
                    .nested("post", route().path("/post/:postId").params(["postId"])),
            )
            .with("other", route());
        build_forest(&routes, OverlapPolicy::Allow).expect("forest")
    }

    fn initial(roots: &[Rc<RouteNode>]) -> Rc<RouterState> {
        Rc::new(RouterState::new(
            roots
                .iter()
                .map(|r| (r.id().to_string(), r.store().current()))
                .collect(),
        ))
    }

    fn apply(roots: &[Rc<RouteNode>], root: &StateStore<RouterState>, url: &str) {
        plan_forest(roots, root.current(), &Candidate::parse(url)).commit(root);
    }

    fn assert_in_step(node: &Rc<RouteNode>, state: &Rc<NodeState>) {
        assert!(Rc::ptr_eq(&node.store().current(), state), "'{}' is out of step", node.key());
        for child in node.children() {
            let child_state = state.child(child.id()).expect("child state");
            assert!(Rc::ptr_eq(&child.store().current(), child_state));
            assert_in_step(child, child_state);
        }
    }

    #[test]
    fn forest_commit_keeps_aggregate_in_step_with_routes() {
        let roots = forest();
        let root = StateStore::new(initial(&roots));

        for url in &["/", "/user/1/post/2", "/user/1", "/other", "/user/2/profile", "/nowhere"] {
            apply(&roots, &root, url);
            let state = root.current();
            let active = state.routes().filter(|(_, s)| s.is_matching()).count();
            assert!(active <= 1, "{} activated {} siblings", url, active);
            for node in &roots {
                assert_in_step(node, state.route(node.id()).expect("route state"));
            }
        }
    }

    #[test]
    fn planning_does_not_touch_stores() {
        let roots = forest();
        let before = roots[1].store().current();
        let plan = plan_forest(&roots, initial(&roots), &Candidate::parse("/user/1"));
        assert!(plan.is_changed());
        assert!(plan.routes()[1].is_active());
        assert!(Rc::ptr_eq(&before, &roots[1].store().current()));
    }

    #[test]
    fn exact_and_pass_through() {
        let roots = forest();
        let root = StateStore::new(initial(&roots));

        apply(&roots, &root, "/user/1/post/2");
        let state = root.current();
        assert_eq!(
            state.route("user").map(|s| s.to_string()).unwrap_or_default(),
            r#"{ match: { exact: false, params: { userId: "1" } }, profile: { match: null }, post: { match: { exact: true, params: { postId: "2", userId: "1" } } } }"#,
        );
        assert_eq!(state.route("home").map(|s| s.is_matching()), Some(false));

        apply(&roots, &root, "/user/1");
        let user = roots[1].store().current();
        assert!(user.is_matching_exact());
        assert_eq!(user.child("post").map(|s| s.is_matching()), Some(false));
    }

    #[test]
    fn dead_end_prefix_lets_next_sibling_win() {
        let roots = forest();
        let root = StateStore::new(initial(&roots));
        apply(&roots, &root, "/other");
        let state = root.current();
        assert_eq!(state.route("home").map(|s| s.is_matching()), Some(false));
        assert_eq!(state.route("other").map(|s| s.is_matching_exact()), Some(true));
    }

    #[test]
    fn only_first_of_many_matching_siblings_wins() {
        let routes = Routes::new()
            .with("any", route().path("/x/:id").params(["id"]))
            .with("y", route().path("/y"))
            .with("z", route().path("/x/z"));
        let roots = build_forest(&routes, OverlapPolicy::Allow).expect("forest");
        let root = StateStore::new(initial(&roots));
        apply(&roots, &root, "/x/z");
        let active: Vec<_> = root
            .current()
            .routes()
            .filter(|(_, s)| s.is_matching())
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(active, vec!["any"]);
    }

    #[test]
    fn unchanged_navigation_reuses_everything() {
        let roots = forest();
        let root = StateStore::new(initial(&roots));
        apply(&roots, &root, "/user/1/post/2");
        let before = root.current();

        let plan = plan_forest(&roots, root.current(), &Candidate::parse("/user/1/post/2"));
        assert!(!plan.is_changed());
        assert!(Rc::ptr_eq(plan.new_state(), &before));
    }

    #[test]
    fn unrelated_param_change_keeps_parent_match() {
        let roots = forest();
        let root = StateStore::new(initial(&roots));
        apply(&roots, &root, "/user/1/post/2");
        let user_match = roots[1].store().current().matched().cloned();

        apply(&roots, &root, "/user/1/post/3");
        let user = roots[1].store().current();
        assert!(store::same_match(user.matched(), user_match.as_ref()));
        let post = user.child("post").and_then(|s| s.matched().cloned());
        assert_eq!(post.and_then(|m| m.param("postId").map(String::from)), Some("3".to_string()));
    }

    #[test]
    fn no_match_deactivates_everything() {
        let roots = forest();
        let root = StateStore::new(initial(&roots));
        apply(&roots, &root, "/user/1/post/2");
        apply(&roots, &root, "/nowhere");
        for (_, state) in root.current().routes() {
            assert!(!state.is_matching());
            for (_, child) in state.children() {
                assert!(!child.is_matching());
            }
        }
    }
}
