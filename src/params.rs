//! Parameter maps and the comparison that decides whether they changed.

use std::collections::BTreeMap;

/// Parameter values bound by a match, keyed by parameter name.
pub type Params = BTreeMap<String, String>;

/// Build a parameter map from borrowed pairs.
pub fn from_pairs(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Keep only the entries of `params` whose names are in `names`.
pub fn restrict(names: &[String], params: &Params) -> Params {
    names
        .iter()
        .filter_map(|name| params.get(name).map(|value| (name.clone(), value.clone())))
        .collect()
}

/// Outcome of [`reconcile`].
///
/// [`reconcile`]: fn.reconcile.html
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<'a> {
    /// Whether any watched parameter differs.
    pub changed: bool,
    /// The map to keep: the previous one when nothing changed, otherwise the new one.
    pub merged: &'a Params,
}

/// Compare two parameter maps over the names in `watched`.
///
/// Only the watched names matter. Keys outside of `watched` never count as a change, and an empty
/// `watched` set never changes. When nothing changed the previous map is handed back so the caller
/// can keep the same allocation (and the same `Rc` around it).
pub fn reconcile<'a>(watched: &[String], previous: &'a Params, next: &'a Params) -> Reconciled<'a> {
    let changed = watched
        .iter()
        .any(|name| previous.get(name) != next.get(name));

    Reconciled {
        changed,
        merged: if changed { next } else { previous },
    }
}

/// Whether two optional maps agree on every watched name.
pub fn equal(watched: &[String], previous: Option<&Params>, next: Option<&Params>) -> bool {
    let empty = Params::new();
    let previous = previous.unwrap_or(&empty);
    let next = next.unwrap_or(&empty);
    !reconcile(watched, previous, next).changed
}
