use std::cmp::Ordering;
use std::collections::HashSet;

use crate::path;
use crate::value::{compare_values, format_literal, quote_ident, values_equal, Value};

/// A parsed predicate tree.
///
/// `push_down` mutates the node in place: fully-resolved subtrees collapse
/// to [`Predicate::True`] so a caller can drop them from a parent's residual
/// children, and partially-resolved `And`/`ImplicitAnd` nodes keep only the
/// children that did not push as their new child list. This mirrors the
/// source's destructive `_selectors` mutation without reaching for shared
/// mutable state: each node owns its children outright.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equal(String, Value),
    NotEqual(String, Value),
    GreaterThan(String, Value),
    GreaterThanOrEqual(String, Value),
    LessThan(String, Value),
    LessThanOrEqual(String, Value),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    ImplicitAnd(Vec<Predicate>),
    /// Sentinel for a subtree that has been fully pushed down to SQL.
    /// `match` always returns `true`; never produced by the parser.
    True,
}

impl Predicate {
    /// In-memory evaluation against a document.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Predicate::Equal(field, v) => values_equal(&path::get(doc, field), v),
            Predicate::NotEqual(field, v) => !values_equal(&path::get(doc, field), v),
            Predicate::GreaterThan(field, v) => {
                ordered_matches(doc, field, v, |ord| ord == Ordering::Greater)
            }
            Predicate::GreaterThanOrEqual(field, v) => {
                ordered_matches(doc, field, v, |ord| ord != Ordering::Less)
            }
            Predicate::LessThan(field, v) => {
                ordered_matches(doc, field, v, |ord| ord == Ordering::Less)
            }
            Predicate::LessThanOrEqual(field, v) => {
                ordered_matches(doc, field, v, |ord| ord != Ordering::Greater)
            }
            Predicate::And(children) | Predicate::ImplicitAnd(children) => {
                children.iter().all(|c| c.matches(doc))
            }
            Predicate::Or(children) => children.iter().any(|c| c.matches(doc)),
            Predicate::True => true,
        }
    }

    /// Attempts to push this predicate down into a SQL `WHERE` fragment
    /// against `indexed_fields`. Mutates `self` so that whatever portion was
    /// pushed is removed from the residual; returns the fragment, if any.
    pub fn push_down(&mut self, indexed_fields: &HashSet<String>) -> Option<String> {
        // Leaf arms only borrow `field`/`v` long enough to build an owned
        // fragment; `self` is reassigned afterward, once those borrows have
        // ended, rather than threaded into a helper alongside them.
        let fragment = match self {
            Predicate::Equal(field, v) if indexed_fields.contains(field.as_str()) => {
                Some(leaf_fragment(field, v, "="))
            }
            Predicate::NotEqual(field, v) if indexed_fields.contains(field.as_str()) => {
                Some(leaf_fragment(field, v, "!="))
            }
            Predicate::GreaterThan(field, v) if indexed_fields.contains(field.as_str()) => {
                Some(leaf_fragment(field, v, ">"))
            }
            Predicate::GreaterThanOrEqual(field, v) if indexed_fields.contains(field.as_str()) => {
                Some(leaf_fragment(field, v, ">="))
            }
            Predicate::LessThan(field, v) if indexed_fields.contains(field.as_str()) => {
                Some(leaf_fragment(field, v, "<"))
            }
            Predicate::LessThanOrEqual(field, v) if indexed_fields.contains(field.as_str()) => {
                Some(leaf_fragment(field, v, "<="))
            }
            Predicate::Equal(_, _)
            | Predicate::NotEqual(_, _)
            | Predicate::GreaterThan(_, _)
            | Predicate::GreaterThanOrEqual(_, _)
            | Predicate::LessThan(_, _)
            | Predicate::LessThanOrEqual(_, _) => None,
            Predicate::And(_) | Predicate::ImplicitAnd(_) => {
                return and_push_down(self, indexed_fields)
            }
            Predicate::Or(_) => return or_push_down(self, indexed_fields),
            Predicate::True => None,
        };
        if fragment.is_some() {
            *self = Predicate::True;
        }
        fragment
    }
}

fn leaf_fragment(field: &str, value: &Value, op: &str) -> String {
    format!("{} {} {}", quote_ident(field), op, format_literal(value))
}

/// An absent/`Null` field never satisfies an ordered comparison, matching
/// SQL's `NULL op value` evaluating to unknown (never true) rather than the
/// total order's `Null`-ranks-lowest convention used for sorting.
fn ordered_matches(doc: &Value, field: &str, v: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let actual = path::get(doc, field);
    if matches!(actual, Value::Null) {
        return false;
    }
    accept(compare_values(&actual, v))
}

/// `And`/`ImplicitAnd`: conjunction of whatever children pushed down.
/// Children that fully resolved (became `True`) are dropped; children that
/// only partially resolved themselves (nested `And`s) are kept, still
/// contributing their own partial fragment.
fn and_push_down(node: &mut Predicate, indexed_fields: &HashSet<String>) -> Option<String> {
    let children = match node {
        Predicate::And(c) | Predicate::ImplicitAnd(c) => c,
        _ => unreachable!("and_push_down called on non-And node"),
    };

    let mut fragments = Vec::new();
    let mut residual = Vec::with_capacity(children.len());
    for mut child in std::mem::take(children) {
        if let Some(fragment) = child.push_down(indexed_fields) {
            fragments.push(fragment);
        }
        if !matches!(child, Predicate::True) {
            residual.push(child);
        }
    }

    match node {
        Predicate::And(c) | Predicate::ImplicitAnd(c) => *c = residual,
        _ => unreachable!(),
    }

    if fragments.is_empty() {
        return None;
    }
    // A lone fragment is emitted bare (matches the source's single-condition
    // `WHERE` strings exactly); two or more are parenthesized to protect
    // precedence when this fragment is itself embedded in a parent OR.
    let joined = if fragments.len() == 1 {
        fragments.into_iter().next().expect("len == 1")
    } else {
        fragments
            .iter()
            .map(|f| format!("({f})"))
            .collect::<Vec<_>>()
            .join(" AND ")
    };
    let is_fully_resolved = matches!(node, Predicate::And(c) | Predicate::ImplicitAnd(c) if c.is_empty());
    if is_fully_resolved {
        *node = Predicate::True;
    }
    Some(joined)
}

/// `Or`: all-or-nothing. Every child must fully resolve (no residual of its
/// own) for the whole node to push down; otherwise the entire `Or` is left
/// untouched and stays fully residual.
fn or_push_down(node: &mut Predicate, indexed_fields: &HashSet<String>) -> Option<String> {
    let children = match node {
        Predicate::Or(c) => c,
        _ => unreachable!("or_push_down called on non-Or node"),
    };

    // Probe on a clone so a partial, non-qualifying push never mutates the
    // real node — the source leaves a failed Or entirely untouched.
    let mut probe = children.clone();
    let mut fragments = Vec::with_capacity(probe.len());
    let mut all_resolved = true;
    for child in probe.iter_mut() {
        let fragment = child.push_down(indexed_fields);
        match (fragment, matches!(child, Predicate::True)) {
            (Some(fragment), true) => fragments.push(fragment),
            _ => {
                all_resolved = false;
                break;
            }
        }
    }

    if all_resolved {
        let joined = fragments
            .iter()
            .map(|f| format!("({f})"))
            .collect::<Vec<_>>()
            .join(" OR ");
        *node = Predicate::True;
        Some(joined)
    } else {
        None
    }
}
