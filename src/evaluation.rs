//! The evaluation driver.
//!
//! [`evaluate`] walks requirement trees against a course set and an override
//! set, recording the status of every node so that display layers can render
//! the whole tree without evaluating anything themselves.
//!
//! Evaluation is side-effect free, so independent roots are evaluated in
//! parallel and their results merged.

use std::{
    collections::{BTreeMap, btree_map},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{Catalog, Course, Overrides, Requirement, Status};

mod cache;
pub use cache::{CacheKey, EvaluationCache, fingerprint_courses, fingerprint_overrides};

/// The recorded outcome for one requirement node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeFulfillment {
    /// The node's status.
    pub status: Status,
    /// Whether the node is manually fulfilled.
    pub manual: bool,
    /// For multi-requirements, how many children are fulfilled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilled_children: Option<usize>,
}

/// Status of every visited requirement node, keyed by requirement id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FulfillmentMap(BTreeMap<String, NodeFulfillment>);

impl FulfillmentMap {
    /// The outcome recorded for `id`, if that node was visited.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NodeFulfillment> {
        self.0.get(id)
    }

    /// The status of `requirement`.
    ///
    /// # Panics
    ///
    /// Panics if `requirement` was not part of the evaluated trees. Asking
    /// for a node that was never evaluated is a programming error.
    #[must_use]
    pub fn status(&self, requirement: &Requirement) -> Status {
        self.get(requirement.id())
            .unwrap_or_else(|| panic!("requirement '{}' was not evaluated", requirement.id()))
            .status
    }

    /// Whether `requirement` is manually fulfilled.
    ///
    /// # Panics
    ///
    /// Panics if `requirement` was not part of the evaluated trees.
    #[must_use]
    pub fn is_manual(&self, requirement: &Requirement) -> bool {
        self.get(requirement.id())
            .unwrap_or_else(|| panic!("requirement '{}' was not evaluated", requirement.id()))
            .manual
    }

    /// Iterate over `(id, outcome)` pairs in id order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, NodeFulfillment> {
        self.0.iter()
    }

    /// Number of recorded nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count recorded nodes by status.
    #[must_use]
    pub fn count(&self, status: Status) -> usize {
        self.0.values().filter(|node| node.status == status).count()
    }

    fn record(&mut self, id: &str, fulfillment: NodeFulfillment) {
        self.0.insert(id.to_string(), fulfillment);
    }

    fn merge(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }
}

impl<'a> IntoIterator for &'a FulfillmentMap {
    type Item = (&'a String, &'a NodeFulfillment);
    type IntoIter = btree_map::Iter<'a, String, NodeFulfillment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Evaluate every node beneath `roots`.
///
/// Each node's status is what [`Requirement::is_fulfilled`] reports for it,
/// except for the children of a mutex requirement: those take the three-way
/// status of their parent's joint allocation.
#[instrument(level = "debug", skip_all, fields(courses = courses.len(), overrides = overrides.len()))]
pub fn evaluate<'r, I>(roots: I, courses: &[Course], overrides: &Overrides) -> FulfillmentMap
where
    I: IntoIterator<Item = &'r Requirement>,
{
    let roots: Vec<&Requirement> = roots.into_iter().collect();
    let map = roots
        .par_iter()
        .map(|root| {
            let mut map = FulfillmentMap::default();
            visit(root, courses, overrides, &mut map);
            map
        })
        .reduce(FulfillmentMap::default, FulfillmentMap::merge);
    debug!(roots = roots.len(), nodes = map.len(), "evaluated requirement trees");
    map
}

/// Record `node` and its subtree, returning whether `node` is fulfilled.
fn visit(
    node: &Requirement,
    courses: &[Course],
    overrides: &Overrides,
    map: &mut FulfillmentMap,
) -> bool {
    let (status, fulfilled_children) = match node {
        Requirement::Multi(multi) | Requirement::Poly(multi) => {
            let fulfilled = multi
                .requirements()
                .iter()
                .map(|child| visit(child, courses, overrides, map))
                .filter(|&fulfilled| fulfilled)
                .count();
            (Status::from(fulfilled >= multi.num_required()), Some(fulfilled))
        }
        Requirement::Mutex(mutex) => {
            let statuses = mutex.fulfillment_with(courses, overrides);
            for (child, &status) in mutex.requirements().iter().zip(&statuses) {
                map.record(
                    child.id(),
                    NodeFulfillment {
                        status,
                        manual: overrides.contains(child.id()),
                        fulfilled_children: None,
                    },
                );
            }
            let all = statuses.iter().all(|status| status.is_fulfilled());
            (Status::from(all), None)
        }
        Requirement::Standalone(_)
        | Requirement::Unit(_)
        | Requirement::Count(_)
        | Requirement::Plain(_) => (
            Status::from(node.is_fulfilled_with(courses, overrides)),
            None,
        ),
    };

    let manual = overrides.contains(node.id());
    let status = if manual { Status::Fulfilled } else { status };
    map.record(
        node.id(),
        NodeFulfillment {
            status,
            manual,
            fulfilled_children,
        },
    );
    status.is_fulfilled()
}

/// Evaluates a catalog, reusing results for course and override sets it has
/// already seen.
///
/// The cache sits behind a lock, so one evaluator can be shared by every
/// command run against a workspace.
#[derive(Debug)]
pub struct Evaluator {
    catalog: Arc<Catalog>,
    cache: Mutex<EvaluationCache>,
}

impl Evaluator {
    /// An evaluator with an empty cache.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            cache: Mutex::default(),
        }
    }

    /// The catalog being evaluated.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Evaluate every requirement in the catalog.
    pub fn evaluate(&self, courses: &[Course], overrides: &Overrides) -> Arc<FulfillmentMap> {
        let key = CacheKey::new(self.catalog.version(), courses, overrides);
        self.cache().get_or_insert_with(key, || {
            evaluate(self.catalog.requirements(), courses, overrides)
        })
    }

    /// The underlying cache.
    ///
    /// Entries are only inserted once an evaluation completes, so a poisoned
    /// lock still guards a consistent cache and is recovered.
    pub fn cache(&self) -> MutexGuard<'_, EvaluationCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
