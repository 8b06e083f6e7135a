//! The requirement catalog: every goal, its inheritance hierarchy, and the
//! requirement trees beneath it.
//!
//! A [`Catalog`] knows nothing about files. It is built once, validated on
//! construction, and immutable thereafter.

use std::collections::{HashMap, HashSet};

use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graphmap::DiGraphMap,
};
use thiserror::Error;

use crate::domain::{Goal, GoalKind, Requirement};

/// Structural problems that make a set of goals unusable as a catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Two goals share an id.
    #[error("duplicate goal '{0}'")]
    DuplicateGoal(String),

    /// Two requirement nodes share an id.
    #[error("duplicate requirement '{id}' (in goal '{goal}')")]
    DuplicateRequirement {
        /// The repeated requirement id.
        id: String,
        /// The goal in which the repeat was found.
        goal: String,
    },

    /// A goal names a parent that does not exist.
    #[error("goal '{goal}' has unknown parent '{parent}'")]
    UnknownParent {
        /// The goal declaring the parent.
        goal: String,
        /// The missing parent id.
        parent: String,
    },

    /// Goals inherit from each other in a loop.
    #[error("goal hierarchy contains a cycle: {}", .0.join(" -> "))]
    GoalCycle(Vec<String>),
}

/// A validated collection of goals.
#[derive(Debug, Clone)]
pub struct Catalog {
    goals: Vec<Goal>,
    index: HashMap<String, usize>,
    /// Edges point from child goal to parent goal.
    hierarchy: DiGraphMap<usize, ()>,
    version: String,
}

impl Catalog {
    /// Validate `goals` and assemble them into a catalog.
    ///
    /// `version` identifies the source the goals were built from; it is part
    /// of evaluation cache keys.
    ///
    /// # Errors
    ///
    /// Returns an error if goal ids or requirement ids repeat, if a goal
    /// names an unknown parent, or if the parent links form a cycle.
    pub fn new(goals: Vec<Goal>, version: impl Into<String>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(goals.len());
        for (position, goal) in goals.iter().enumerate() {
            if index.insert(goal.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateGoal(goal.id.clone()));
            }
        }

        let mut seen = HashSet::new();
        for goal in &goals {
            for node in goal.requirements().flat_map(Requirement::walk) {
                if !seen.insert(node.id()) {
                    return Err(CatalogError::DuplicateRequirement {
                        id: node.id().to_string(),
                        goal: goal.id.clone(),
                    });
                }
            }
        }

        let mut hierarchy = DiGraphMap::with_capacity(goals.len(), goals.len());
        for (position, goal) in goals.iter().enumerate() {
            hierarchy.add_node(position);
            if let Some(parent) = &goal.parent {
                let Some(&parent_position) = index.get(parent) else {
                    return Err(CatalogError::UnknownParent {
                        goal: goal.id.clone(),
                        parent: parent.clone(),
                    });
                };
                hierarchy.add_edge(position, parent_position, ());
            }
        }

        if is_cyclic_directed(&hierarchy) {
            let cycle = tarjan_scc(&hierarchy)
                .into_iter()
                .find(|component| {
                    component.len() > 1 || hierarchy.contains_edge(component[0], component[0])
                })
                .unwrap_or_default();
            return Err(CatalogError::GoalCycle(
                cycle
                    .into_iter()
                    .map(|position| goals[position].id.clone())
                    .collect(),
            ));
        }

        Ok(Self {
            goals,
            index,
            hierarchy,
            version: version.into(),
        })
    }

    /// An identifier of the catalog source.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All goals, in load order.
    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Look up a goal by id.
    #[must_use]
    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.index.get(id).map(|&position| &self.goals[position])
    }

    /// The parent of a goal, if it has one.
    #[must_use]
    pub fn parent(&self, goal: &Goal) -> Option<&Goal> {
        let position = *self.index.get(&goal.id)?;
        self.hierarchy
            .neighbors(position)
            .next()
            .map(|parent| &self.goals[parent])
    }

    /// The goal followed by each of its ancestors, nearest first.
    ///
    /// Empty if `id` is not a known goal.
    #[must_use]
    pub fn lineage(&self, id: &str) -> Vec<&Goal> {
        let mut lineage = Vec::new();
        let mut current = self.goal(id);
        while let Some(goal) = current {
            lineage.push(goal);
            current = self.parent(goal);
        }
        lineage
    }

    /// Every goal a student pursuing `selected` must satisfy: the selected
    /// goals and all of their ancestors, each once, outermost ancestor first.
    #[must_use]
    pub fn requirement_sets<'a, I>(&self, selected: I) -> Vec<&Goal>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let mut sets = Vec::new();
        for id in selected {
            for goal in self.lineage(id).into_iter().rev() {
                if seen.insert(goal.id.as_str()) {
                    sets.push(goal);
                }
            }
        }
        sets
    }

    /// Goals of the given kind whose id or name contains `prompt`, or one of
    /// whose ancestors does.
    #[must_use]
    pub fn search(&self, prompt: &str, kind: Option<GoalKind>) -> Vec<&Goal> {
        self.goals
            .iter()
            .filter(|goal| kind.is_none_or(|kind| goal.kind == kind))
            .filter(|goal| {
                self.lineage(&goal.id)
                    .iter()
                    .any(|ancestor| ancestor.matches(prompt))
            })
            .collect()
    }

    /// Find any requirement node, at any depth, by id.
    #[must_use]
    pub fn requirement(&self, id: &str) -> Option<&Requirement> {
        self.requirements()
            .flat_map(Requirement::walk)
            .find(|node| node.id() == id)
    }

    /// Every requirement root in the catalog.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.goals.iter().flat_map(Goal::requirements)
    }

    /// The goal whose tree contains the requirement `id`.
    #[must_use]
    pub fn goal_of(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|goal| {
            goal.requirements()
                .flat_map(Requirement::walk)
                .any(|node| node.id() == id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, PlainRequirement};

    fn plain(id: &str) -> Requirement {
        Requirement::Plain(PlainRequirement::new(id, id.to_uppercase()))
    }

    fn goal(id: &str, name: &str, kind: GoalKind, requirements: &[&str]) -> Goal {
        Goal::new(
            id,
            name,
            kind,
            vec![Category::new(
                format!("{id}-category"),
                "Category",
                requirements.iter().map(|id| plain(id)).collect(),
            )],
        )
    }

    fn berkeley() -> Catalog {
        Catalog::new(
            vec![
                goal("uc", "University of California", GoalKind::Other, &["elwr"]),
                goal("ucb", "UC Berkeley", GoalKind::Other, &["ac"]).with_parent("uc"),
                goal("coe", "College of Engineering", GoalKind::Other, &["coe-r1a"])
                    .with_parent("ucb"),
                goal("eecs", "EECS Major", GoalKind::Major, &["math1a"]).with_parent("coe"),
                goal("ls", "College of Letters and Sciences", GoalKind::Other, &["ls-r1a"])
                    .with_parent("ucb"),
                goal("linguis", "Linguistics Major", GoalKind::Major, &["linguis100"])
                    .with_parent("ls"),
            ],
            "test",
        )
        .unwrap()
    }

    #[test]
    fn lineage_walks_up_to_root() {
        let catalog = berkeley();
        let ids: Vec<_> = catalog.lineage("eecs").iter().map(|g| g.id()).collect();
        assert_eq!(ids, ["eecs", "coe", "ucb", "uc"]);
        assert!(catalog.lineage("missing").is_empty());
    }

    #[test]
    fn requirement_sets_share_ancestors_once() {
        let catalog = berkeley();
        let ids: Vec<_> = catalog
            .requirement_sets(["eecs", "linguis"])
            .iter()
            .map(|g| g.id())
            .collect();
        assert_eq!(ids, ["uc", "ucb", "coe", "eecs", "ls", "linguis"]);
    }

    #[test]
    fn search_matches_through_ancestors() {
        let catalog = berkeley();
        let majors: Vec<_> = catalog
            .search("engineering", Some(GoalKind::Major))
            .iter()
            .map(|g| g.id())
            .collect();
        assert_eq!(majors, ["eecs"]);

        let everything_at_berkeley = catalog.search("berkeley", None);
        assert_eq!(everything_at_berkeley.len(), 5);
    }

    #[test]
    fn finds_requirements_at_any_depth() {
        let catalog = berkeley();
        assert_eq!(catalog.requirement("ac").unwrap().name(), "AC");
        assert_eq!(catalog.goal_of("math1a").unwrap().id(), "eecs");
        assert!(catalog.requirement("nope").is_none());
    }

    #[test]
    fn rejects_duplicate_requirement_ids() {
        let error = Catalog::new(
            vec![
                goal("a", "A", GoalKind::Major, &["x"]),
                goal("b", "B", GoalKind::Major, &["x"]),
            ],
            "test",
        )
        .unwrap_err();
        assert_eq!(
            error,
            CatalogError::DuplicateRequirement {
                id: "x".to_string(),
                goal: "b".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_parent() {
        let error = Catalog::new(
            vec![goal("a", "A", GoalKind::Major, &[]).with_parent("ghost")],
            "test",
        )
        .unwrap_err();
        assert!(matches!(error, CatalogError::UnknownParent { .. }));
    }

    #[test]
    fn rejects_parent_cycles() {
        let error = Catalog::new(
            vec![
                goal("a", "A", GoalKind::Other, &[]).with_parent("b"),
                goal("b", "B", GoalKind::Other, &[]).with_parent("a"),
            ],
            "test",
        )
        .unwrap_err();
        let CatalogError::GoalCycle(mut members) = error else {
            panic!("expected a cycle error, got {error}");
        };
        members.sort();
        assert_eq!(members, ["a", "b"]);
    }

    #[test]
    fn rejects_self_parent() {
        let error = Catalog::new(
            vec![goal("a", "A", GoalKind::Other, &[]).with_parent("a")],
            "test",
        )
        .unwrap_err();
        assert_eq!(error, CatalogError::GoalCycle(vec!["a".to_string()]));
    }
}
