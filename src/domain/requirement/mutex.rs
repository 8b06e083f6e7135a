//! Joint allocation of courses to mutually exclusive requirements.
//!
//! Each child of a [`MutexRequirement`] must be matched to a *distinct*
//! course. One course may satisfy several children's predicates but can only
//! be spent on one of them, so a child's status depends on the global
//! matching rather than on its own predicate.
//!
//! The engine enumerates every assignment of courses to children (each child
//! takes nothing, or one unused course it accepts), keeps only those of
//! maximum cardinality, and classifies each child:
//!
//! - [`Status::Fulfilled`]: matched in every maximum assignment;
//! - [`Status::Potential`]: matched in some, but not all, of them;
//! - [`Status::Unfulfilled`]: matched in none.
//!
//! The course pool is addressed by index, with a `used` mask standing in for
//! "remove this course from the pool". Enumeration is exponential in the
//! number of children; catalogs bound it with a configured maximum.

use std::fmt;

use super::{Requirement, StandaloneRequirement};
use crate::domain::{Course, Overrides, Status};

/// A requirement whose children must each be fulfilled by distinct courses.
#[derive(Debug, Clone, PartialEq)]
pub struct MutexRequirement {
    pub(crate) id: String,
    pub(crate) name: String,
    /// Always [`Requirement::Standalone`].
    requirements: Vec<Requirement>,
}

impl MutexRequirement {
    /// Construct a mutex requirement over standalone children.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        requirements: Vec<StandaloneRequirement>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            requirements: requirements.into_iter().map(Requirement::from).collect(),
        }
    }

    /// The children, each a [`Requirement::Standalone`].
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    fn standalone(&self) -> impl Iterator<Item = &StandaloneRequirement> {
        self.requirements.iter().map(|requirement| match requirement {
            Requirement::Standalone(standalone) => standalone,
            _ => unreachable!("mutex children are constructed as standalone requirements"),
        })
    }

    /// Status of each child, in order, given `courses`.
    #[must_use]
    pub fn fulfillment(&self, courses: &[Course]) -> Vec<Status> {
        self.fulfillment_with(courses, &Overrides::new())
    }

    /// Status of each child, in order, given `courses` and `overrides`.
    ///
    /// An overridden child is reported fulfilled and takes no part in the
    /// allocation, leaving every course for its siblings.
    #[must_use]
    pub fn fulfillment_with(&self, courses: &[Course], overrides: &Overrides) -> Vec<Status> {
        let excluded: Vec<bool> = self
            .standalone()
            .map(|child| overrides.contains(child.id()))
            .collect();
        let allocation = Allocation::new(self.standalone(), courses, &excluded);

        let mut classifier = Classifier::new(excluded.len());
        allocation.for_each(|assignment| classifier.observe(assignment));

        classifier
            .statuses()
            .into_iter()
            .zip(excluded)
            .map(|(status, excluded)| if excluded { Status::Fulfilled } else { status })
            .collect()
    }

    /// Every way of assigning courses to children, by child position.
    ///
    /// Each entry is `None` when that child is left unmatched. With no
    /// children this is a single, empty assignment.
    #[must_use]
    pub fn fulfillment_mappings<'a>(&self, courses: &'a [Course]) -> Vec<Vec<Option<&'a Course>>> {
        let excluded = vec![false; self.requirements.len()];
        let allocation = Allocation::new(self.standalone(), courses, &excluded);

        let mut mappings = Vec::new();
        allocation.for_each(|assignment| {
            mappings.push(
                assignment
                    .iter()
                    .map(|slot| slot.map(|position| &courses[position]))
                    .collect(),
            );
        });
        mappings
    }

    /// The size of a maximum matching of children to distinct courses.
    #[must_use]
    pub fn max_fulfilled(&self, courses: &[Course]) -> usize {
        let excluded = vec![false; self.requirements.len()];
        let allocation = Allocation::new(self.standalone(), courses, &excluded);

        let mut max = 0;
        allocation.for_each(|assignment| {
            max = max.max(assignment.iter().flatten().count());
        });
        max
    }

    /// Fulfilled iff every child is [`Status::Fulfilled`]; without overrides,
    /// iff a perfect matching exists.
    pub(crate) fn is_fulfilled_with(&self, courses: &[Course], overrides: &Overrides) -> bool {
        self.fulfillment_with(courses, overrides)
            .iter()
            .all(|status| status.is_fulfilled())
    }

    pub(crate) fn can_fulfill(&self, course: &Course) -> bool {
        self.standalone().any(|child| child.is_fulfillable_by(course))
    }

    /// The course sets of every perfect matching.
    pub(crate) fn course_combinations<'a>(&self, courses: &'a [Course]) -> Vec<Vec<&'a Course>> {
        self.fulfillment_mappings(courses)
            .into_iter()
            .filter_map(|mapping| mapping.into_iter().collect::<Option<Vec<_>>>())
            .collect()
    }
}

impl fmt::Display for MutexRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Uniquely fulfill:")?;
        for requirement in &self.requirements {
            write!(f, "\n{requirement}")?;
        }
        Ok(())
    }
}

/// The bipartite structure of one allocation problem: for each child, the
/// positions of the courses it accepts.
struct Allocation {
    eligible: Vec<Vec<usize>>,
    pool_size: usize,
}

impl Allocation {
    fn new<'r>(
        children: impl Iterator<Item = &'r StandaloneRequirement>,
        courses: &[Course],
        excluded: &[bool],
    ) -> Self {
        let eligible = children
            .zip(excluded)
            .map(|(child, &excluded)| {
                if excluded {
                    return Vec::new();
                }
                courses
                    .iter()
                    .enumerate()
                    .filter(|(_, course)| child.is_fulfillable_by(course))
                    .map(|(position, _)| position)
                    .collect()
            })
            .collect();

        Self {
            eligible,
            pool_size: courses.len(),
        }
    }

    /// Visit every assignment, children in order, trying "unmatched" before
    /// each eligible unused course.
    fn for_each(&self, mut visit: impl FnMut(&[Option<usize>])) {
        let mut used = vec![false; self.pool_size];
        let mut assignment = Vec::with_capacity(self.eligible.len());
        self.search(&mut used, &mut assignment, &mut visit);
    }

    fn search(
        &self,
        used: &mut [bool],
        assignment: &mut Vec<Option<usize>>,
        visit: &mut impl FnMut(&[Option<usize>]),
    ) {
        let child = assignment.len();
        if child == self.eligible.len() {
            visit(assignment);
            return;
        }

        assignment.push(None);
        self.search(used, assignment, visit);
        assignment.pop();

        for &position in &self.eligible[child] {
            if used[position] {
                continue;
            }
            used[position] = true;
            assignment.push(Some(position));
            self.search(used, assignment, visit);
            assignment.pop();
            used[position] = false;
        }
    }
}

/// Folds assignments into per-child statuses over maximum assignments only,
/// without storing the assignments themselves.
struct Classifier {
    best: Option<usize>,
    always: Vec<bool>,
    ever: Vec<bool>,
}

impl Classifier {
    fn new(children: usize) -> Self {
        Self {
            best: None,
            always: vec![false; children],
            ever: vec![false; children],
        }
    }

    fn observe(&mut self, assignment: &[Option<usize>]) {
        let size = assignment.iter().flatten().count();
        match self.best {
            Some(best) if size < best => {}
            Some(best) if size == best => {
                for (slot, (always, ever)) in assignment
                    .iter()
                    .zip(self.always.iter_mut().zip(self.ever.iter_mut()))
                {
                    *always &= slot.is_some();
                    *ever |= slot.is_some();
                }
            }
            _ => {
                self.best = Some(size);
                for (slot, (always, ever)) in assignment
                    .iter()
                    .zip(self.always.iter_mut().zip(self.ever.iter_mut()))
                {
                    *always = slot.is_some();
                    *ever = slot.is_some();
                }
            }
        }
    }

    fn statuses(&self) -> Vec<Status> {
        self.always
            .iter()
            .zip(&self.ever)
            .map(|(&always, &ever)| {
                if always {
                    Status::Fulfilled
                } else if ever {
                    Status::Potential
                } else {
                    Status::Unfulfilled
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::requirement::tests::{course, course_req};

    fn mutex(children: Vec<StandaloneRequirement>) -> MutexRequirement {
        MutexRequirement::new("mutex", "Mutex", children)
    }

    #[test]
    fn two_children_competing_for_one_course_are_potential() {
        let a = course("a", 4.0, &[]);
        let requirement = mutex(vec![course_req("first", &a), course_req("second", &a)]);
        let courses = [a];

        assert_eq!(
            requirement.fulfillment(&courses),
            [Status::Potential, Status::Potential]
        );
        assert_eq!(requirement.max_fulfilled(&courses), 1);
        assert!(!requirement.is_fulfilled_with(&courses, &Overrides::new()));
    }

    #[test]
    fn distinct_courses_fulfill_every_child() {
        let a = course("a", 4.0, &[]);
        let b = course("b", 4.0, &[]);
        let requirement = mutex(vec![course_req("ra", &a), course_req("rb", &b)]);
        let courses = [a, b];

        assert_eq!(
            requirement.fulfillment(&courses),
            [Status::Fulfilled, Status::Fulfilled]
        );
        assert!(requirement.is_fulfilled_with(&courses, &Overrides::new()));
    }

    #[test]
    fn child_without_course_is_unfulfilled() {
        let a = course("a", 4.0, &[]);
        let requirement = mutex(vec![course_req("ra", &a)]);

        assert_eq!(requirement.fulfillment(&[]), [Status::Unfulfilled]);
        assert!(!requirement.is_fulfilled_with(&[], &Overrides::new()));
    }

    #[test]
    fn no_children_is_vacuously_fulfilled() {
        let requirement = mutex(Vec::new());
        let a = course("a", 4.0, &[]);

        assert_eq!(
            requirement.fulfillment_mappings(std::slice::from_ref(&a)),
            vec![Vec::<Option<&Course>>::new()]
        );
        assert!(requirement.fulfillment(&[]).is_empty());
        assert!(requirement.is_fulfilled_with(&[], &Overrides::new()));
    }

    #[test]
    fn specific_child_takes_priority_over_flexible_sibling() {
        // "hss" accepts a or b, "ra" only accepts a: the only maximum matching
        // gives a to "ra" and b to "hss".
        let a = course("a", 4.0, &["hss"]);
        let b = course("b", 4.0, &["hss"]);
        let requirement = mutex(vec![
            StandaloneRequirement::tag("hss", "H/SS", "hss"),
            course_req("ra", &a),
        ]);
        let courses = [a, b];

        assert_eq!(
            requirement.fulfillment(&courses),
            [Status::Fulfilled, Status::Fulfilled]
        );
        let combos = requirement.course_combinations(&courses);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0][0].id(), "b");
        assert_eq!(combos[0][1].id(), "a");
    }

    #[test]
    fn partial_matching_classifies_each_child() {
        // Three tag children share two courses, one child has no course at all.
        let x = course("x", 4.0, &["hss"]);
        let y = course("y", 4.0, &["hss"]);
        let requirement = mutex(vec![
            StandaloneRequirement::tag("h1", "H/SS", "hss"),
            StandaloneRequirement::tag("h2", "H/SS", "hss"),
            StandaloneRequirement::tag("h3", "H/SS", "hss"),
            StandaloneRequirement::tag("u1", "Upper", "upper"),
        ]);
        let courses = [x, y];

        assert_eq!(requirement.max_fulfilled(&courses), 2);
        assert_eq!(
            requirement.fulfillment(&courses),
            [
                Status::Potential,
                Status::Potential,
                Status::Potential,
                Status::Unfulfilled
            ]
        );
    }

    #[test]
    fn status_is_independent_of_course_order() {
        let a = course("a", 4.0, &["hss"]);
        let b = course("b", 4.0, &["hss", "upper"]);
        let c = course("c", 4.0, &[]);
        let requirement = mutex(vec![
            StandaloneRequirement::tag("hss", "H/SS", "hss"),
            StandaloneRequirement::tag("upper", "Upper", "upper"),
            course_req("rc", &c),
        ]);

        let forward = [a.clone(), b.clone(), c.clone()];
        let reversed = [c, b, a];
        assert_eq!(
            requirement.fulfillment(&forward),
            requirement.fulfillment(&reversed)
        );
        assert_eq!(
            requirement.fulfillment(&forward),
            [Status::Fulfilled, Status::Fulfilled, Status::Fulfilled]
        );
    }

    #[test]
    fn mappings_enumerate_every_assignment() {
        let a = course("a", 4.0, &[]);
        let requirement = mutex(vec![course_req("first", &a), course_req("second", &a)]);
        let courses = [a];

        // (None, None), (None, a), (a, None)
        let mappings = requirement.fulfillment_mappings(&courses);
        assert_eq!(mappings.len(), 3);
        assert_eq!(mappings[0], [None, None]);
        assert!(requirement.course_combinations(&courses).is_empty());
    }

    #[test]
    fn overridden_child_frees_its_course() {
        let a = course("a", 4.0, &[]);
        let requirement = mutex(vec![course_req("first", &a), course_req("second", &a)]);
        let courses = [a];
        let overrides: Overrides = ["first"].into_iter().collect();

        assert_eq!(
            requirement.fulfillment_with(&courses, &overrides),
            [Status::Fulfilled, Status::Fulfilled]
        );
        assert!(requirement.is_fulfilled_with(&courses, &overrides));
    }

    #[test]
    fn description_lists_children() {
        let a = course("a", 4.0, &[]);
        let requirement = mutex(vec![
            course_req("ra", &a),
            StandaloneRequirement::tag("hss", "H/SS", "hss"),
        ]);
        assert_eq!(
            requirement.to_string(),
            "Uniquely fulfill:\nA (TEST 1)\nH/SS (tag: hss)"
        );
    }
}
