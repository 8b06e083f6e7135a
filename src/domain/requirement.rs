//! The requirement tree.
//!
//! A [`Requirement`] is a closed sum over every kind of node a degree
//! catalog can contain. Leaves ([`StandaloneRequirement`], [`UnitRequirement`],
//! [`CountRequirement`]) are fulfilled directly by course attributes;
//! composites ([`MultiRequirement`], [`MutexRequirement`]) aggregate their
//! children.
//!
//! Fulfillment is a pure function of `(courses, overrides)`: nothing in this
//! module mutates a course or a requirement while evaluating.

use std::fmt;

use crate::domain::{Course, Overrides};

mod aggregate;
mod multi;
mod mutex;
mod standalone;

pub use aggregate::{CountRequirement, CourseFilter, UnitRequirement};
pub use multi::MultiRequirement;
pub use mutex::MutexRequirement;
pub use standalone::{Predicate, StandaloneRequirement};

/// A node in a requirement tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    /// Fulfilled by the presence of a single matching course.
    Standalone(StandaloneRequirement),

    /// Fulfilled when the matching courses sum to a unit threshold.
    Unit(UnitRequirement),

    /// Fulfilled when enough courses match a filter.
    Count(CountRequirement),

    /// Fulfilled when at least `num_required` children are fulfilled.
    Multi(MultiRequirement),

    /// Evaluated exactly like [`Requirement::Multi`]; display layers may
    /// present it differently.
    Poly(MultiRequirement),

    /// Children must be fulfilled by distinct courses.
    Mutex(MutexRequirement),

    /// A catalog entry with no predicate.
    ///
    /// Courses never fulfill it; only an override does.
    Plain(PlainRequirement),
}

/// A requirement with an id and a name but nothing to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainRequirement {
    pub(crate) id: String,
    pub(crate) name: String,
}

impl PlainRequirement {
    /// Construct a plain requirement.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PlainRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Requirement {
    /// The globally unique id of this node.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Standalone(r) => &r.id,
            Self::Unit(r) => &r.id,
            Self::Count(r) => &r.id,
            Self::Multi(r) | Self::Poly(r) => &r.id,
            Self::Mutex(r) => &r.id,
            Self::Plain(r) => &r.id,
        }
    }

    /// The display name of this node.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Standalone(r) => &r.name,
            Self::Unit(r) => &r.name,
            Self::Count(r) => &r.name,
            Self::Multi(r) | Self::Poly(r) => &r.name,
            Self::Mutex(r) => &r.name,
            Self::Plain(r) => &r.name,
        }
    }

    /// Direct children, in catalog order. Leaves have none.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Multi(r) | Self::Poly(r) => &r.requirements,
            Self::Mutex(r) => r.requirements(),
            Self::Standalone(_) | Self::Unit(_) | Self::Count(_) | Self::Plain(_) => &[],
        }
    }

    /// Whether `courses` fulfill this requirement.
    ///
    /// Returns `true` immediately if `overrides` contains this node's id.
    /// The check is made at every node independently: an override on an
    /// ancestor does not fulfill its descendants, nor the other way round.
    #[must_use]
    pub fn is_fulfilled(&self, courses: &[Course], overrides: &Overrides) -> bool {
        if overrides.contains(self.id()) {
            return true;
        }
        self.is_fulfilled_with(courses, overrides)
    }

    /// Variant-specific fulfillment, ignoring any override on this node.
    pub(crate) fn is_fulfilled_with(&self, courses: &[Course], overrides: &Overrides) -> bool {
        match self {
            Self::Standalone(r) => r.is_fulfilled_with(courses),
            Self::Unit(r) => r.is_fulfilled_with(courses),
            Self::Count(r) => r.is_fulfilled_with(courses),
            Self::Multi(r) | Self::Poly(r) => r.is_fulfilled_with(courses, overrides),
            Self::Mutex(r) => r.is_fulfilled_with(courses, overrides),
            Self::Plain(_) => false,
        }
    }

    /// Optional explanatory text for display layers.
    #[must_use]
    pub fn annotation(&self) -> Option<String> {
        match self {
            Self::Multi(r) | Self::Poly(r) => r.annotation(),
            Self::Standalone(_)
            | Self::Unit(_)
            | Self::Count(_)
            | Self::Mutex(_)
            | Self::Plain(_) => None,
        }
    }

    /// Whether `course` could contribute to this requirement.
    ///
    /// Used to highlight relevant courses; this is not an evaluation.
    #[must_use]
    pub fn can_fulfill(&self, course: &Course) -> bool {
        match self {
            Self::Standalone(r) => r.is_fulfillable_by(course),
            Self::Unit(r) => r.filter.matches(course),
            Self::Count(r) => r.filter.matches(course),
            Self::Multi(r) | Self::Poly(r) => r.can_fulfill(course),
            Self::Mutex(r) => r.can_fulfill(course),
            Self::Plain(_) => false,
        }
    }

    /// Every minimal set of `courses` that fulfills this requirement on its
    /// own.
    #[must_use]
    pub fn course_combinations<'a>(&self, courses: &'a [Course]) -> Vec<Vec<&'a Course>> {
        match self {
            Self::Standalone(r) => r.course_combinations(courses),
            Self::Unit(r) => r.course_combinations(courses),
            Self::Count(r) => r.course_combinations(courses),
            Self::Multi(r) | Self::Poly(r) => r.course_combinations(courses),
            Self::Mutex(r) => r.course_combinations(courses),
            Self::Plain(_) => Vec::new(),
        }
    }

    /// Depth-first, pre-order traversal of this node and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }

    /// Whether this node displays the courses that fulfill it directly.
    #[must_use]
    pub const fn has_course_display(&self) -> bool {
        matches!(self, Self::Standalone(_) | Self::Unit(_) | Self::Count(_))
    }
}

impl From<StandaloneRequirement> for Requirement {
    fn from(requirement: StandaloneRequirement) -> Self {
        Self::Standalone(requirement)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standalone(r) => r.fmt(f),
            Self::Unit(r) => r.fmt(f),
            Self::Count(r) => r.fmt(f),
            Self::Multi(r) | Self::Poly(r) => r.fmt(f),
            Self::Mutex(r) => r.fmt(f),
            Self::Plain(r) => r.fmt(f),
        }
    }
}
