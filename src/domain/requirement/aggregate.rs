use std::{collections::BTreeSet, fmt};

use crate::domain::{Course, combinations};

/// Selects the courses that count towards a [`UnitRequirement`] or a
/// [`CountRequirement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseFilter {
    /// Courses carrying the tag.
    Tag(String),

    /// Any of the listed courses, by canonical id.
    Courses(BTreeSet<String>),

    /// Courses in a department, optionally bounded by bare course number
    /// (inclusive).
    Department {
        /// Department code, uppercased.
        dept: String,
        /// Lowest bare number accepted.
        min_number: Option<u32>,
        /// Highest bare number accepted.
        max_number: Option<u32>,
    },
}

impl CourseFilter {
    /// Whether `course` passes the filter.
    #[must_use]
    pub fn matches(&self, course: &Course) -> bool {
        match self {
            Self::Tag(tag) => course.has_tag(tag),
            Self::Courses(ids) => ids.contains(course.canonical_id()),
            Self::Department {
                dept,
                min_number,
                max_number,
            } => {
                let bare = course.number().bare();
                course.dept() == dept
                    && min_number.is_none_or(|min| bare >= min)
                    && max_number.is_none_or(|max| bare <= max)
            }
        }
    }

    fn matching<'c>(&self, courses: &'c [Course]) -> impl Iterator<Item = &'c Course> {
        courses.iter().filter(move |course| self.matches(course))
    }
}

impl fmt::Display for CourseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "courses tagged {tag}"),
            Self::Courses(ids) => {
                let ids: Vec<_> = ids.iter().map(String::as_str).collect();
                write!(f, "[{}]", ids.join(", "))
            }
            Self::Department {
                dept,
                min_number,
                max_number,
            } => match (min_number, max_number) {
                (None, None) => write!(f, "{dept} courses"),
                (Some(min), None) => write!(f, "{dept} courses numbered {min} and above"),
                (None, Some(max)) => write!(f, "{dept} courses numbered {max} and below"),
                (Some(min), Some(max)) => write!(f, "{dept} courses numbered {min}-{max}"),
            },
        }
    }
}

/// Fulfilled when the units of matching courses sum to at least `units`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRequirement {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) filter: CourseFilter,
    pub(crate) units: f32,
}

impl UnitRequirement {
    /// Construct a unit requirement.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        filter: CourseFilter,
        units: f32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            filter,
            units,
        }
    }

    /// The filter selecting contributing courses.
    #[must_use]
    pub const fn filter(&self) -> &CourseFilter {
        &self.filter
    }

    /// The unit threshold.
    #[must_use]
    pub const fn units(&self) -> f32 {
        self.units
    }

    /// Total units of the courses in `courses` that pass the filter.
    #[must_use]
    pub fn matching_units(&self, courses: &[Course]) -> f32 {
        self.filter.matching(courses).map(Course::units).sum()
    }

    pub(crate) fn is_fulfilled_with(&self, courses: &[Course]) -> bool {
        self.matching_units(courses) >= self.units
    }

    /// Subsets of matching courses that reach the threshold and would fall
    /// below it if any course were removed.
    pub(crate) fn course_combinations<'a>(&self, courses: &'a [Course]) -> Vec<Vec<&'a Course>> {
        let matching: Vec<&Course> = self.filter.matching(courses).collect();
        combinations::minimal_covers(&matching, |course| course.units(), self.units)
    }
}

impl fmt::Display for UnitRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} units of {}", self.name, self.units, self.filter)
    }
}

/// Fulfilled when at least `count` courses pass the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRequirement {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) filter: CourseFilter,
    pub(crate) count: usize,
}

impl CountRequirement {
    /// Construct a count requirement.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        filter: CourseFilter,
        count: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            filter,
            count,
        }
    }

    /// The filter selecting contributing courses.
    #[must_use]
    pub const fn filter(&self) -> &CourseFilter {
        &self.filter
    }

    /// How many matching courses are needed.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Number of courses in `courses` that pass the filter.
    #[must_use]
    pub fn matching_count(&self, courses: &[Course]) -> usize {
        self.filter.matching(courses).count()
    }

    pub(crate) fn is_fulfilled_with(&self, courses: &[Course]) -> bool {
        self.matching_count(courses) >= self.count
    }

    pub(crate) fn course_combinations<'a>(&self, courses: &'a [Course]) -> Vec<Vec<&'a Course>> {
        let matching: Vec<&Course> = self.filter.matching(courses).collect();
        combinations::choose(&matching, self.count)
    }
}

impl fmt::Display for CountRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} courses of {}", self.name, self.count, self.filter)
    }
}
