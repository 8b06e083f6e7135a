use std::fmt;

use crate::domain::Course;

/// What a [`StandaloneRequirement`] looks for in a single course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// One exact course, or any of its registered equivalents.
    Course {
        /// Canonical id of the required course.
        course_id: String,
        /// Display code of the required course, e.g. `MATH 1A`.
        code: String,
    },

    /// Any course carrying the tag.
    Tag(String),
}

/// A requirement fulfilled by the presence of one matching course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandaloneRequirement {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) predicate: Predicate,
}

impl StandaloneRequirement {
    /// A requirement for one exact course (or any of its equivalents).
    #[must_use]
    pub fn course(id: impl Into<String>, name: impl Into<String>, course: &Course) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            predicate: Predicate::Course {
                course_id: course.canonical_id().to_string(),
                code: course.code(),
            },
        }
    }

    /// A requirement for any course carrying `tag`.
    #[must_use]
    pub fn tag(id: impl Into<String>, name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            predicate: Predicate::Tag(tag.into()),
        }
    }

    /// The requirement id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The predicate a course must satisfy.
    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Whether `course` on its own satisfies this requirement.
    #[must_use]
    pub fn is_fulfillable_by(&self, course: &Course) -> bool {
        match &self.predicate {
            Predicate::Course { course_id, .. } => course.canonical_id() == course_id,
            Predicate::Tag(tag) => course.has_tag(tag),
        }
    }

    pub(crate) fn is_fulfilled_with(&self, courses: &[Course]) -> bool {
        courses.iter().any(|course| self.is_fulfillable_by(course))
    }

    pub(crate) fn course_combinations<'a>(&self, courses: &'a [Course]) -> Vec<Vec<&'a Course>> {
        courses
            .iter()
            .filter(|course| self.is_fulfillable_by(course))
            .map(|course| vec![course])
            .collect()
    }
}

impl fmt::Display for StandaloneRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.predicate {
            Predicate::Course { code, .. } if *code == self.name => f.write_str(code),
            Predicate::Course { code, .. } => write!(f, "{} ({code})", self.name),
            Predicate::Tag(tag) => write!(f, "{} (tag: {tag})", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CourseCatalog;

    #[test]
    fn course_predicate_matches_equivalents() {
        let catalog = CourseCatalog::new(
            vec![
                Course::new("compsci70", "COMPSCI", "70", 4.0).unwrap(),
                Course::new("math55", "MATH", "55", 4.0).unwrap(),
                Course::new("math54", "MATH", "54", 4.0).unwrap(),
            ],
            [("math55".to_string(), "compsci70".to_string())],
        )
        .unwrap();
        let requirement =
            StandaloneRequirement::course("cs70", "COMPSCI 70", catalog.get("compsci70").unwrap());

        assert!(requirement.is_fulfillable_by(catalog.get("math55").unwrap()));
        assert!(!requirement.is_fulfillable_by(catalog.get("math54").unwrap()));
        assert_eq!(requirement.to_string(), "COMPSCI 70");
    }

    #[test]
    fn tag_predicate_matches_any_tagged_course() {
        let tagged = Course::new("hist7a", "HISTORY", "7A", 4.0)
            .unwrap()
            .with_tags(["ah"]);
        let untagged = Course::new("hist100", "HISTORY", "100", 4.0).unwrap();
        let requirement = StandaloneRequirement::tag("ah", "American History", "ah");

        assert!(requirement.is_fulfilled_with(&[untagged.clone(), tagged.clone()]));
        assert!(!requirement.is_fulfilled_with(&[untagged]));
        assert_eq!(
            requirement.course_combinations(std::slice::from_ref(&tagged)),
            vec![vec![&tagged]]
        );
        assert_eq!(requirement.to_string(), "American History (tag: ah)");
    }
}
