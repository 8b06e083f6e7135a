use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::Overrides;

/// Errors raised when changing course enrollment in a [`Plan`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// The named semester is not part of the plan.
    #[error("no semester named '{0}'")]
    UnknownSemester(String),

    /// The course is already placed in a semester.
    #[error("course '{course}' is already planned for {semester}")]
    AlreadyPlanned {
        /// The course id.
        course: String,
        /// The semester it is planned for.
        semester: String,
    },

    /// The course is not planned in any semester.
    #[error("course '{0}' is not in the plan")]
    NotPlanned(String),

    /// The graduation year precedes the start year.
    #[error("graduation year {grad} is before start year {start}")]
    InvalidYears {
        /// First year of study.
        start: i32,
        /// Graduation year.
        grad: i32,
    },
}

/// One term and the course ids enrolled in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    /// Display name, e.g. `Fall 2024`.
    pub name: String,
    /// Course ids, in the order they were added.
    #[serde(default)]
    pub courses: Vec<String>,
}

impl Semester {
    /// An empty semester.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            courses: Vec::new(),
        }
    }
}

/// A student's plan: semesters of courses, selected goals, and manual
/// fulfillments.
///
/// The plan is owned by its caller. Evaluation only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Stable identifier of this plan.
    pub id: Uuid,
    /// When the plan was created.
    pub created: DateTime<Utc>,
    /// Semesters in chronological order.
    pub semesters: Vec<Semester>,
    /// Ids of the selected goals (majors, minors and others).
    #[serde(default)]
    pub goals: Vec<String>,
    /// Requirements marked as fulfilled by hand.
    #[serde(default)]
    pub manually_fulfilled: Overrides,
}

impl Plan {
    /// A new plan covering `start_year` to `grad_year`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidYears`] if `grad_year` is before
    /// `start_year`.
    pub fn new(
        start_year: i32,
        grad_year: i32,
        summer: bool,
        goals: Vec<String>,
    ) -> Result<Self, PlanError> {
        Ok(Self {
            id: Uuid::new_v4(),
            created: Utc::now(),
            semesters: Self::initialize_semesters(start_year, grad_year, summer)?,
            goals,
            manually_fulfilled: Overrides::new(),
        })
    }

    /// The semesters of a program that starts in the fall of `start_year` and
    /// ends in the spring of `grad_year`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidYears`] if `grad_year` is before
    /// `start_year`.
    pub fn initialize_semesters(
        start_year: i32,
        grad_year: i32,
        summer: bool,
    ) -> Result<Vec<Semester>, PlanError> {
        if grad_year < start_year {
            return Err(PlanError::InvalidYears {
                start: start_year,
                grad: grad_year,
            });
        }

        let mut semesters = vec![Semester::new(format!("Fall {start_year}"))];
        for year in start_year + 1..grad_year {
            semesters.push(Semester::new(format!("Spring {year}")));
            if summer {
                semesters.push(Semester::new(format!("Summer {year}")));
            }
            semesters.push(Semester::new(format!("Fall {year}")));
        }
        semesters.push(Semester::new(format!("Spring {grad_year}")));
        Ok(semesters)
    }

    /// Every planned course id, semester by semester.
    pub fn course_ids(&self) -> impl Iterator<Item = &str> {
        self.semesters
            .iter()
            .flat_map(|semester| semester.courses.iter().map(String::as_str))
    }

    /// The semester a course is planned for, if any.
    #[must_use]
    pub fn semester_of(&self, course: &str) -> Option<&Semester> {
        self.semesters
            .iter()
            .find(|semester| semester.courses.iter().any(|id| id == course))
    }

    /// Plan `course` in the semester called `semester` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Fails if the semester does not exist or the course is already planned.
    pub fn add_course(&mut self, course: &str, semester: &str) -> Result<(), PlanError> {
        if let Some(existing) = self.semester_of(course) {
            return Err(PlanError::AlreadyPlanned {
                course: course.to_string(),
                semester: existing.name.clone(),
            });
        }
        let target = self
            .semesters
            .iter_mut()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(semester))
            .ok_or_else(|| PlanError::UnknownSemester(semester.to_string()))?;
        target.courses.push(course.to_string());
        Ok(())
    }

    /// Remove `course` from whichever semester holds it.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::NotPlanned`] if the course is not in the plan.
    pub fn remove_course(&mut self, course: &str) -> Result<(), PlanError> {
        for semester in &mut self.semesters {
            if let Some(position) = semester.courses.iter().position(|id| id == course) {
                semester.courses.remove(position);
                return Ok(());
            }
        }
        Err(PlanError::NotPlanned(course.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn names(semesters: &[Semester]) -> Vec<&str> {
        semesters.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn semesters_run_from_fall_to_spring() {
        let semesters = Plan::initialize_semesters(2023, 2025, false).unwrap();
        assert_eq!(
            names(&semesters),
            ["Fall 2023", "Spring 2024", "Fall 2024", "Spring 2025"]
        );
    }

    #[test]
    fn summers_are_optional() {
        let semesters = Plan::initialize_semesters(2023, 2025, true).unwrap();
        assert_eq!(
            names(&semesters),
            [
                "Fall 2023",
                "Spring 2024",
                "Summer 2024",
                "Fall 2024",
                "Spring 2025"
            ]
        );
    }

    #[test_case(2024, 2024, 2; "same year")]
    #[test_case(2024, 2025, 2; "one year")]
    #[test_case(2024, 2028, 8; "four years")]
    fn semester_count(start: i32, grad: i32, expected: usize) {
        assert_eq!(
            Plan::initialize_semesters(start, grad, false).unwrap().len(),
            expected
        );
    }

    #[test]
    fn rejects_inverted_years() {
        assert_eq!(
            Plan::initialize_semesters(2025, 2024, false),
            Err(PlanError::InvalidYears {
                start: 2025,
                grad: 2024
            })
        );
    }

    #[test]
    fn add_and_remove_courses() {
        let mut plan = Plan::new(2024, 2026, false, vec!["eecs".into()]).unwrap();
        plan.add_course("math1a", "fall 2024").unwrap();
        plan.add_course("math1b", "Spring 2025").unwrap();

        assert_eq!(plan.course_ids().collect::<Vec<_>>(), ["math1a", "math1b"]);
        assert_eq!(plan.semester_of("math1b").unwrap().name, "Spring 2025");
        assert_eq!(
            plan.add_course("math1a", "Spring 2025"),
            Err(PlanError::AlreadyPlanned {
                course: "math1a".into(),
                semester: "Fall 2024".into()
            })
        );
        assert_eq!(
            plan.add_course("physics7a", "Winter 2025"),
            Err(PlanError::UnknownSemester("Winter 2025".into()))
        );

        plan.remove_course("math1a").unwrap();
        assert_eq!(
            plan.remove_course("math1a"),
            Err(PlanError::NotPlanned("math1a".into()))
        );
    }
}
