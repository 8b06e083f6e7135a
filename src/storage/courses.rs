//! The course list file.
//!
//! A YAML sequence of course records:
//!
//! ```yaml
//! - id: compsci61a
//!   dept: COMPSCI
//!   number: 61A
//!   title: The Structure and Interpretation of Computer Programs
//!   units: 4
//!   tags: [lower-div]
//! - id: compsci195
//!   dept: COMPSCI
//!   number: 195
//!   units: 1
//!   equivalents: [eecs195]
//! ```

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{LoadError, read};
use crate::domain::{Course, CourseCatalog, CourseError};

/// One entry in the course list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// Unique course id.
    pub id: String,
    /// Department code.
    pub dept: String,
    /// Course number, e.g. `61A`.
    pub number: CourseNumberText,
    /// Descriptive title.
    #[serde(default)]
    pub title: String,
    /// Unit value.
    pub units: f32,
    /// Tags such as breadth categories.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ids of cross-listed courses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equivalents: Vec<String>,
}

/// A course number as written in YAML, where `195` is an integer and `61A` a
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CourseNumberText {
    /// A purely numeric course number.
    Numeric(u32),
    /// Any other course number.
    Text(String),
}

impl fmt::Display for CourseNumberText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl TryFrom<&CourseRecord> for Course {
    type Error = CourseError;

    fn try_from(record: &CourseRecord) -> Result<Self, Self::Error> {
        Ok(
            Self::new(&record.id, &record.dept, &record.number.to_string(), record.units)?
                .with_title(&record.title)
                .with_tags(&record.tags),
        )
    }
}

/// Build a course catalog from course records.
///
/// # Errors
///
/// Returns an error if a course number cannot be parsed, if ids repeat, or if
/// an equivalent names an unknown course.
pub fn course_catalog(records: &[CourseRecord]) -> Result<CourseCatalog, CourseError> {
    let courses = records
        .iter()
        .map(Course::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let equivalences = records.iter().flat_map(|record| {
        record
            .equivalents
            .iter()
            .map(|equivalent| (record.id.clone(), equivalent.clone()))
    });
    CourseCatalog::new(courses, equivalences)
}

/// Parse a course list from YAML text.
///
/// # Errors
///
/// Returns an error if the text is not a valid course list.
pub fn parse_courses(text: &str, path: &Path) -> Result<CourseCatalog, LoadError> {
    let records: Vec<CourseRecord> =
        serde_yaml::from_str(text).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(course_catalog(&records)?)
}

/// Load the course list at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid course list.
#[instrument(level = "debug")]
pub fn load_courses(path: &Path) -> Result<CourseCatalog, LoadError> {
    let text = read(path)?;
    let courses = parse_courses(&text, path)?;
    debug!(courses = courses.len(), "loaded course list");
    Ok(courses)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const COURSES: &str = "
- id: compsci61a
  dept: compsci
  number: 61A
  title: Structure and Interpretation of Computer Programs
  units: 4
  tags: [lower-div]
- id: compsci195
  dept: COMPSCI
  number: 195
  units: 1
  equivalents: [eecs195]
- id: eecs195
  dept: EECS
  number: 195
  units: 1
";

    #[test]
    fn parses_records_and_equivalents() {
        let courses = parse_courses(COURSES, &PathBuf::from("courses.yaml")).unwrap();

        assert_eq!(courses.len(), 3);
        let cs61a = courses.get("compsci61a").unwrap();
        assert_eq!(cs61a.code(), "COMPSCI 61A");
        assert!(cs61a.has_tag("lower-div"));
        assert_eq!(
            courses.get("eecs195").unwrap().canonical_id(),
            courses.get("compsci195").unwrap().canonical_id()
        );
    }

    #[test]
    fn unknown_equivalent_is_rejected() {
        let text = "
- id: a
  dept: TEST
  number: 1
  units: 1
  equivalents: [missing]
";
        let error = parse_courses(text, &PathBuf::from("courses.yaml")).unwrap_err();
        assert!(matches!(
            error,
            LoadError::Course(CourseError::UnknownEquivalent { .. })
        ));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let error = parse_courses("- id: [", &PathBuf::from("bad.yaml")).unwrap_err();
        assert!(error.to_string().contains("bad.yaml"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.yaml");
        std::fs::write(&path, COURSES).unwrap();

        let courses = load_courses(&path).unwrap();
        assert_eq!(courses.len(), 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = load_courses(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(error, LoadError::Io { .. }));
    }
}
