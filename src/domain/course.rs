use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
    sync::LazyLock,
};

use petgraph::unionfind::UnionFind;
use regex::Regex;
use thiserror::Error;

static COURSE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]*)(\d+)([A-Z]*)$").expect("course number pattern is valid")
});

/// Errors raised while constructing courses or the course catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CourseError {
    /// The course number is not a bare number with optional letter prefix and
    /// suffix.
    #[error("invalid course number '{0}'")]
    InvalidNumber(String),

    /// Two courses share the same id.
    #[error("duplicate course id '{0}'")]
    DuplicateCourse(String),

    /// An equivalence names a course that is not in the catalog.
    #[error("course '{course}' lists unknown equivalent '{equivalent}'")]
    UnknownEquivalent {
        /// The course declaring the equivalence.
        course: String,
        /// The equivalent that could not be found.
        equivalent: String,
    },

    /// A course id could not be resolved against the catalog.
    #[error("unknown course '{0}'")]
    UnknownCourse(String),
}

/// A course number such as `61A`, `C100` or `H195B`.
///
/// The bare number drives catalog ordering; the letters are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseNumber {
    prefix: String,
    bare: u32,
    suffix: String,
    raw: String,
}

impl CourseNumber {
    /// The numeric part, without prefix or suffix letters.
    #[must_use]
    pub const fn bare(&self) -> u32 {
        self.bare
    }

    /// Letters preceding the numeric part (e.g. `C` in `C100`).
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Letters following the numeric part (e.g. `A` in `61A`).
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl FromStr for CourseNumber {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_uppercase();
        let captures = COURSE_NUMBER
            .captures(&raw)
            .ok_or_else(|| CourseError::InvalidNumber(s.to_string()))?;
        let bare = captures[2]
            .parse()
            .map_err(|_| CourseError::InvalidNumber(s.to_string()))?;

        Ok(Self {
            prefix: captures[1].to_string(),
            bare,
            suffix: captures[3].to_string(),
            raw: raw.clone(),
        })
    }
}

impl fmt::Display for CourseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A single course offering.
///
/// Courses are immutable once placed in a [`CourseCatalog`]. Identity is the
/// course id: two courses are equal iff their ids are equal.
#[derive(Debug, Clone)]
pub struct Course {
    pub(crate) id: String,
    pub(crate) dept: String,
    pub(crate) number: CourseNumber,
    pub(crate) title: String,
    pub(crate) units: f32,
    pub(crate) tags: BTreeSet<String>,
    /// Id of the representative of this course's equivalence group.
    pub(crate) canonical: String,
}

impl Course {
    /// Construct a course with no title and no tags.
    ///
    /// # Errors
    ///
    /// Returns [`CourseError::InvalidNumber`] if `number` cannot be parsed.
    pub fn new(
        id: impl Into<String>,
        dept: impl Into<String>,
        number: &str,
        units: f32,
    ) -> Result<Self, CourseError> {
        let id = id.into();
        Ok(Self {
            canonical: id.clone(),
            id,
            dept: dept.into().to_uppercase(),
            number: number.parse()?,
            title: String::new(),
            units,
            tags: BTreeSet::new(),
        })
    }

    /// Set the descriptive title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replace the tags carried by this course.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// The unique course id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The department code, uppercased.
    #[must_use]
    pub fn dept(&self) -> &str {
        &self.dept
    }

    /// The course number.
    #[must_use]
    pub const fn number(&self) -> &CourseNumber {
        &self.number
    }

    /// The descriptive title (may be empty).
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The unit value of the course.
    #[must_use]
    pub const fn units(&self) -> f32 {
        self.units
    }

    /// The tags carried by this course.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Whether this course carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Id of the canonical representative of this course's equivalence group.
    ///
    /// For a course without cross-listings this is its own id.
    #[must_use]
    pub fn canonical_id(&self) -> &str {
        &self.canonical
    }

    /// Whether `other` is this course or one of its registered equivalents.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }

    /// Human-readable code, e.g. `COMPSCI 61A`.
    #[must_use]
    pub fn code(&self) -> String {
        format!("{} {}", self.dept, self.number)
    }

    /// Catalog ordering: department, then bare number, then full number.
    fn catalog_order(&self, other: &Self) -> Ordering {
        self.dept
            .cmp(&other.dept)
            .then_with(|| self.number.bare.cmp(&other.number.bare))
            .then_with(|| self.number.raw.cmp(&other.number.raw))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialEq for Course {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Course {}

impl Hash for Course {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "{} {}", self.dept, self.number)
        } else {
            write!(f, "{} {}: {}", self.dept, self.number, self.title)
        }
    }
}

/// The set of known courses, sorted in catalog order with cross-listings
/// resolved.
#[derive(Debug, Clone, Default)]
pub struct CourseCatalog {
    courses: Vec<Course>,
    index: HashMap<String, usize>,
}

impl CourseCatalog {
    /// Build a catalog from courses and pairs of equivalent (cross-listed)
    /// course ids.
    ///
    /// Courses are sorted by department and number. Each equivalence group is
    /// represented by its first course in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if two courses share an id, or if an equivalence names
    /// a course that is not present.
    pub fn new<I>(mut courses: Vec<Course>, equivalences: I) -> Result<Self, CourseError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        courses.sort_by(Course::catalog_order);

        let mut index = HashMap::with_capacity(courses.len());
        for (position, course) in courses.iter().enumerate() {
            if index.insert(course.id.clone(), position).is_some() {
                return Err(CourseError::DuplicateCourse(course.id.clone()));
            }
        }

        let mut groups = UnionFind::<usize>::new(courses.len());
        for (course, equivalent) in equivalences {
            let Some(&a) = index.get(&course) else {
                return Err(CourseError::UnknownCourse(course));
            };
            let Some(&b) = index.get(&equivalent) else {
                return Err(CourseError::UnknownEquivalent { course, equivalent });
            };
            groups.union(a, b);
        }

        // positions ascend, so the first member seen is the representative
        let mut representatives: HashMap<usize, usize> = HashMap::new();
        for position in 0..courses.len() {
            representatives
                .entry(groups.find(position))
                .or_insert(position);
        }
        let canonical: Vec<String> = (0..courses.len())
            .map(|position| courses[representatives[&groups.find(position)]].id.clone())
            .collect();
        for (course, canonical) in courses.iter_mut().zip(canonical) {
            course.canonical = canonical;
        }

        Ok(Self { courses, index })
    }

    /// Look up a course by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Course> {
        self.index.get(id).map(|&position| &self.courses[position])
    }

    /// Iterate over all courses in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Course> {
        self.courses.iter()
    }

    /// Number of courses in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Courses sharing `id`'s equivalence group, including the course itself.
    pub fn equivalents<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Course> + 'a {
        let canonical = self.get(id).map(|course| course.canonical.clone());
        self.courses
            .iter()
            .filter(move |course| canonical.as_deref() == Some(course.canonical.as_str()))
    }

    /// Resolve a sequence of course ids into owned courses.
    ///
    /// # Errors
    ///
    /// Returns [`CourseError::UnknownCourse`] for the first id that is not in
    /// the catalog.
    pub fn resolve<'a, I>(&self, ids: I) -> Result<Vec<Course>, CourseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .map(|id| {
                self.get(id)
                    .cloned()
                    .ok_or_else(|| CourseError::UnknownCourse(id.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn course(id: &str, dept: &str, number: &str) -> Course {
        Course::new(id, dept, number, 4.0).unwrap()
    }

    #[test_case("61A", "", 61, "A"; "letter suffix")]
    #[test_case("C100", "C", 100, ""; "letter prefix")]
    #[test_case("h195b", "H", 195, "B"; "lowercase both")]
    #[test_case("1", "", 1, ""; "bare number")]
    fn parses_course_numbers(input: &str, prefix: &str, bare: u32, suffix: &str) {
        let number: CourseNumber = input.parse().unwrap();
        assert_eq!(number.prefix(), prefix);
        assert_eq!(number.bare(), bare);
        assert_eq!(number.suffix(), suffix);
    }

    #[test_case("A"; "no digits")]
    #[test_case("61-A"; "punctuation")]
    #[test_case(""; "empty")]
    fn rejects_invalid_course_numbers(input: &str) {
        assert_eq!(
            input.parse::<CourseNumber>(),
            Err(CourseError::InvalidNumber(input.to_string()))
        );
    }

    #[test]
    fn catalog_sorts_by_department_then_bare_number() {
        let catalog = CourseCatalog::new(
            vec![
                course("math1b", "MATH", "1B"),
                course("compsci170", "COMPSCI", "170"),
                course("compsci61a", "COMPSCI", "61A"),
                course("math1a", "MATH", "1A"),
                course("compsci9", "COMPSCI", "9"),
            ],
            [],
        )
        .unwrap();

        let ids: Vec<_> = catalog.iter().map(Course::id).collect();
        assert_eq!(
            ids,
            ["compsci9", "compsci61a", "compsci170", "math1a", "math1b"]
        );
    }

    #[test]
    fn equivalents_share_first_course_as_canonical() {
        let catalog = CourseCatalog::new(
            vec![
                course("stat134", "STAT", "134"),
                course("compsci70", "COMPSCI", "70"),
                course("math55", "MATH", "55"),
            ],
            [
                ("stat134".to_string(), "math55".to_string()),
                ("math55".to_string(), "compsci70".to_string()),
            ],
        )
        .unwrap();

        for id in ["stat134", "compsci70", "math55"] {
            assert_eq!(catalog.get(id).unwrap().canonical_id(), "compsci70");
        }
        assert_eq!(catalog.equivalents("math55").count(), 3);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let error = CourseCatalog::new(
            vec![course("a", "X", "1"), course("a", "X", "2")],
            [],
        )
        .unwrap_err();
        assert_eq!(error, CourseError::DuplicateCourse("a".to_string()));
    }

    #[test]
    fn rejects_unknown_equivalent() {
        let error = CourseCatalog::new(
            vec![course("a", "X", "1")],
            [("a".to_string(), "b".to_string())],
        )
        .unwrap_err();
        assert_eq!(
            error,
            CourseError::UnknownEquivalent {
                course: "a".to_string(),
                equivalent: "b".to_string()
            }
        );
    }

    #[test]
    fn resolve_reports_unknown_course() {
        let catalog = CourseCatalog::new(vec![course("a", "X", "1")], []).unwrap();
        assert_eq!(catalog.resolve(["a"]).unwrap().len(), 1);
        assert_eq!(
            catalog.resolve(["a", "zz"]).unwrap_err(),
            CourseError::UnknownCourse("zz".to_string())
        );
    }

    #[test]
    fn equality_is_by_id() {
        let a = course("a", "X", "1");
        let also_a = course("a", "Y", "2").with_title("Different");
        assert_eq!(a, also_a);
        assert_eq!(a.code(), "X 1");
    }
}
