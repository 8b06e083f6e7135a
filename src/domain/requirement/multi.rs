use std::fmt;

use super::Requirement;
use crate::domain::{Course, Overrides, combinations};

/// A requirement containing child requirements, fulfilled when at least
/// `num_required` of them are fulfilled.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRequirement {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) requirements: Vec<Requirement>,
    pub(crate) num_required: usize,
    /// Suppresses the nested display in favour of an annotation.
    pub(crate) hidden: bool,
}

impl MultiRequirement {
    /// Construct a visible multi-requirement.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        requirements: Vec<Requirement>,
        num_required: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            requirements,
            num_required,
            hidden: false,
        }
    }

    /// Set whether the nested display is hidden.
    #[must_use]
    pub const fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// The child requirements.
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// How many children must be fulfilled.
    #[must_use]
    pub const fn num_required(&self) -> usize {
        self.num_required
    }

    /// Whether the nested display is hidden.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Number of children fulfilled by `courses` and `overrides`.
    #[must_use]
    pub fn num_fulfilled(&self, courses: &[Course], overrides: &Overrides) -> usize {
        self.requirements
            .iter()
            .filter(|requirement| requirement.is_fulfilled(courses, overrides))
            .count()
    }

    pub(crate) fn is_fulfilled_with(&self, courses: &[Course], overrides: &Overrides) -> bool {
        self.num_fulfilled(courses, overrides) >= self.num_required
    }

    /// Hidden requirements explain themselves through their description.
    pub(crate) fn annotation(&self) -> Option<String> {
        self.hidden.then(|| self.to_string())
    }

    /// Possible contribution to any child counts as contribution to the whole.
    pub(crate) fn can_fulfill(&self, course: &Course) -> bool {
        self.requirements
            .iter()
            .any(|requirement| requirement.can_fulfill(course))
    }

    /// The rule line shown above the children, given how many are fulfilled.
    #[must_use]
    pub fn header(&self, num_fulfilled: usize) -> String {
        if self.num_required == 1 {
            "One of".to_string()
        } else if self.num_required == self.requirements.len() {
            "All of".to_string()
        } else {
            format!("{num_fulfilled}/{} of", self.num_required)
        }
    }

    /// For every choice of `num_required` children, the Cartesian product of
    /// their minimal combinations, flattened into one course set each.
    ///
    /// Children with no combination cannot contribute and are skipped before
    /// choosing, which keeps the enumeration from crossing dead branches.
    pub(crate) fn course_combinations<'a>(&self, courses: &'a [Course]) -> Vec<Vec<&'a Course>> {
        let per_child: Vec<Vec<Vec<&'a Course>>> = self
            .requirements
            .iter()
            .map(|requirement| requirement.course_combinations(courses))
            .filter(|combos| !combos.is_empty())
            .collect();

        combinations::choose(&per_child, self.num_required)
            .iter()
            .flat_map(|chosen| combinations::cartesian(chosen))
            .map(|product| {
                let mut flat: Vec<&Course> = Vec::new();
                for course in product.into_iter().flatten() {
                    if !flat.contains(&course) {
                        flat.push(course);
                    }
                }
                flat
            })
            .collect()
    }
}

impl fmt::Display for MultiRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fulfill with {} of:", self.num_required)?;
        for requirement in &self.requirements {
            write!(f, "\n{requirement}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::requirement::tests::{course, course_req};

    fn three_of(k: usize) -> (MultiRequirement, [Course; 3]) {
        let courses = [
            course("a", 4.0, &[]),
            course("b", 4.0, &[]),
            course("c", 4.0, &[]),
        ];
        let multi = MultiRequirement::new(
            "multi",
            "Core",
            courses
                .iter()
                .map(|c| course_req(&format!("req-{}", c.id()), c).into())
                .collect(),
            k,
        );
        (multi, courses)
    }

    #[test_case(0, 0, true; "zero required with nothing taken")]
    #[test_case(1, 0, false; "one required with nothing taken")]
    #[test_case(1, 1, true; "one required with one taken")]
    #[test_case(2, 1, false; "two required with one taken")]
    #[test_case(3, 2, false; "all required with two taken")]
    #[test_case(3, 3, true; "all required with all taken")]
    fn fulfilled_iff_enough_children(k: usize, taken: usize, expected: bool) {
        let (multi, courses) = three_of(k);
        let overrides = Overrides::new();
        assert_eq!(multi.num_fulfilled(&courses[..taken], &overrides), taken);
        assert_eq!(
            multi.is_fulfilled_with(&courses[..taken], &overrides),
            expected
        );
    }

    #[test]
    fn overridden_children_count_towards_total() {
        let (multi, _) = three_of(2);
        let overrides: Overrides = ["req-a", "req-c"].into_iter().collect();
        assert!(multi.is_fulfilled_with(&[], &overrides));
    }

    #[test_case(1, 0, "One of"; "one of")]
    #[test_case(3, 1, "All of"; "all of")]
    #[test_case(2, 1, "1/2 of"; "progress")]
    fn header_describes_rule(k: usize, fulfilled: usize, expected: &str) {
        let (multi, _) = three_of(k);
        assert_eq!(multi.header(fulfilled), expected);
    }

    #[test]
    fn hidden_requirement_annotates_with_description() {
        let (multi, _) = three_of(1);
        assert_eq!(multi.annotation(), None);
        let hidden = multi.with_hidden(true);
        assert_eq!(hidden.annotation(), Some(hidden.to_string()));
    }

    #[test]
    fn description_lists_children_under_header() {
        let (multi, _) = three_of(2);
        assert_eq!(multi.to_string(), "Fulfill with 2 of:\nA (TEST 1)\nB (TEST 1)\nC (TEST 1)");
    }

    #[test]
    fn combinations_choose_required_children() {
        let (multi, courses) = three_of(2);
        let combos = multi.course_combinations(&courses);
        assert_eq!(combos.len(), 3);
        assert!(combos.iter().all(|combo| combo.len() == 2));

        let (none_required, courses) = three_of(0);
        assert_eq!(
            none_required.course_combinations(&courses),
            vec![Vec::<&Course>::new()]
        );
    }

    #[test]
    fn combinations_skip_children_without_courses() {
        let (multi, courses) = three_of(2);
        assert!(multi.course_combinations(&courses[..1]).is_empty());
        assert_eq!(multi.course_combinations(&courses[..2]).len(), 1);
    }

    #[test]
    fn can_fulfill_checks_every_child() {
        let (multi, courses) = three_of(1);
        assert!(multi.can_fulfill(&courses[2]));
        assert!(!multi.can_fulfill(&course("z", 4.0, &[])));
    }
}
