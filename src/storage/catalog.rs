//! Loading the requirement catalog.
//!
//! A catalog is stored either as a single YAML file mapping goal keys to
//! goals, or as a directory of YAML files holding one goal each. Field names
//! are camelCase:
//!
//! ```yaml
//! id: eecs
//! name: EECS Major
//! type: major
//! parentId: coe
//! requirementCategories:
//!   - id: eecs-math
//!     name: Math
//!     requirements:
//!       - id: math1a
//!         name: MATH 1A
//!         courseId: math1a
//! ```
//!
//! Each raw requirement becomes the first variant it qualifies for:
//!
//! 1. `courseId`: a course requirement;
//! 2. `tag`: a tag requirement;
//! 3. `units` with a `filter`: a unit requirement;
//! 4. `count` with a `filter`: a count requirement;
//! 5. `requirements`: a multi, poly or mutex requirement, by `kind`;
//! 6. anything else: a plain requirement, fulfilled only by override.

use std::{
    collections::BTreeSet,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use super::{LoadError, read};
use crate::domain::{
    Catalog, Category, Config, CountRequirement, CourseCatalog, CourseFilter, Goal, GoalKind,
    MultiRequirement, MutexRequirement, PlainRequirement, Requirement, StandaloneRequirement,
    UnitRequirement,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawGoal {
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    kind: GoalKind,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    requirement_categories: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCategory {
    id: String,
    name: String,
    #[serde(default)]
    requirements: Vec<RawRequirement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawRequirement {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    course_id: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    units: Option<f32>,
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    filter: Option<RawFilter>,
    #[serde(default)]
    requirements: Option<Vec<Self>>,
    #[serde(default)]
    num_required: Option<usize>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    kind: RawKind,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    #[default]
    Multi,
    Poly,
    Mutex,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawFilter {
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    courses: Option<Vec<String>>,
    #[serde(default)]
    dept: Option<String>,
    #[serde(default)]
    min_number: Option<u32>,
    #[serde(default)]
    max_number: Option<u32>,
}

/// Turns raw goals into domain goals, resolving course ids against the
/// course list.
struct Builder<'a> {
    courses: &'a CourseCatalog,
    max_mutex_children: usize,
}

impl Builder<'_> {
    fn goal(&self, raw: RawGoal) -> Result<Goal, LoadError> {
        let categories = raw
            .requirement_categories
            .into_iter()
            .map(|category| self.category(category))
            .collect::<Result<_, _>>()?;
        let goal = Goal::new(raw.id, raw.name, raw.kind, categories);
        Ok(match raw.parent_id {
            Some(parent) => goal.with_parent(parent),
            None => goal,
        })
    }

    fn category(&self, raw: RawCategory) -> Result<Category, LoadError> {
        let requirements = raw
            .requirements
            .into_iter()
            .map(|requirement| self.requirement(requirement))
            .collect::<Result<_, _>>()?;
        Ok(Category::new(raw.id, raw.name, requirements))
    }

    fn requirement(&self, raw: RawRequirement) -> Result<Requirement, LoadError> {
        let RawRequirement {
            id,
            name,
            course_id,
            tag,
            units,
            count,
            filter,
            requirements,
            num_required,
            hidden,
            kind,
        } = raw;
        let name = name.unwrap_or_else(|| id.clone());

        if let Some(course_id) = course_id {
            let Some(course) = self.courses.get(&course_id) else {
                return Err(LoadError::UnknownCourse {
                    requirement: id,
                    course: course_id,
                });
            };
            return Ok(StandaloneRequirement::course(id, name, course).into());
        }

        if let Some(tag) = tag {
            return Ok(StandaloneRequirement::tag(id, name, tag).into());
        }

        if let Some(units) = units {
            let filter = self.filter(&id, filter)?;
            return Ok(Requirement::Unit(UnitRequirement::new(id, name, filter, units)));
        }

        if let Some(count) = count {
            let filter = self.filter(&id, filter)?;
            return Ok(Requirement::Count(CountRequirement::new(id, name, filter, count)));
        }

        if let Some(children) = requirements {
            let children = children
                .into_iter()
                .map(|child| self.requirement(child))
                .collect::<Result<Vec<_>, _>>()?;
            return match kind {
                RawKind::Mutex => self.mutex(id, name, children),
                RawKind::Multi | RawKind::Poly => {
                    let required = num_required.unwrap_or(children.len());
                    if required > children.len() {
                        return Err(LoadError::InvalidNumRequired {
                            requirement: id,
                            required,
                            children: children.len(),
                        });
                    }
                    let multi =
                        MultiRequirement::new(id, name, children, required).with_hidden(hidden);
                    Ok(if kind == RawKind::Poly {
                        Requirement::Poly(multi)
                    } else {
                        Requirement::Multi(multi)
                    })
                }
            };
        }

        debug!(requirement = %id, "no predicate, loading as a plain requirement");
        Ok(Requirement::Plain(PlainRequirement::new(id, name)))
    }

    fn mutex(
        &self,
        id: String,
        name: String,
        children: Vec<Requirement>,
    ) -> Result<Requirement, LoadError> {
        if children.len() > self.max_mutex_children {
            return Err(LoadError::MutexTooLarge {
                mutex: id,
                children: children.len(),
                max: self.max_mutex_children,
            });
        }
        let children = children
            .into_iter()
            .map(|child| match child {
                Requirement::Standalone(standalone) => Ok(standalone),
                other => Err(LoadError::NonStandaloneMutexChild {
                    mutex: id.clone(),
                    child: other.id().to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Requirement::Mutex(MutexRequirement::new(id, name, children)))
    }

    fn filter(&self, requirement: &str, raw: Option<RawFilter>) -> Result<CourseFilter, LoadError> {
        let raw = raw.ok_or_else(|| LoadError::MissingFilter(requirement.to_string()))?;

        if let Some(tag) = raw.tag {
            return Ok(CourseFilter::Tag(tag));
        }

        if let Some(ids) = raw.courses {
            let canonical = ids
                .into_iter()
                .map(|course| {
                    self.courses
                        .get(&course)
                        .map(|found| found.canonical_id().to_string())
                        .ok_or_else(|| LoadError::UnknownCourse {
                            requirement: requirement.to_string(),
                            course,
                        })
                })
                .collect::<Result<BTreeSet<_>, _>>()?;
            return Ok(CourseFilter::Courses(canonical));
        }

        if let Some(dept) = raw.dept {
            return Ok(CourseFilter::Department {
                dept: dept.to_uppercase(),
                min_number: raw.min_number,
                max_number: raw.max_number,
            });
        }

        Err(LoadError::EmptyFilter(requirement.to_string()))
    }
}

fn build(
    raw_goals: Vec<RawGoal>,
    version: String,
    courses: &CourseCatalog,
    config: &Config,
) -> Result<Catalog, LoadError> {
    let builder = Builder {
        courses,
        max_mutex_children: config.max_mutex_children(),
    };
    let goals = raw_goals
        .into_iter()
        .map(|goal| builder.goal(goal))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Catalog::new(goals, version)?)
}

/// Hash each source's path and text, length-prefixed, so that moving text
/// between files or renaming a file changes the version.
fn version<'a>(sources: impl IntoIterator<Item = (&'a Path, &'a str)>) -> String {
    let mut hasher = Sha256::new();
    for (path, text) in sources {
        let path = path.to_string_lossy();
        for field in [path.as_bytes(), text.as_bytes()] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Parse a single-file catalog: a YAML mapping from goal keys to goals.
///
/// Goals keep the order in which they appear in the file.
///
/// # Errors
///
/// Returns an error if the text is not a valid catalog, or if the goals it
/// describes do not form a valid catalog.
pub fn parse_catalog(
    text: &str,
    path: &Path,
    courses: &CourseCatalog,
    config: &Config,
) -> Result<Catalog, LoadError> {
    let parse_error = |source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(text).map_err(parse_error)?;
    let raw_goals = mapping
        .into_iter()
        .map(|(_, goal)| serde_yaml::from_value::<RawGoal>(goal))
        .collect::<Result<Vec<_>, _>>()
        .map_err(parse_error)?;
    build(raw_goals, version([(path, text)]), courses, config)
}

/// Load the catalog at `path`, which may be a file or a directory.
///
/// # Errors
///
/// Fails if any file cannot be read or parsed (unless the configuration
/// allows unrecognised files, in which case they are skipped), or if the
/// goals do not form a valid catalog.
#[instrument(level = "debug", skip(courses, config))]
pub fn load_catalog(
    path: &Path,
    courses: &CourseCatalog,
    config: &Config,
) -> Result<Catalog, LoadError> {
    let catalog = if path.is_dir() {
        load_directory(path, courses, config)?
    } else {
        parse_catalog(&read(path)?, path, courses, config)?
    };
    debug!(goals = catalog.goals().len(), "loaded catalog");
    Ok(catalog)
}

fn load_directory(
    root: &Path,
    courses: &CourseCatalog,
    config: &Config,
) -> Result<Catalog, LoadError> {
    let paths = collect_yaml_paths(root);

    let results: Vec<_> = paths.par_iter().map(|path| try_load_goal(path)).collect();
    let (loaded, unrecognised): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);

    let loaded: Vec<_> = loaded.into_iter().filter_map(Result::ok).collect();
    let unrecognised: Vec<_> = unrecognised.into_iter().filter_map(Result::err).collect();

    if !unrecognised.is_empty() {
        if !config.allow_unrecognised {
            return Err(LoadError::UnrecognisedFiles(unrecognised));
        }
        debug!(skipped = unrecognised.len(), "skipped unrecognised catalog files");
    }

    let version = version(loaded.iter().map(|(path, text, _)| {
        (path.strip_prefix(root).unwrap_or(*path), text.as_str())
    }));
    let raw_goals = loaded.into_iter().map(|(_, _, goal)| goal).collect();
    build(raw_goals, version, courses, config)
}

fn collect_yaml_paths(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            matches!(
                entry.path().extension().and_then(OsStr::to_str),
                Some("yaml" | "yml")
            )
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn try_load_goal(path: &Path) -> Result<(&Path, String, RawGoal), PathBuf> {
    let text = read(path).map_err(|e| {
        warn!("{e}");
        path.to_path_buf()
    })?;
    match serde_yaml::from_str(&text) {
        Ok(goal) => Ok((path, text, goal)),
        Err(e) => {
            warn!("Failed to parse goal from {}: {e}", path.display());
            Err(path.to_path_buf())
        }
    }
}
