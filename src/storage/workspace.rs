//! A planning workspace on disk.
//!
//! A workspace is a directory holding a `.plan/config.toml` file together
//! with the course list, the catalog and the student's plan at the paths the
//! configuration names (relative to the workspace root).

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, instrument};

use super::{LoadError, SaveError, load_catalog, load_courses, load_plan, save_plan};
use crate::{
    domain::{Catalog, Config, Course, CourseCatalog, CourseError, Plan},
    evaluation::Evaluator,
};

/// Directory holding workspace metadata, relative to the root.
pub const METADATA_DIR: &str = ".plan";

/// Errors raised while opening or saving a workspace.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// The configuration file exists but is invalid.
    #[error("{0}")]
    Config(String),

    /// Courses, catalog or plan could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The plan could not be saved.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// The plan refers to a course that is not in the course list.
    #[error(transparent)]
    Course(#[from] CourseError),

    /// No plan has been created yet.
    #[error("no plan found at {}; run `plan init` first", .0.display())]
    NoPlan(PathBuf),
}

/// A loaded workspace.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: Config,
    courses: CourseCatalog,
    evaluator: Evaluator,
    plan: Option<Plan>,
}

impl Workspace {
    /// Open the workspace rooted at `root`.
    ///
    /// A missing configuration file means the default configuration. A
    /// missing plan file is not an error; see [`Workspace::plan`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or if the courses,
    /// catalog or an existing plan cannot be loaded.
    #[instrument(level = "debug")]
    pub fn open(root: PathBuf) -> Result<Self, WorkspaceError> {
        let config = load_config(&root)?;
        let courses = load_courses(&root.join(&config.courses))?;
        let catalog = Arc::new(load_catalog(&root.join(&config.catalog), &courses, &config)?);

        let plan_path = root.join(&config.plan);
        let plan = if plan_path.exists() {
            Some(load_plan(&plan_path)?)
        } else {
            debug!("no plan at {}", plan_path.display());
            None
        };

        Ok(Self {
            root,
            config,
            courses,
            evaluator: Evaluator::new(catalog),
            plan,
        })
    }

    /// The workspace root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The course list.
    #[must_use]
    pub const fn courses(&self) -> &CourseCatalog {
        &self.courses
    }

    /// The requirement catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.evaluator.catalog()
    }

    /// The evaluator over this workspace's catalog. Its cache lives as long
    /// as the workspace.
    #[must_use]
    pub const fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// The plan, if one exists.
    #[must_use]
    pub const fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// The plan.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NoPlan`] if no plan exists yet.
    pub fn require_plan(&self) -> Result<&Plan, WorkspaceError> {
        self.plan.as_ref().ok_or_else(|| self.no_plan())
    }

    /// The plan, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NoPlan`] if no plan exists yet.
    pub fn require_plan_mut(&mut self) -> Result<&mut Plan, WorkspaceError> {
        let missing = self.no_plan();
        self.plan.as_mut().ok_or(missing)
    }

    /// Replace the plan. Call [`Workspace::save_plan`] to persist it.
    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = Some(plan);
    }

    /// The courses the plan enrolls in, in semester order.
    ///
    /// # Errors
    ///
    /// Fails if there is no plan, or the plan names a course that is not in
    /// the course list.
    pub fn planned_courses(&self) -> Result<Vec<Course>, WorkspaceError> {
        let plan = self.require_plan()?;
        Ok(self.courses.resolve(plan.course_ids())?)
    }

    /// Write the plan back to disk.
    ///
    /// # Errors
    ///
    /// Fails if there is no plan, or it cannot be written.
    pub fn save_plan(&self) -> Result<(), WorkspaceError> {
        let plan = self.require_plan()?;
        save_plan(&self.plan_path(), plan)?;
        Ok(())
    }

    /// Write the configuration to `.plan/config.toml`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be written.
    pub fn save_config(&self) -> Result<(), WorkspaceError> {
        write_config(&self.root, &self.config)
    }

    /// Replace the configuration. Call [`Workspace::save_config`] to persist
    /// it; it takes effect the next time the workspace is opened.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Where the plan is stored.
    #[must_use]
    pub fn plan_path(&self) -> PathBuf {
        self.root.join(&self.config.plan)
    }

    fn no_plan(&self) -> WorkspaceError {
        WorkspaceError::NoPlan(self.plan_path())
    }
}

/// Path of the configuration file for the workspace at `root`.
#[must_use]
pub fn config_path(root: &Path) -> PathBuf {
    root.join(METADATA_DIR).join("config.toml")
}

fn load_config(root: &Path) -> Result<Config, WorkspaceError> {
    let path = config_path(root);
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    Config::load(&path).map_err(WorkspaceError::Config)
}

/// Write `config` to the workspace at `root`, creating `.plan/` if needed.
///
/// # Errors
///
/// Fails if the directory or file cannot be written.
pub fn write_config(root: &Path, config: &Config) -> Result<(), WorkspaceError> {
    let path = config_path(root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SaveError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    config.save(&path).map_err(WorkspaceError::Config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::domain::{Requirement, Status};

    const COURSES: &str = "
- { id: math1a, dept: MATH, number: 1A, units: 4 }
- { id: math1b, dept: MATH, number: 1B, units: 4 }
";

    const CATALOG: &str = "
eecs:
  id: eecs
  name: EECS Major
  type: major
  requirementCategories:
    - id: eecs-math
      name: Math
      requirements:
        - { id: math1a, name: MATH 1A, courseId: math1a }
        - { id: math1b, name: MATH 1B, courseId: math1b }
";

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("courses.yaml"), COURSES).unwrap();
        fs::write(dir.path().join("catalog.yaml"), CATALOG).unwrap();
        let mut config = Config::default();
        config.catalog = PathBuf::from("catalog.yaml");
        write_config(dir.path(), &config).unwrap();
        dir
    }

    #[test]
    fn opens_without_a_plan() {
        let dir = workspace();
        let workspace = Workspace::open(dir.path().to_path_buf()).unwrap();

        assert_eq!(workspace.courses().len(), 2);
        assert_eq!(workspace.catalog().goals().len(), 1);
        assert!(workspace.plan().is_none());
        assert!(matches!(
            workspace.planned_courses(),
            Err(WorkspaceError::NoPlan(_))
        ));
    }

    #[test]
    fn plan_round_trips_through_the_workspace() {
        let dir = workspace();
        let mut workspace = Workspace::open(dir.path().to_path_buf()).unwrap();
        let mut plan = Plan::new(2024, 2025, false, vec!["eecs".into()]).unwrap();
        plan.add_course("math1a", "Fall 2024").unwrap();
        workspace.set_plan(plan);
        workspace.save_plan().unwrap();

        let workspace = Workspace::open(dir.path().to_path_buf()).unwrap();
        let courses = workspace.planned_courses().unwrap();
        let map = workspace
            .evaluator()
            .evaluate(&courses, &workspace.require_plan().unwrap().manually_fulfilled);

        assert_eq!(map.get("math1a").unwrap().status, Status::Fulfilled);
        assert_eq!(map.get("math1b").unwrap().status, Status::Unfulfilled);
    }

    #[test]
    fn repeated_evaluation_hits_the_cache() {
        let dir = workspace();
        let mut workspace = Workspace::open(dir.path().to_path_buf()).unwrap();
        let mut plan = Plan::new(2024, 2025, false, vec!["eecs".into()]).unwrap();
        plan.add_course("math1b", "Fall 2024").unwrap();
        workspace.set_plan(plan);

        let courses = workspace.planned_courses().unwrap();
        let overrides = &workspace.require_plan().unwrap().manually_fulfilled;
        let first = workspace.evaluator().evaluate(&courses, overrides);
        let second = workspace.evaluator().evaluate(&courses, overrides);

        assert!(std::sync::Arc::ptr_eq(&first, &second));
        let cache = workspace.evaluator().cache();
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn demo_workspace_evaluates() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/berkeley");
        let workspace = Workspace::open(root).unwrap();
        let plan = workspace.require_plan().unwrap();
        let courses = workspace.planned_courses().unwrap();
        let map = workspace
            .evaluator()
            .evaluate(&courses, &plan.manually_fulfilled);

        let nodes: Vec<&Requirement> = workspace
            .catalog()
            .requirements()
            .flat_map(Requirement::walk)
            .collect();
        assert_eq!(map.len(), nodes.len());

        let status = |id: &str| map.get(id).unwrap().status;
        assert_eq!(status("math1a"), Status::Fulfilled);
        assert_eq!(status("eecs-upper-units"), Status::Fulfilled);
        assert_eq!(status("eecs-design"), Status::Fulfilled);
        assert_eq!(status("ai"), Status::Unfulfilled);
        assert_eq!(status("compsci195"), Status::Unfulfilled);
        assert_eq!(status("coe-hss1"), Status::Fulfilled);
        assert_eq!(status("coe-hss-u1"), Status::Potential);
        assert_eq!(status("coe-hss-courses"), Status::Unfulfilled);
        assert!(map.get("elwr").unwrap().manual);
        assert_eq!(status("elwr"), Status::Fulfilled);

        for node in nodes {
            let description = node.to_string();
            for child in node.children() {
                assert!(description.contains(&child.to_string()), "{}", node.id());
            }
        }
    }

    #[test]
    fn unknown_planned_course_is_reported() {
        let dir = workspace();
        let mut workspace = Workspace::open(dir.path().to_path_buf()).unwrap();
        let mut plan = Plan::new(2024, 2025, false, vec![]).unwrap();
        plan.add_course("physics7a", "Fall 2024").unwrap();
        workspace.set_plan(plan);

        assert!(matches!(
            workspace.planned_courses(),
            Err(WorkspaceError::Course(CourseError::UnknownCourse(id))) if id == "physics7a"
        ));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = workspace();
        fs::write(config_path(dir.path()), "_version = \"7\"\n").unwrap();

        assert!(matches!(
            Workspace::open(dir.path().to_path_buf()),
            Err(WorkspaceError::Config(_))
        ));
    }
}
