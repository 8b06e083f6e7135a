use std::path::Path;

mod catalog;
mod courses;
mod error;
mod plan;
pub mod workspace;

pub use catalog::{load_catalog, parse_catalog};
pub use courses::{CourseNumberText, CourseRecord, course_catalog, load_courses, parse_courses};
pub use error::{LoadError, SaveError};
pub use plan::{load_plan, save_plan};
pub use workspace::{Workspace, WorkspaceError};

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
