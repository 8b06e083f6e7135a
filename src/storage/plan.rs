use std::path::Path;

use tracing::instrument;

use super::{LoadError, SaveError, read};
use crate::domain::Plan;

/// Load a plan from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid plan.
#[instrument(level = "debug")]
pub fn load_plan(path: &Path) -> Result<Plan, LoadError> {
    let text = read(path)?;
    serde_yaml::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a plan to a YAML file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the plan cannot be serialized or the file cannot be
/// written.
#[instrument(level = "debug", skip(plan))]
pub fn save_plan(path: &Path, plan: &Plan) -> Result<(), SaveError> {
    let io_error = |source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    };
    let text = serde_yaml::to_string(plan).map_err(|source| SaveError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, text).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_plan_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("plan.yaml");
        let mut plan = Plan::new(2024, 2026, true, vec!["eecs".into()]).unwrap();
        plan.add_course("math1a", "Fall 2024").unwrap();
        plan.manually_fulfilled.fulfill("elwr");

        save_plan(&path, &plan).unwrap();

        assert_eq!(load_plan(&path).unwrap(), plan);
    }

    #[test]
    fn plan_file_is_readable_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        let plan = Plan::new(2024, 2025, false, vec!["eecs".into()]).unwrap();

        save_plan(&path, &plan).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("name: Fall 2024"));
        assert!(text.contains("- eecs"));
    }

    #[test]
    fn invalid_plan_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        std::fs::write(&path, "semesters: 3\n").unwrap();

        assert!(matches!(load_plan(&path), Err(LoadError::Parse { .. })));
    }
}
