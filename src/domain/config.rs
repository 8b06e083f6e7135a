use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for a planning workspace.
///
/// This struct holds the locations of the data files relative to the
/// workspace root, and the limits applied when building the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Path of the course list (YAML).
    pub courses: PathBuf,

    /// Path of the requirement catalog.
    ///
    /// Either a single YAML file mapping goal ids to goals, or a directory of
    /// YAML files with one goal each.
    pub catalog: PathBuf,

    /// Path of the student's plan (YAML).
    pub plan: PathBuf,

    /// The largest number of children a mutex requirement may have.
    ///
    /// Mutex evaluation enumerates every assignment of courses to children,
    /// which grows exponentially; larger groups are rejected when the catalog
    /// is built.
    max_mutex_children: usize,

    /// Whether to skip catalog files that cannot be parsed, instead of
    /// failing.
    pub allow_unrecognised: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            courses: default_courses(),
            catalog: default_catalog(),
            plan: default_plan(),
            max_mutex_children: default_max_mutex_children(),
            allow_unrecognised: false,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the largest permitted number of mutex children.
    #[must_use]
    pub const fn max_mutex_children(&self) -> usize {
        self.max_mutex_children
    }

    /// Sets the largest permitted number of mutex children.
    ///
    /// A value of zero is raised to one.
    pub fn set_max_mutex_children(&mut self, value: usize) {
        self.max_mutex_children = value.max(1);
    }
}

fn default_courses() -> PathBuf {
    PathBuf::from("courses.yaml")
}

fn default_catalog() -> PathBuf {
    PathBuf::from("catalog")
}

fn default_plan() -> PathBuf {
    PathBuf::from("plan.yaml")
}

const fn default_max_mutex_children() -> usize {
    10
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_courses")]
        courses: PathBuf,

        #[serde(default = "default_catalog")]
        catalog: PathBuf,

        #[serde(default = "default_plan")]
        plan: PathBuf,

        /// Upper bound on mutex group size.
        #[serde(default = "default_max_mutex_children")]
        max_mutex_children: usize,

        #[serde(default)]
        allow_unrecognised: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                courses,
                catalog,
                plan,
                max_mutex_children,
                allow_unrecognised,
            } => Self {
                courses,
                catalog,
                plan,
                max_mutex_children: max_mutex_children.max(1),
                allow_unrecognised,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            courses: config.courses,
            catalog: config.catalog,
            plan: config.plan,
            max_mutex_children: config.max_mutex_children,
            allow_unrecognised: config.allow_unrecognised,
        }
    }
}
