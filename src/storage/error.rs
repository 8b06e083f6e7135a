use std::{fmt, io, path::PathBuf};

use crate::domain::{CatalogError, CourseError};

/// Errors raised while reading courses, the catalog or a plan from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A file was read but is not valid YAML for its kind.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// Catalog files that could not be parsed.
    #[error("{}", UnrecognisedFiles(.0))]
    UnrecognisedFiles(Vec<PathBuf>),

    /// A requirement names a course that is not in the course list.
    #[error("requirement '{requirement}' names unknown course '{course}'")]
    UnknownCourse {
        /// The requirement id.
        requirement: String,
        /// The missing course id.
        course: String,
    },

    /// A mutex requirement has a child that is not a course or tag
    /// requirement.
    #[error("mutex requirement '{mutex}' has non-standalone child '{child}'")]
    NonStandaloneMutexChild {
        /// The mutex requirement id.
        mutex: String,
        /// The offending child id.
        child: String,
    },

    /// A mutex requirement has more children than the configured maximum.
    #[error("mutex requirement '{mutex}' has {children} children (maximum {max})")]
    MutexTooLarge {
        /// The mutex requirement id.
        mutex: String,
        /// How many children it has.
        children: usize,
        /// The configured maximum.
        max: usize,
    },

    /// A unit or count requirement has no filter.
    #[error("requirement '{0}' needs a filter")]
    MissingFilter(String),

    /// A filter selects nothing to filter by.
    #[error("requirement '{0}' has an empty filter")]
    EmptyFilter(String),

    /// A multi-requirement needs more children than it has.
    #[error("requirement '{requirement}' requires {required} of only {children} children")]
    InvalidNumRequired {
        /// The requirement id.
        requirement: String,
        /// The declared number required.
        required: usize,
        /// The number of children.
        children: usize,
    },

    /// The courses do not form a valid course catalog.
    #[error(transparent)]
    Course(#[from] CourseError),

    /// The goals do not form a valid catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors raised while writing a plan to disk.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The value could not be serialized.
    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        /// The destination file.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },
}

struct UnrecognisedFiles<'a>(&'a [PathBuf]);

impl fmt::Display for UnrecognisedFiles<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unrecognised files: ")?;
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}
