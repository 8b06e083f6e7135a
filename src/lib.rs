//! Degree Planning
//!
//! Students select goals (majors, minors, institution-wide requirement sets),
//! place courses in semesters, and ask which requirements those courses
//! fulfill.

pub mod domain;
pub use domain::{
    Catalog, Config, Course, CourseCatalog, Goal, Overrides, Plan, Requirement, Status,
};

/// Walks requirement trees against a course set, and caches the results.
pub mod evaluation;
pub use evaluation::{Evaluator, FulfillmentMap};

/// File formats and the on-disk workspace.
pub mod storage;
pub use storage::Workspace;
