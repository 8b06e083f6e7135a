//! Domain models for degree planning.
//!
//! This module contains the core domain types: courses, the requirement tree
//! and its fulfillment engine, goals and the catalog that holds them, and the
//! student's plan.

/// Course records and the course catalog.
pub mod course;
pub use course::{Course, CourseCatalog, CourseError, CourseNumber};

/// Requirement tree and per-variant fulfillment logic.
pub mod requirement;
pub use requirement::{
    CountRequirement, CourseFilter, MultiRequirement, MutexRequirement, PlainRequirement,
    Predicate, Requirement, StandaloneRequirement, UnitRequirement,
};

pub mod combinations;

mod catalog;
pub use catalog::{Catalog, CatalogError};

mod config;
pub use config::Config;

mod goal;
pub use goal::{Category, Goal, GoalKind};

mod overrides;
pub use overrides::Overrides;

mod plan;
pub use plan::{Plan, PlanError, Semester};

mod status;
pub use status::Status;
