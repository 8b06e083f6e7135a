use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Requirement;

/// What kind of academic goal a requirement set describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    /// A major.
    Major,
    /// A minor.
    Minor,
    /// Anything else: university, college or campus-wide requirements.
    #[default]
    Other,
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Other => "other",
        })
    }
}

/// A named group of requirement trees within a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) requirements: Vec<Requirement>,
}

impl Category {
    /// Construct a category.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, requirements: Vec<Requirement>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            requirements,
        }
    }

    /// The category id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The category name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root requirements of this category.
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

/// A requirement set: a major, a minor, or an institution-level set that
/// other goals inherit through `parent`.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) kind: GoalKind,
    pub(crate) parent: Option<String>,
    pub(crate) categories: Vec<Category>,
}

impl Goal {
    /// Construct a goal without a parent.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: GoalKind,
        categories: Vec<Category>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            parent: None,
            categories,
        }
    }

    /// Set the id of the goal this one inherits from.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// The goal id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The goal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The goal kind.
    #[must_use]
    pub const fn kind(&self) -> GoalKind {
        self.kind
    }

    /// The id of the parent goal, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// The categories of this goal, in catalog order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Every requirement root across all categories.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.categories
            .iter()
            .flat_map(|category| category.requirements.iter())
    }

    /// Case-insensitive substring match against id and name.
    #[must_use]
    pub fn matches(&self, prompt: &str) -> bool {
        let prompt = prompt.to_lowercase();
        self.id.to_lowercase().contains(&prompt) || self.name.to_lowercase().contains(&prompt)
    }
}
