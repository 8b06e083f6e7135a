use std::fmt;

use serde::{Deserialize, Serialize};

/// Fulfillment state of a requirement node.
///
/// The ordering is meaningful: `Unfulfilled < Potential < Fulfilled`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Status {
    /// No course (and no override) fulfills the requirement.
    #[default]
    Unfulfilled = 0,

    /// The requirement can be fulfilled by one of the courses, but that course
    /// could also be put towards one or more competing requirements.
    Potential = 1,

    /// The requirement is fulfilled with certainty.
    Fulfilled = 2,
}

impl Status {
    /// The lowercase name used by display layers and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unfulfilled => "unfulfilled",
            Self::Potential => "potential",
            Self::Fulfilled => "fulfilled",
        }
    }

    /// Whether this is [`Status::Fulfilled`].
    #[must_use]
    pub const fn is_fulfilled(self) -> bool {
        matches!(self, Self::Fulfilled)
    }
}

impl From<bool> for Status {
    fn from(fulfilled: bool) -> Self {
        if fulfilled {
            Self::Fulfilled
        } else {
            Self::Unfulfilled
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Status;

    #[test]
    fn numeric_values_follow_certainty() {
        assert_eq!(Status::Unfulfilled as u8, 0);
        assert_eq!(Status::Potential as u8, 1);
        assert_eq!(Status::Fulfilled as u8, 2);
        assert!(Status::Unfulfilled < Status::Potential);
        assert!(Status::Potential < Status::Fulfilled);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Status::Potential).unwrap();
        assert_eq!(json, "\"potential\"");
        assert_eq!(Status::Fulfilled.to_string(), "fulfilled");
    }
}
