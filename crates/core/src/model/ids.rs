use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a server-assigned string identifier.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a course in the catalog.
    CourseId
);
string_id!(
    /// Identifier of a step, unique within its course.
    StepId
);
string_id!(
    /// Identifier of an emergency scenario in the bundled pool.
    ScenarioId
);
string_id!(
    /// Identifier of an authenticated user.
    UserId
);

/// Progress modules are the steps of a course, addressed by the same id.
pub type ModuleId = StepId;

/// Stable identity assigned to a note when it is created.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId({})", self.0)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing a `NoteId` from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse NoteId from {:?}", self.raw)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for NoteId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(NoteId)
            .map_err(|_| ParseIdError { raw: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ids_display_raw_value() {
        assert_eq!(CourseId::new("first-aid").to_string(), "first-aid");
        assert_eq!(format!("{:?}", StepId::from("s1")), "StepId(s1)");
    }

    #[test]
    fn string_ids_serialize_transparently() {
        let json = serde_json::to_string(&ScenarioId::new("sc-3")).unwrap();
        assert_eq!(json, "\"sc-3\"");
        let back: ScenarioId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScenarioId::new("sc-3"));
    }

    #[test]
    fn note_ids_are_unique_and_parse_back() {
        let a = NoteId::generate();
        let b = NoteId::generate();
        assert_ne!(a, b);
        let parsed: NoteId = a.to_string().parse().unwrap();
        assert_eq!(parsed, a);
        assert!("not-a-uuid".parse::<NoteId>().is_err());
    }
}
