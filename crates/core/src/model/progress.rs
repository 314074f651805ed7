use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ModuleId, StepId};
use crate::model::notes::Notes;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("percent complete must be between 0 and 100, got {0}")]
    InvalidPercent(u8),

    #[error("confidence must be between 1 and 5, got {0}")]
    InvalidConfidence(u8),

    #[error("reflection text cannot be empty")]
    EmptyReflection,

    #[error("module {0} is not part of this progress snapshot")]
    UnknownModule(ModuleId),
}

//
// ─── BOUNDED VALUES ────────────────────────────────────────────────────────────
//

/// Course completion in whole percent, 0 through 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percent(u8);

impl Percent {
    pub const ZERO: Self = Self(0);

    /// # Errors
    ///
    /// Returns `ProgressError::InvalidPercent` above 100.
    pub fn new(value: u8) -> Result<Self, ProgressError> {
        if value > 100 {
            return Err(ProgressError::InvalidPercent(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Percent {
    type Error = ProgressError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for u8 {
    fn from(value: Percent) -> Self {
        value.0
    }
}

/// Self-rated confidence for a module, 1 (low) through 5 (high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidConfidence` outside `1..=5`.
    pub fn new(value: u8) -> Result<Self, ProgressError> {
        if !(1..=5).contains(&value) {
            return Err(ProgressError::InvalidConfidence(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Confidence {
    type Error = ProgressError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for u8 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub id: ModuleId,
    pub title: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

/// Server-authoritative summary of one user's progress through one course.
///
/// `percent_complete` is never computed locally; it is whatever the backend
/// last reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(alias = "percent", default)]
    pub percent_complete: Percent,
    #[serde(default)]
    pub modules: Vec<ModuleProgress>,
    #[serde(alias = "current_module_id", default)]
    pub last_module_id: Option<ModuleId>,
    #[serde(default)]
    pub notes: Notes,
}

impl ProgressSnapshot {
    /// Zeroed snapshot shown when the backend cannot be reached.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&ModuleProgress> {
        self.modules.iter().find(|m| &m.id == id)
    }

    /// Sets or replaces the reflection and confidence on a module.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::EmptyReflection` for blank text and
    /// `ProgressError::UnknownModule` if the module is not in the snapshot.
    pub fn upsert_reflection(
        &mut self,
        module_id: &ModuleId,
        reflection: impl Into<String>,
        confidence: Confidence,
    ) -> Result<(), ProgressError> {
        let reflection = reflection.into();
        if reflection.trim().is_empty() {
            return Err(ProgressError::EmptyReflection);
        }
        let module = self
            .modules
            .iter_mut()
            .find(|m| &m.id == module_id)
            .ok_or_else(|| ProgressError::UnknownModule(module_id.clone()))?;
        module.reflection = Some(reflection);
        module.confidence = Some(confidence);
        Ok(())
    }
}

/// Body sent when saving a learner's position in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub current_module_id: StepId,
    pub completed_module_ids: Vec<StepId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ProgressSnapshot {
        ProgressSnapshot {
            percent_complete: Percent::new(50).unwrap(),
            modules: vec![
                ModuleProgress {
                    id: ModuleId::new("mod1"),
                    title: "Wound Care".into(),
                    completed: true,
                    reflection: None,
                    confidence: None,
                },
                ModuleProgress {
                    id: ModuleId::new("mod2"),
                    title: "CPR Basics".into(),
                    completed: false,
                    reflection: None,
                    confidence: None,
                },
            ],
            last_module_id: Some(ModuleId::new("mod2")),
            notes: Notes::new(),
        }
    }

    #[test]
    fn bounded_values_reject_out_of_range() {
        assert!(Percent::new(100).is_ok());
        assert_eq!(Percent::new(101).unwrap_err(), ProgressError::InvalidPercent(101));
        assert!(Confidence::new(0).is_err());
        assert!(Confidence::new(6).is_err());
        assert_eq!(Confidence::new(3).unwrap().value(), 3);
    }

    #[test]
    fn decode_rejects_out_of_range_percent() {
        let json = r#"{"percent_complete": 140, "modules": [], "notes": []}"#;
        assert!(serde_json::from_str::<ProgressSnapshot>(json).is_err());
    }

    #[test]
    fn decode_fills_missing_fields() {
        let snapshot: ProgressSnapshot = serde_json::from_str(r#"{"percent": 75}"#).unwrap();
        assert_eq!(snapshot.percent_complete.value(), 75);
        assert!(snapshot.modules.is_empty());
        assert!(snapshot.notes.is_empty());
        assert_eq!(snapshot.last_module_id, None);
    }

    #[test]
    fn decode_accepts_string_notes() {
        let json = r#"{
            "percent": 75,
            "modules": [],
            "current_module_id": "mod2",
            "notes": ["Remember CPR"]
        }"#;
        let snapshot: ProgressSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.percent_complete.value(), 75);
        assert_eq!(snapshot.last_module_id, Some(ModuleId::new("mod2")));
        assert_eq!(snapshot.notes.texts(), vec!["Remember CPR"]);
    }

    #[test]
    fn upsert_reflection_replaces_previous_values() {
        let mut snap = snapshot();
        let id = ModuleId::new("mod1");
        snap.upsert_reflection(&id, "Felt shaky", Confidence::new(2).unwrap())
            .unwrap();
        snap.upsert_reflection(&id, "Much better", Confidence::new(4).unwrap())
            .unwrap();

        let module = snap.module(&id).unwrap();
        assert_eq!(module.reflection.as_deref(), Some("Much better"));
        assert_eq!(module.confidence.map(Confidence::value), Some(4));
    }

    #[test]
    fn upsert_reflection_requires_known_module() {
        let mut snap = snapshot();
        let err = snap
            .upsert_reflection(&ModuleId::new("nope"), "x", Confidence::new(1).unwrap())
            .unwrap_err();
        assert_eq!(err, ProgressError::UnknownModule(ModuleId::new("nope")));
    }

    #[test]
    fn empty_snapshot_is_zeroed() {
        let snap = ProgressSnapshot::empty();
        assert_eq!(snap.percent_complete, Percent::ZERO);
        assert!(snap.modules.is_empty());
        assert!(snap.notes.is_empty());
    }
}
