use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ScenarioId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScenarioError {
    #[error("scenario id cannot be empty")]
    EmptyId,

    #[error("scenario {0} has no options")]
    MissingOptions(ScenarioId),

    #[error("correct option of scenario {0} is not one of its options")]
    CorrectOptionNotListed(ScenarioId),

    #[error("scenario {0} has no explanation")]
    MissingExplanation(ScenarioId),
}

/// Emergency-response question from the bundled pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    #[serde(alias = "scenario")]
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(alias = "correct_answer")]
    pub correct_option: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Scenario {
    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_option == option
    }

    /// # Errors
    ///
    /// Returns `ScenarioError` when options are missing, the correct option is
    /// not among them, or the explanation is blank.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ScenarioError::EmptyId);
        }
        if self.options.is_empty() {
            return Err(ScenarioError::MissingOptions(self.id.clone()));
        }
        if !self.options.iter().any(|o| o == &self.correct_option) {
            return Err(ScenarioError::CorrectOptionNotListed(self.id.clone()));
        }
        if self.explanation.trim().is_empty() {
            return Err(ScenarioError::MissingExplanation(self.id.clone()));
        }
        Ok(())
    }
}

/// Immutable record of one answered scenario.
///
/// Attempts are only ever appended to the log; they are never edited or merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioAttempt {
    user_id: UserId,
    scenario_id: ScenarioId,
    selected_option: String,
    is_correct: bool,
    attempted_at: DateTime<Utc>,
}

impl ScenarioAttempt {
    /// Grades `selected_option` against the scenario and stamps the attempt.
    #[must_use]
    pub fn new(
        user_id: UserId,
        scenario: &Scenario,
        selected_option: impl Into<String>,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        let selected_option = selected_option.into();
        Self {
            user_id,
            scenario_id: scenario.id.clone(),
            is_correct: scenario.is_correct(&selected_option),
            selected_option,
            attempted_at,
        }
    }

    /// Rehydrate an attempt from persisted storage.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        scenario_id: ScenarioId,
        selected_option: String,
        is_correct: bool,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            scenario_id,
            selected_option,
            is_correct,
            attempted_at,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn scenario_id(&self) -> &ScenarioId {
        &self.scenario_id
    }

    #[must_use]
    pub fn selected_option(&self) -> &str {
        &self.selected_option
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn attempted_at(&self) -> DateTime<Utc> {
        self.attempted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn bleeding() -> Scenario {
        Scenario {
            id: ScenarioId::new("bleed"),
            prompt: "A deep cut is bleeding heavily.".into(),
            options: vec!["Apply pressure".into(), "Wash it".into()],
            correct_option: "Apply pressure".into(),
            explanation: "Direct pressure slows the bleeding.".into(),
            image: None,
        }
    }

    #[test]
    fn decodes_bundled_asset_shape() {
        let json = r#"{
            "id": "s1",
            "scenario": "Someone collapses.",
            "options": ["Call for help", "Walk away"],
            "correct_answer": "Call for help",
            "explanation": "Always get help first.",
            "image": "collapse.png"
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.prompt, "Someone collapses.");
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn validate_requires_listed_answer_and_explanation() {
        let mut s = bleeding();
        s.correct_option = "Ignore".into();
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::CorrectOptionNotListed(_))
        ));

        let mut s = bleeding();
        s.explanation = "  ".into();
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::MissingExplanation(_))
        ));
    }

    #[test]
    fn attempt_grades_selection() {
        let s = bleeding();
        let right = ScenarioAttempt::new(UserId::new("u1"), &s, "Apply pressure", fixed_now());
        let wrong = ScenarioAttempt::new(UserId::new("u1"), &s, "Wash it", fixed_now());
        assert!(right.is_correct());
        assert!(!wrong.is_correct());
        assert_eq!(wrong.scenario_id(), &ScenarioId::new("bleed"));
        assert_eq!(wrong.attempted_at(), fixed_now());
    }
}
