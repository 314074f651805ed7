use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::StepId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepError {
    #[error("a course must contain at least one step")]
    EmptyCourse,

    #[error("step id cannot be empty")]
    EmptyId,

    #[error("duplicate step id {0}")]
    DuplicateId(StepId),

    #[error("multiple choice step {0} has no options")]
    MissingOptions(StepId),

    #[error("multiple choice step {0} has no correct option")]
    MissingCorrectOption(StepId),

    #[error("correct option of step {0} is not one of its options")]
    CorrectOptionNotListed(StepId),

    #[error("step {0} is not multiple choice but carries answer options")]
    UnexpectedOptions(StepId),
}

//
// ─── STEP ──────────────────────────────────────────────────────────────────────
//

/// Kind of a course content unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Informational slide.
    Info,
    /// Question with a fixed list of options and one correct answer.
    #[serde(alias = "mcq")]
    MultipleChoice,
    /// Terminal marker closing the course.
    Finish,
}

/// One unit of course content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    #[serde(rename = "type", alias = "kind")]
    pub kind: StepKind,
    pub title: String,
    #[serde(alias = "description", default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(
        default,
        alias = "correct_answer",
        skip_serializing_if = "Option::is_none"
    )]
    pub correct_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Step {
    #[must_use]
    pub fn info(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: StepId::new(id),
            kind: StepKind::Info,
            title: title.into(),
            body: body.into(),
            image: None,
            options: Vec::new(),
            correct_option: None,
            explanation: None,
        }
    }

    #[must_use]
    pub fn multiple_choice(
        id: impl Into<String>,
        title: impl Into<String>,
        options: &[&str],
        correct_option: impl Into<String>,
    ) -> Self {
        Self {
            id: StepId::new(id),
            kind: StepKind::MultipleChoice,
            title: title.into(),
            body: String::new(),
            image: None,
            options: options.iter().map(|o| (*o).to_string()).collect(),
            correct_option: Some(correct_option.into()),
            explanation: None,
        }
    }

    #[must_use]
    pub fn finish(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: StepId::new(id),
            kind: StepKind::Finish,
            title: title.into(),
            body: String::new(),
            image: None,
            options: Vec::new(),
            correct_option: None,
            explanation: None,
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        self.kind == StepKind::MultipleChoice
    }

    /// Whether `option` is the correct answer. `None` for non-question steps.
    #[must_use]
    pub fn is_correct(&self, option: &str) -> Option<bool> {
        if !self.is_multiple_choice() {
            return None;
        }
        self.correct_option.as_deref().map(|c| c == option)
    }

    /// Checks the per-kind shape of the step.
    ///
    /// # Errors
    ///
    /// Returns `StepError` if a question lacks options or a correct option from
    /// its own list, or if a non-question step carries options.
    pub fn validate(&self) -> Result<(), StepError> {
        if self.id.as_str().trim().is_empty() {
            return Err(StepError::EmptyId);
        }

        match self.kind {
            StepKind::MultipleChoice => {
                if self.options.is_empty() {
                    return Err(StepError::MissingOptions(self.id.clone()));
                }
                let correct = self
                    .correct_option
                    .as_ref()
                    .ok_or_else(|| StepError::MissingCorrectOption(self.id.clone()))?;
                if !self.options.iter().any(|o| o == correct) {
                    return Err(StepError::CorrectOptionNotListed(self.id.clone()));
                }
            }
            StepKind::Info | StepKind::Finish => {
                if !self.options.is_empty() || self.correct_option.is_some() {
                    return Err(StepError::UnexpectedOptions(self.id.clone()));
                }
            }
        }
        Ok(())
    }
}

//
// ─── COURSE STEPS ──────────────────────────────────────────────────────────────
//

/// Validated, non-empty, ordered step sequence of one course.
///
/// The last step is conventionally `Finish`, but that is not enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSteps(Vec<Step>);

impl CourseSteps {
    /// # Errors
    ///
    /// Returns `StepError::EmptyCourse` for an empty list, `StepError::DuplicateId`
    /// when two steps share an id, or the first per-step validation failure.
    pub fn new(steps: Vec<Step>) -> Result<Self, StepError> {
        if steps.is_empty() {
            return Err(StepError::EmptyCourse);
        }
        let mut seen = HashSet::with_capacity(steps.len());
        for step in &steps {
            step.validate()?;
            if !seen.insert(&step.id) {
                return Err(StepError::DuplicateId(step.id.clone()));
            }
        }
        Ok(Self(steps))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Step] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Step> {
        self.0
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_step_shape() {
        let json = r#"{
            "id": "m2",
            "type": "mcq",
            "title": "Check breathing",
            "description": "What comes first?",
            "options": ["Airway", "Pulse"],
            "correct_answer": "Airway",
            "explanation": "Open the airway before anything else."
        }"#;
        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.kind, StepKind::MultipleChoice);
        assert_eq!(step.body, "What comes first?");
        assert_eq!(step.correct_option.as_deref(), Some("Airway"));
        assert!(step.validate().is_ok());
    }

    #[test]
    fn question_requires_listed_correct_option() {
        let step = Step::multiple_choice("q1", "Q", &["A", "B"], "C");
        assert_eq!(
            step.validate().unwrap_err(),
            StepError::CorrectOptionNotListed(StepId::new("q1"))
        );

        let mut no_options = Step::multiple_choice("q2", "Q", &[], "A");
        no_options.options.clear();
        assert!(matches!(
            no_options.validate(),
            Err(StepError::MissingOptions(_))
        ));
    }

    #[test]
    fn info_step_rejects_options() {
        let mut step = Step::info("i1", "Intro", "Welcome");
        step.options.push("A".into());
        assert!(matches!(
            step.validate(),
            Err(StepError::UnexpectedOptions(_))
        ));
    }

    #[test]
    fn is_correct_only_answers_for_questions() {
        let q = Step::multiple_choice("q1", "Q", &["A", "B"], "B");
        assert_eq!(q.is_correct("B"), Some(true));
        assert_eq!(q.is_correct("A"), Some(false));
        assert_eq!(Step::info("i", "t", "b").is_correct("A"), None);
    }

    #[test]
    fn course_steps_reject_empty_and_duplicates() {
        assert_eq!(CourseSteps::new(vec![]).unwrap_err(), StepError::EmptyCourse);

        let err = CourseSteps::new(vec![
            Step::info("a", "A", ""),
            Step::finish("a", "Done"),
        ])
        .unwrap_err();
        assert_eq!(err, StepError::DuplicateId(StepId::new("a")));
    }
}
