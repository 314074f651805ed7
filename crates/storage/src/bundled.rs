//! Emergency scenarios shipped with the application.
//!
//! The pool is a static asset compiled into the binary, not a network resource.

use learnaid_core::model::{Scenario, ScenarioError};
use thiserror::Error;

const EMERGENCY_SCENARIOS_JSON: &str = include_str!("../assets/emergency_scenarios.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BundledError {
    #[error("bundled scenarios are not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ScenarioError),

    #[error("bundled scenario pool is empty")]
    Empty,
}

/// Decode and validate the bundled scenario pool.
///
/// # Errors
///
/// Returns `BundledError` if the asset does not decode or a record is malformed.
pub fn scenarios() -> Result<Vec<Scenario>, BundledError> {
    parse(EMERGENCY_SCENARIOS_JSON)
}

fn parse(raw: &str) -> Result<Vec<Scenario>, BundledError> {
    let scenarios: Vec<Scenario> = serde_json::from_str(raw)?;
    if scenarios.is_empty() {
        return Err(BundledError::Empty);
    }
    for scenario in &scenarios {
        scenario.validate()?;
    }
    tracing::debug!(count = scenarios.len(), "decoded bundled scenarios");
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bundled_pool_is_valid_and_large_enough_for_a_quiz() {
        let pool = scenarios().unwrap();
        assert!(pool.len() >= 5);
        let ids: HashSet<_> = pool.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), pool.len());
    }

    #[test]
    fn empty_asset_is_rejected() {
        assert!(matches!(parse("[]"), Err(BundledError::Empty)));
    }

    #[test]
    fn malformed_record_is_rejected() {
        let raw = r#"[{"id":"x","scenario":"?","options":["a"],"correct_answer":"b","explanation":"e"}]"#;
        assert!(matches!(parse(raw), Err(BundledError::Invalid(_))));
    }
}
