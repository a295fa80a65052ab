//! Selection artifact — the JSON envelope the pipeline persists and hands to the
//! bullet-rewriting and rendering stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::selection::hybrid::{HybridOutcome, PhaseBreakdown};
use crate::selection::models::{SelectionBudget, SelectionOutcome, StorySelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    Hybrid,
    Knapsack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionArtifact {
    pub artifact_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub mode: SelectionMode,
    pub budget: SelectionBudget,
    pub selections: Vec<StorySelection>,
    pub total_score: f64,
    pub lines_used: u32,
    pub bullets_used: u32,
    /// Present for hybrid runs only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phases: Option<PhaseBreakdown>,
}

impl SelectionArtifact {
    pub fn from_hybrid(result: HybridOutcome, budget: SelectionBudget) -> Self {
        let mut artifact = Self::build(result.outcome, budget, SelectionMode::Hybrid);
        artifact.phases = Some(result.phases);
        artifact
    }

    pub fn from_knapsack(outcome: SelectionOutcome, budget: SelectionBudget) -> Self {
        Self::build(outcome, budget, SelectionMode::Knapsack)
    }

    fn build(outcome: SelectionOutcome, budget: SelectionBudget, mode: SelectionMode) -> Self {
        Self {
            artifact_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            mode,
            budget,
            selections: outcome.selections,
            total_score: outcome.total_score,
            lines_used: outcome.lines_used,
            bullets_used: outcome.bullets_used,
            phases: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn make_outcome() -> SelectionOutcome {
        SelectionOutcome {
            selections: vec![StorySelection {
                story_id: Uuid::new_v4(),
                bullet_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            }],
            total_score: 1.25,
            lines_used: 3,
            bullets_used: 2,
        }
    }

    #[test]
    fn test_knapsack_artifact_omits_phases() {
        let artifact =
            SelectionArtifact::from_knapsack(make_outcome(), SelectionBudget::new(10, 20));
        let json: Value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["mode"], "knapsack");
        assert!(json.get("phases").is_none());
        assert_eq!(json["selections"][0]["bullet_ids"].as_array().unwrap().len(), 2);
        assert_eq!(json["budget"]["max_lines"], 20);
    }

    #[test]
    fn test_hybrid_artifact_carries_phases() {
        let phases = PhaseBreakdown {
            greedy_budget: 16,
            greedy_lines: 2,
            greedy_bullets: 2,
            greedy_score: 0.75,
            knapsack_lines: 1,
            knapsack_bullets: 1,
            knapsack_score: 0.5,
            knapsack_applied: true,
        };
        let result = HybridOutcome {
            outcome: make_outcome(),
            phases,
        };
        let artifact = SelectionArtifact::from_hybrid(result, SelectionBudget::new(10, 20));
        let json: Value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["mode"], "hybrid");
        assert_eq!(json["phases"]["greedy_budget"], 16);
        assert_eq!(json["total_score"], 1.25);
    }
}
