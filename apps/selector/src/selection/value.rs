//! Value Scoring — pluggable scorer that prices one combination of one story.
//!
//! Default: `WeightedValueScorer` (relevance × completeness, plus a weighted skill
//! coverage bonus when skill targets are supplied).
//!
//! Any scorer must keep the knapsack's trade-off monotone: adding a bullet to a
//! combination never lowers its score, and always raises its cost.

use serde::{Deserialize, Serialize};

use crate::selection::combinations::{generate_combinations, Combination, CombinationPolicy};
use crate::selection::lines::LineEstimator;
use crate::selection::models::{RankedStory, SkillTargets, Story};

/// Default weight of the skill-coverage bonus relative to the relevance term.
pub const DEFAULT_SKILL_MATCH_WEIGHT: f64 = 0.5;

/// Cost and value of one candidate combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryValue {
    pub combination: Combination,
    pub total_chars: u32,
    pub lines: u32,
    pub bullet_count: u32,
    pub score: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap scoring backends without touching the solvers.
pub trait ValueScorer: Send + Sync {
    fn score(
        &self,
        ranked: &RankedStory,
        story: &Story,
        combination: &Combination,
        targets: Option<&SkillTargets>,
    ) -> StoryValue;
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedValueScorer — default implementation
// ────────────────────────────────────────────────────────────────────────────

/// Algorithm:
/// 1. completeness = chosen bullets / story bullets
/// 2. base = relevance × completeness
/// 3. With targets: coverage = Σ weight(covered skills) / Σ weight(all targets)
///    score = base + skill_match_weight × coverage
/// 4. Without targets (or all-zero weights): score = base
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightedValueScorer {
    pub lines: LineEstimator,
    pub skill_match_weight: f64,
}

impl Default for WeightedValueScorer {
    fn default() -> Self {
        Self {
            lines: LineEstimator::default(),
            skill_match_weight: DEFAULT_SKILL_MATCH_WEIGHT,
        }
    }
}

impl ValueScorer for WeightedValueScorer {
    fn score(
        &self,
        ranked: &RankedStory,
        story: &Story,
        combination: &Combination,
        targets: Option<&SkillTargets>,
    ) -> StoryValue {
        let mut total_chars = 0u32;
        let mut lines = 0u32;
        let mut bullet_count = 0u32;
        for bullet in combination.bullets(story) {
            total_chars = total_chars.saturating_add(bullet.char_length);
            lines = lines.saturating_add(self.lines.bullet_lines(bullet.char_length));
            bullet_count += 1;
        }

        let completeness = if story.bullets.is_empty() {
            0.0
        } else {
            bullet_count as f64 / story.bullets.len() as f64
        };
        let relevance = ranked.relevance.clamp(0.0, 1.0);
        let base = relevance * completeness;

        let bonus = match targets {
            Some(t) if !t.is_empty() => {
                let coverage = t.covered_weight(combination.bullets(story)) / t.total_weight();
                self.skill_match_weight.max(0.0) * coverage
            }
            _ => 0.0,
        };

        StoryValue {
            combination: combination.clone(),
            total_chars,
            lines,
            bullet_count,
            score: base + bonus,
        }
    }
}

/// Generates every candidate combination of `story` and prices each one.
pub fn build_story_values(
    scorer: &dyn ValueScorer,
    ranked: &RankedStory,
    story: &Story,
    policy: CombinationPolicy,
    targets: Option<&SkillTargets>,
) -> Vec<StoryValue> {
    generate_combinations(&story.bullets, policy)
        .iter()
        .map(|combination| scorer.score(ranked, story, combination, targets))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
