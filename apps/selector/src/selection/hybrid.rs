//! Hybrid Orchestrator — greedy skill pass followed by a knapsack pass over what's left.
//!
//! # Steps
//! 1. `greedy_budget = floor(max_lines × skill_match_ratio)`
//! 2. Greedy pass over `greedy_budget` (and `max_bullets`)
//! 3. `remaining_lines = max_lines − greedy lines`; nothing left → greedy result as-is
//! 4. Drop used bullets and emptied stories; cap story length for enumeration
//! 5. Price combinations against the skill targets the greedy pass left uncovered
//! 6. Knapsack over `remaining_lines` with the configured phase-2 bullet cap
//! 7. Phase-2 infeasibility or errors degrade to the greedy result, except an
//!    oversized DP grid, which is the request's fault and is returned as an error
//! 8. Merge per story (greedy bullets first); score = greedy + knapsack
//!
//! # Phase-2 bullet cap
//! The legacy hybrid path handed phase 2 a fixed cap of 1000, so the caller's
//! `max_bullets` was only honored by the greedy pass and the merged result could exceed
//! it. That behavior is `Phase2BulletCap::Unbounded`.
//!
//! The default, `Phase2BulletCap::Remaining`, departs from it: phase 2 gets
//! `max_bullets − greedy bullets`, so the merged result honors both budgets. Set
//! `PHASE2_BULLET_CAP=unbounded` to reproduce the legacy output exactly.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::SelectionError;
use crate::selection::combinations::CombinationPolicy;
use crate::selection::greedy::{select_greedy, GreedyOutcome};
use crate::selection::knapsack::{solve_knapsack, DEFAULT_MAX_GRID_CELLS, UNBOUNDED_BULLET_CAP};
use crate::selection::models::{
    align_rankings, validate_stories, RankedStory, SelectionBudget, SelectionOutcome,
    SkillTargets, Story, StorySelection,
};
use crate::selection::value::{build_story_values, StoryValue, ValueScorer};

pub const DEFAULT_SKILL_MATCH_RATIO: f64 = 0.8;
pub const DEFAULT_MAX_COMBINATION_BULLETS: usize = 10;

/// Bullet cap handed to the phase-2 knapsack. The default is stricter than the
/// legacy cap; see the module docs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase2BulletCap {
    /// `max_bullets` minus what the greedy pass used. Departs from the legacy
    /// behavior.
    #[default]
    Remaining,
    /// Legacy cap of 1000; can exceed the caller's `max_bullets`.
    Unbounded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridConfig {
    /// Share of the line budget given to the greedy pass (0.0 – 1.0).
    pub skill_match_ratio: f64,
    /// Longest story (after filtering) the combination generator will enumerate.
    pub max_combination_bullets: usize,
    pub combination_policy: CombinationPolicy,
    /// Defaults to `Remaining`, not the legacy `Unbounded`.
    pub phase2_bullet_cap: Phase2BulletCap,
    /// Largest knapsack grid (cells × stories) a single request may build.
    pub max_grid_cells: u64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            skill_match_ratio: DEFAULT_SKILL_MATCH_RATIO,
            max_combination_bullets: DEFAULT_MAX_COMBINATION_BULLETS,
            combination_policy: CombinationPolicy::default(),
            phase2_bullet_cap: Phase2BulletCap::default(),
            max_grid_cells: DEFAULT_MAX_GRID_CELLS,
        }
    }
}

/// How the two phases contributed to the merged result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseBreakdown {
    pub greedy_budget: u32,
    pub greedy_lines: u32,
    pub greedy_bullets: u32,
    pub greedy_score: f64,
    pub knapsack_lines: u32,
    pub knapsack_bullets: u32,
    pub knapsack_score: f64,
    /// False when phase 2 was skipped or degraded to the greedy result.
    pub knapsack_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridOutcome {
    pub outcome: SelectionOutcome,
    pub phases: PhaseBreakdown,
}

/// `floor(max_lines × ratio)`.
pub fn greedy_budget(max_lines: u32, skill_match_ratio: f64) -> u32 {
    (max_lines as f64 * skill_match_ratio).floor() as u32
}

/// Runs the greedy + knapsack hybrid. Malformed input fails fast; "nothing fits"
/// returns an empty outcome with score 0.
pub fn select_hybrid(
    stories: &[Story],
    rankings: &[RankedStory],
    targets: Option<&SkillTargets>,
    budget: SelectionBudget,
    config: &HybridConfig,
    scorer: &dyn ValueScorer,
) -> Result<HybridOutcome, SelectionError> {
    validate_stories(stories)?;
    budget.validate()?;
    let ratio = config.skill_match_ratio;
    if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
        return Err(SelectionError::InvalidRatio(ratio));
    }
    let ranked = align_rankings(stories, rankings)?;

    // ── Phase 1: greedy ─────────────────────────────────────────────────────
    let phase1_budget = greedy_budget(budget.max_lines, ratio);
    let greedy = select_greedy(
        stories,
        &ranked,
        targets,
        scorer,
        phase1_budget,
        budget.max_bullets,
    );
    debug!(
        greedy_budget = phase1_budget,
        lines = greedy.outcome.lines_used,
        bullets = greedy.outcome.bullets_used,
        score = greedy.outcome.total_score,
        "greedy pass complete"
    );

    let mut phases = PhaseBreakdown {
        greedy_budget: phase1_budget,
        greedy_lines: greedy.outcome.lines_used,
        greedy_bullets: greedy.outcome.bullets_used,
        greedy_score: greedy.outcome.total_score,
        knapsack_lines: 0,
        knapsack_bullets: 0,
        knapsack_score: 0.0,
        knapsack_applied: false,
    };

    let remaining_lines = budget.max_lines.saturating_sub(greedy.outcome.lines_used);
    if remaining_lines == 0 {
        debug!("greedy pass consumed the line budget; skipping knapsack");
        return Ok(greedy_only(stories, greedy, phases));
    }

    let phase2_cap = match config.phase2_bullet_cap {
        Phase2BulletCap::Remaining => budget
            .max_bullets
            .saturating_sub(greedy.outcome.bullets_used),
        Phase2BulletCap::Unbounded => UNBOUNDED_BULLET_CAP,
    };
    if phase2_cap == 0 {
        debug!("greedy pass consumed the bullet budget; skipping knapsack");
        return Ok(greedy_only(stories, greedy, phases));
    }

    // ── Phase 2: knapsack over what's left ──────────────────────────────────
    let (filtered, filtered_ranked) = filter_unused(
        stories,
        &ranked,
        &greedy.used_bullet_ids,
        config.max_combination_bullets,
    );
    if filtered.is_empty() {
        return Ok(greedy_only(stories, greedy, phases));
    }

    let remaining_targets = targets.map(|t| {
        let used = stories
            .iter()
            .flat_map(|s| &s.bullets)
            .filter(|b| greedy.used_bullet_ids.contains(&b.id));
        t.without(&t.covered_by(used))
    });

    let values: Vec<Vec<StoryValue>> = filtered
        .iter()
        .zip(&filtered_ranked)
        .map(|(story, rank)| {
            build_story_values(
                scorer,
                rank,
                story,
                config.combination_policy,
                remaining_targets.as_ref(),
            )
        })
        .collect();

    let knapsack = match solve_knapsack(
        &filtered,
        &values,
        phase2_cap,
        remaining_lines,
        config.max_grid_cells,
    ) {
        Ok(outcome) if !outcome.is_empty() => outcome,
        Ok(_) => {
            debug!("knapsack found nothing that fits; using greedy result");
            return Ok(greedy_only(stories, greedy, phases));
        }
        Err(e @ SelectionError::GridTooLarge { .. }) => return Err(e),
        Err(e) => {
            warn!("knapsack pass failed, using greedy result: {e}");
            return Ok(greedy_only(stories, greedy, phases));
        }
    };

    phases.knapsack_lines = knapsack.lines_used;
    phases.knapsack_bullets = knapsack.bullets_used;
    phases.knapsack_score = knapsack.total_score;
    phases.knapsack_applied = true;

    let outcome = merge(stories, &greedy.outcome, &knapsack);
    info!(
        stories = outcome.selections.len(),
        lines = outcome.lines_used,
        bullets = outcome.bullets_used,
        score = outcome.total_score,
        "hybrid selection complete"
    );

    Ok(HybridOutcome { outcome, phases })
}

/// Drops used bullets and emptied stories, truncating long stories to `max_bullets`
/// remaining bullets. Each surviving story keeps its original ranking.
fn filter_unused(
    stories: &[Story],
    ranked: &[RankedStory],
    used: &HashSet<Uuid>,
    max_bullets: usize,
) -> (Vec<Story>, Vec<RankedStory>) {
    let mut filtered = Vec::new();
    let mut filtered_ranked = Vec::new();

    for (story, rank) in stories.iter().zip(ranked) {
        let mut bullets: Vec<_> = story
            .bullets
            .iter()
            .filter(|b| !used.contains(&b.id))
            .cloned()
            .collect();
        if bullets.is_empty() {
            continue;
        }
        if bullets.len() > max_bullets {
            warn!(
                story_id = %story.id,
                bullets = bullets.len(),
                kept = max_bullets,
                "story too long for combination enumeration, truncating"
            );
            bullets.truncate(max_bullets);
            if bullets.is_empty() {
                continue;
            }
        }
        filtered.push(Story {
            id: story.id,
            bullets,
        });
        filtered_ranked.push(rank.clone());
    }

    (filtered, filtered_ranked)
}

/// Concatenates per-story bullet lists (phase 1 first) in input story order.
fn merge(
    stories: &[Story],
    greedy: &SelectionOutcome,
    knapsack: &SelectionOutcome,
) -> SelectionOutcome {
    let mut by_story: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for selection in greedy.selections.iter().chain(&knapsack.selections) {
        by_story
            .entry(selection.story_id)
            .or_default()
            .extend(selection.bullet_ids.iter().copied());
    }

    let selections = stories
        .iter()
        .filter_map(|story| {
            by_story.remove(&story.id).map(|bullet_ids| StorySelection {
                story_id: story.id,
                bullet_ids,
            })
        })
        .collect();

    SelectionOutcome {
        selections,
        total_score: greedy.total_score + knapsack.total_score,
        lines_used: greedy.lines_used + knapsack.lines_used,
        bullets_used: greedy.bullets_used + knapsack.bullets_used,
    }
}

fn greedy_only(stories: &[Story], greedy: GreedyOutcome, phases: PhaseBreakdown) -> HybridOutcome {
    HybridOutcome {
        outcome: merge(stories, &greedy.outcome, &SelectionOutcome::empty()),
        phases,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
