//! Knapsack Solver — multiple-choice, two-dimensional knapsack over story combinations.
//!
//! # Problem
//! Pick at most one combination per story so that Σ bullets ≤ `max_bullets` and
//! Σ lines ≤ `max_lines`, maximizing Σ score.
//!
//! # Algorithm
//! DP over the (bullets × lines) capacity grid, story by story. `best[cell]` is the arena
//! node of the best selection using *at most* that capacity. For each cell the story is
//! either skipped (carry the previous node) or one of its combinations is appended to the
//! previous best node at the residual capacity. A cell only changes on a strictly
//! greater score, so the first-discovered path wins ties: skipping beats an equal-scored
//! combination, and earlier combinations beat later ones.
//!
//! # Infeasibility
//! If nothing fits, the result is an empty selection with score 0 and no error. Errors
//! are reserved for malformed input.
//!
//! # Grid size
//! Work and arena growth scale with grid cells × stories. Requests above
//! `max_grid_cells` are rejected before anything is allocated.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::SelectionError;
use crate::selection::backtrack::{backtrack, StateArena, StateId, ROOT};
use crate::selection::models::{
    validate_stories, SelectionBudget, SelectionOutcome, Story, StorySelection,
};
use crate::selection::value::StoryValue;

/// Bullet cap the legacy hybrid path hands to phase 2 ("effectively unbounded").
pub const UNBOUNDED_BULLET_CAP: u32 = 1000;

/// Default ceiling on (bullet capacity + 1) × (line capacity + 1) × stories.
pub const DEFAULT_MAX_GRID_CELLS: u64 = 2_000_000;

/// The step recorded in a DP node: which combination was taken for which story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Choice {
    story_index: usize,
    value_index: usize,
}

/// Solves the multiple-choice knapsack. `story_values[i]` holds the candidate
/// combinations of `stories[i]`; a story with no candidates is simply never chosen.
///
/// Returns one `StorySelection` per chosen story, in story order, with bullet IDs in
/// combination order.
pub fn solve_knapsack(
    stories: &[Story],
    story_values: &[Vec<StoryValue>],
    max_bullets: u32,
    max_lines: u32,
    max_grid_cells: u64,
) -> Result<SelectionOutcome, SelectionError> {
    validate_stories(stories)?;
    SelectionBudget::new(max_bullets, max_lines).validate()?;
    if story_values.len() != stories.len() {
        return Err(SelectionError::ValueCountMismatch {
            expected: stories.len(),
            actual: story_values.len(),
        });
    }
    for (story, values) in stories.iter().zip(story_values) {
        validate_values(story, values)?;
    }

    // Capacity beyond what the input could ever use cannot change the optimum.
    let bullet_cap = clamp_capacity(max_bullets, story_values, |v| v.bullet_count);
    let line_cap = clamp_capacity(max_lines, story_values, |v| v.lines);
    let layers = story_values.iter().filter(|v| !v.is_empty()).count().max(1) as u64;
    let required = (bullet_cap as u64 + 1)
        .saturating_mul(line_cap as u64 + 1)
        .saturating_mul(layers);
    if required > max_grid_cells {
        return Err(SelectionError::GridTooLarge {
            cells: required,
            limit: max_grid_cells,
        });
    }
    let width = line_cap + 1;
    let cells = (bullet_cap + 1) * width;

    let mut arena: StateArena<Choice> = StateArena::new();
    let mut best: Vec<StateId> = vec![ROOT; cells];

    for (story_index, values) in story_values.iter().enumerate() {
        if values.is_empty() {
            continue;
        }

        let mut next = best.clone();
        // Cells that extend the same parent with the same combination share one node.
        let mut created: HashMap<(StateId, usize), StateId> = HashMap::new();

        for bullets in 0..=bullet_cap {
            for lines in 0..=line_cap {
                let cell = bullets * width + lines;
                let mut best_score = arena.score(best[cell]);
                let mut pick: Option<(StateId, usize)> = None;

                for (value_index, value) in values.iter().enumerate() {
                    let cost_bullets = value.bullet_count as usize;
                    let cost_lines = value.lines as usize;
                    if cost_bullets > bullets || cost_lines > lines {
                        continue;
                    }
                    let parent = best[(bullets - cost_bullets) * width + (lines - cost_lines)];
                    let candidate = arena.score(parent) + value.score;
                    if candidate > best_score {
                        best_score = candidate;
                        pick = Some((parent, value_index));
                    }
                }

                if let Some((parent, value_index)) = pick {
                    let node = *created.entry((parent, value_index)).or_insert_with(|| {
                        arena.push(
                            parent,
                            Choice {
                                story_index,
                                value_index,
                            },
                            values[value_index].score,
                        )
                    });
                    next[cell] = node;
                }
            }
        }

        best = next;
    }

    let terminal = best[cells - 1];
    debug!(
        stories = stories.len(),
        cells,
        nodes = arena.node_count(),
        score = arena.score(terminal),
        "knapsack solved"
    );

    let mut outcome = SelectionOutcome::empty();
    for choice in backtrack(&arena, terminal) {
        let story = &stories[choice.story_index];
        let value = &story_values[choice.story_index][choice.value_index];
        outcome.selections.push(StorySelection {
            story_id: story.id,
            bullet_ids: value.combination.bullets(story).map(|b| b.id).collect(),
        });
        outcome.lines_used += value.lines;
        outcome.bullets_used += value.bullet_count;
    }
    outcome.total_score = arena.score(terminal);

    Ok(outcome)
}

/// Rejects empty combinations, repeated or unordered indices, out-of-range bullet
/// indices, and negative or non-finite scores.
fn validate_values(story: &Story, values: &[StoryValue]) -> Result<(), SelectionError> {
    for value in values {
        let indices = value.combination.indices();
        if indices.is_empty() {
            return Err(SelectionError::EmptyCombination { story_id: story.id });
        }
        if indices.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(SelectionError::UnorderedCombination { story_id: story.id });
        }
        if let Some(&index) = indices
            .iter()
            .find(|&&i| i >= story.bullets.len())
        {
            return Err(SelectionError::CombinationOutOfBounds {
                story_id: story.id,
                index,
                len: story.bullets.len(),
            });
        }
        if !value.score.is_finite() || value.score < 0.0 {
            return Err(SelectionError::InvalidScore {
                story_id: story.id,
                score: value.score,
            });
        }
    }
    Ok(())
}

/// min(budget, Σ over stories of the costliest candidate in that dimension).
fn clamp_capacity(
    budget: u32,
    story_values: &[Vec<StoryValue>],
    cost: impl Fn(&StoryValue) -> u32,
) -> usize {
    let reachable: u64 = story_values
        .iter()
        .map(|values| values.iter().map(&cost).max().unwrap_or(0) as u64)
        .sum();
    reachable.min(budget as u64) as usize
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
