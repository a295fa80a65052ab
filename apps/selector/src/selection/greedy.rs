//! Greedy Selector — cheap first pass that front-loads skill-matching bullets.
//!
//! Picks individual bullets (ignoring story coherence) in order of:
//! 1. descending skill-match contribution (Σ target weights the bullet covers)
//! 2. higher story relevance
//! 3. shorter bullet
//! 4. input order
//!
//! Bullets that cover no target are never picked. A bullet that does not fit the
//! remaining line budget is skipped; the pass stops once lines or bullets run out.

use std::collections::HashSet;

use uuid::Uuid;

use crate::selection::combinations::Combination;
use crate::selection::models::{RankedStory, SelectionOutcome, SkillTargets, Story, StorySelection};
use crate::selection::value::ValueScorer;

/// Greedy result plus the bookkeeping the hybrid orchestrator needs.
#[derive(Debug, Clone)]
pub struct GreedyOutcome {
    pub outcome: SelectionOutcome,
    pub used_bullet_ids: HashSet<Uuid>,
}

struct Candidate {
    story_index: usize,
    bullet_index: usize,
    contribution: f64,
    relevance: f64,
    char_length: u32,
}

/// Runs the greedy pass. `ranked[i]` must rank `stories[i]`.
///
/// Each picked bullet scores as its singleton combination. Selections come back in
/// story order with bullet IDs in story order.
pub fn select_greedy(
    stories: &[Story],
    ranked: &[RankedStory],
    targets: Option<&SkillTargets>,
    scorer: &dyn ValueScorer,
    line_budget: u32,
    bullet_cap: u32,
) -> GreedyOutcome {
    let mut result = GreedyOutcome {
        outcome: SelectionOutcome::empty(),
        used_bullet_ids: HashSet::new(),
    };

    let Some(targets) = targets.filter(|t| !t.is_empty()) else {
        return result;
    };

    let mut candidates: Vec<Candidate> = stories
        .iter()
        .zip(ranked)
        .enumerate()
        .flat_map(|(story_index, (story, rank))| {
            story
                .bullets
                .iter()
                .enumerate()
                .map(move |(bullet_index, bullet)| Candidate {
                    story_index,
                    bullet_index,
                    contribution: targets.bullet_contribution(bullet),
                    relevance: rank.relevance,
                    char_length: bullet.char_length,
                })
        })
        .filter(|c| c.contribution > 0.0)
        .collect();

    // Stable sort keeps input order as the final tie-break.
    candidates.sort_by(|a, b| {
        b.contribution
            .partial_cmp(&a.contribution)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.relevance
                    .partial_cmp(&a.relevance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.char_length.cmp(&b.char_length))
    });

    let mut picked: Vec<Vec<usize>> = vec![Vec::new(); stories.len()];

    for candidate in &candidates {
        let outcome = &result.outcome;
        if outcome.lines_used >= line_budget || outcome.bullets_used >= bullet_cap {
            break;
        }

        let story = &stories[candidate.story_index];
        let value = scorer.score(
            &ranked[candidate.story_index],
            story,
            &Combination::single(candidate.bullet_index),
            Some(targets),
        );
        if value.lines > line_budget - outcome.lines_used {
            continue;
        }

        picked[candidate.story_index].push(candidate.bullet_index);
        result
            .used_bullet_ids
            .insert(story.bullets[candidate.bullet_index].id);
        result.outcome.lines_used += value.lines;
        result.outcome.bullets_used += 1;
        result.outcome.total_score += value.score;
    }

    for (story, mut indices) in stories.iter().zip(picked) {
        if indices.is_empty() {
            continue;
        }
        indices.sort_unstable();
        result.outcome.selections.push(StorySelection {
            story_id: story.id,
            bullet_ids: indices.iter().map(|&i| story.bullets[i].id).collect(),
        });
    }

    result
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
