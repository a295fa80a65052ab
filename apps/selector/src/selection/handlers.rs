//! Axum route handlers for the Selection API.
//!
//! The engine is CPU-bound and synchronous, so each request runs it inside
//! `tokio::task::spawn_blocking` to keep the scheduler free.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::selection::artifact::SelectionArtifact;
use crate::selection::hybrid::{select_hybrid, HybridConfig};
use crate::selection::knapsack::solve_knapsack;
use crate::selection::models::{
    align_rankings, validate_stories, RankedStory, SelectionBudget, SkillTargets, Story,
};
use crate::selection::value::{build_story_values, StoryValue, ValueScorer};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub stories: Vec<Story>,
    pub rankings: Vec<RankedStory>,
    #[serde(default)]
    pub skill_targets: Option<SkillTargets>,
    pub max_bullets: u32,
    pub max_lines: u32,
    /// Overrides the configured greedy share of the line budget (hybrid only).
    #[serde(default)]
    pub skill_match_ratio: Option<f64>,
}

impl SelectionRequest {
    fn budget(&self) -> SelectionBudget {
        SelectionBudget::new(self.max_bullets, self.max_lines)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/selections
///
/// Greedy skill pass + knapsack pass. Returns the selection artifact.
pub async fn handle_select(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<SelectionArtifact>, AppError> {
    let mut config = state.config.selection.hybrid.clone();
    if let Some(ratio) = request.skill_match_ratio {
        config.skill_match_ratio = ratio;
    }
    let scorer = state.scorer.clone();

    let artifact = tokio::task::spawn_blocking(move || run_hybrid(&request, &config, scorer.as_ref()))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in selection: {e}")))??;

    info!(
        artifact_id = %artifact.artifact_id,
        selections = artifact.selections.len(),
        score = artifact.total_score,
        "hybrid selection served"
    );
    Ok(Json(artifact))
}

/// POST /api/v1/selections/knapsack
///
/// Knapsack only, over every story's full combination set. Stories longer than the
/// configured combination limit are rejected rather than truncated.
pub async fn handle_select_knapsack(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<SelectionArtifact>, AppError> {
    let artifact = tokio::task::spawn_blocking(move || run_knapsack(&request, &state))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in selection: {e}")))??;

    info!(
        artifact_id = %artifact.artifact_id,
        selections = artifact.selections.len(),
        score = artifact.total_score,
        "knapsack selection served"
    );
    Ok(Json(artifact))
}

// ────────────────────────────────────────────────────────────────────────────
// Blocking bodies
// ────────────────────────────────────────────────────────────────────────────

fn run_hybrid(
    request: &SelectionRequest,
    config: &HybridConfig,
    scorer: &dyn ValueScorer,
) -> Result<SelectionArtifact, AppError> {
    let budget = request.budget();
    let result = select_hybrid(
        &request.stories,
        &request.rankings,
        request.skill_targets.as_ref(),
        budget,
        config,
        scorer,
    )?;
    Ok(SelectionArtifact::from_hybrid(result, budget))
}

fn run_knapsack(request: &SelectionRequest, state: &AppState) -> Result<SelectionArtifact, AppError> {
    validate_stories(&request.stories)?;
    let ranked = align_rankings(&request.stories, &request.rankings)?;

    let hybrid = &state.config.selection.hybrid;
    if let Some(story) = request
        .stories
        .iter()
        .find(|s| s.bullets.len() > hybrid.max_combination_bullets)
    {
        return Err(AppError::Validation(format!(
            "story {} has {} bullets; at most {} allowed for knapsack selection",
            story.id,
            story.bullets.len(),
            hybrid.max_combination_bullets
        )));
    }

    let values: Vec<Vec<StoryValue>> = request
        .stories
        .iter()
        .zip(&ranked)
        .map(|(story, rank)| {
            build_story_values(
                state.scorer.as_ref(),
                rank,
                story,
                hybrid.combination_policy,
                request.skill_targets.as_ref(),
            )
        })
        .collect();

    let budget = request.budget();
    let outcome = solve_knapsack(
        &request.stories,
        &values,
        budget.max_bullets,
        budget.max_lines,
        hybrid.max_grid_cells,
    )?;
    Ok(SelectionArtifact::from_knapsack(outcome, budget))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
