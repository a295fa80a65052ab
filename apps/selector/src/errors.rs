use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Malformed selection input. "Nothing fits the budget" is not an error; solvers
/// return an empty selection with score 0 for that.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("story list is empty")]
    EmptyStories,

    #[error("budgets must be positive (max_bullets={max_bullets}, max_lines={max_lines})")]
    InvalidBudget { max_bullets: u32, max_lines: u32 },

    #[error("expected story values for {expected} stories, got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },

    #[error("story {story_id} has a combination referencing bullet index {index} (story has {len})")]
    CombinationOutOfBounds {
        story_id: Uuid,
        index: usize,
        len: usize,
    },

    #[error("story {story_id} has an empty combination")]
    EmptyCombination { story_id: Uuid },

    #[error("story {story_id} has a combination with invalid score {score}")]
    InvalidScore { story_id: Uuid, score: f64 },

    #[error("duplicate story id {0}")]
    DuplicateStory(Uuid),

    #[error("no ranking supplied for story {0}")]
    MissingRanking(Uuid),

    #[error("story {story_id} has relevance {relevance} outside [0, 1]")]
    InvalidRelevance { story_id: Uuid, relevance: f64 },

    #[error("skill_match_ratio {0} outside [0, 1]")]
    InvalidRatio(f64),

    #[error("duplicate bullet id {0}")]
    DuplicateBullet(Uuid),

    #[error("story {story_id} has a combination whose indices are not strictly ascending")]
    UnorderedCombination { story_id: Uuid },

    #[error("request needs {cells} DP cells; at most {limit} allowed (lower max_lines or bullet lengths)")]
    GridTooLarge { cells: u64, limit: u64 },
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SelectionError> for AppError {
    fn from(e: SelectionError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
