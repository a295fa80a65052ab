//! Selection data model — stories, bullets, upstream rankings, skill targets, and the
//! selections handed back to the pipeline.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::SelectionError;

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

/// A single resume line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: Uuid,
    /// Rendered character length of the bullet text.
    pub char_length: u32,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Bullet {
    /// Case-insensitive skill tag check.
    pub fn has_skill(&self, skill: &str) -> bool {
        let skill_lower = skill.to_lowercase();
        self.skills.iter().any(|s| s.to_lowercase() == skill_lower)
    }
}

/// A job or project entry owning an ordered group of bullets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub bullets: Vec<Bullet>,
}

/// Upstream relevance of a story to the job posting (0.0 – 1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStory {
    pub story_id: Uuid,
    pub relevance: f64,
}

/// A skill the job posting calls for, weighted by priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillTarget {
    pub skill: String,
    pub weight: f64,
}

/// Weighted set of skills derived from parsed job requirements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillTargets {
    pub targets: Vec<SkillTarget>,
}

impl SkillTargets {
    pub fn new(targets: Vec<SkillTarget>) -> Self {
        Self { targets }
    }

    /// Sum of all non-negative target weights.
    pub fn total_weight(&self) -> f64 {
        self.targets.iter().map(|t| t.weight.max(0.0)).sum()
    }

    /// True when there is nothing to score coverage against.
    pub fn is_empty(&self) -> bool {
        self.total_weight() <= 0.0
    }

    /// Σ weight of targets this single bullet covers. Drives greedy ranking.
    pub fn bullet_contribution(&self, bullet: &Bullet) -> f64 {
        self.targets
            .iter()
            .filter(|t| bullet.has_skill(&t.skill))
            .map(|t| t.weight.max(0.0))
            .sum()
    }

    /// Σ weight of targets covered by at least one of the given bullets.
    pub fn covered_weight<'a>(&self, bullets: impl IntoIterator<Item = &'a Bullet>) -> f64 {
        let bullets: Vec<&Bullet> = bullets.into_iter().collect();
        self.targets
            .iter()
            .filter(|t| bullets.iter().any(|b| b.has_skill(&t.skill)))
            .map(|t| t.weight.max(0.0))
            .sum()
    }

    /// Lowercased target skills covered by at least one of the given bullets.
    pub fn covered_by<'a>(&self, bullets: impl IntoIterator<Item = &'a Bullet>) -> HashSet<String> {
        let bullets: Vec<&Bullet> = bullets.into_iter().collect();
        self.targets
            .iter()
            .filter(|t| bullets.iter().any(|b| b.has_skill(&t.skill)))
            .map(|t| t.skill.to_lowercase())
            .collect()
    }

    /// Returns the targets minus the given (lowercased) covered skills.
    pub fn without(&self, covered: &HashSet<String>) -> SkillTargets {
        SkillTargets {
            targets: self
                .targets
                .iter()
                .filter(|t| !covered.contains(&t.skill.to_lowercase()))
                .cloned()
                .collect(),
        }
    }
}

/// Hard resource ceilings for one selection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionBudget {
    pub max_bullets: u32,
    pub max_lines: u32,
}

impl SelectionBudget {
    pub fn new(max_bullets: u32, max_lines: u32) -> Self {
        Self {
            max_bullets,
            max_lines,
        }
    }

    /// Rejects zero budgets, which indicate caller misconfiguration.
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.max_bullets == 0 || self.max_lines == 0 {
            return Err(SelectionError::InvalidBudget {
                max_bullets: self.max_bullets,
                max_lines: self.max_lines,
            });
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outputs
// ────────────────────────────────────────────────────────────────────────────

/// The bullets chosen for one story, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySelection {
    pub story_id: Uuid,
    pub bullet_ids: Vec<Uuid>,
}

/// Result of a knapsack or greedy pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub selections: Vec<StorySelection>,
    pub total_score: f64,
    pub lines_used: u32,
    pub bullets_used: u32,
}

impl SelectionOutcome {
    /// Nothing fits: no selections, zero score.
    pub fn empty() -> Self {
        Self {
            selections: Vec::new(),
            total_score: 0.0,
            lines_used: 0,
            bullets_used: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Input validation
// ────────────────────────────────────────────────────────────────────────────

/// Rejects an empty story list, duplicate story IDs, and bullet IDs that repeat
/// within or across stories.
pub fn validate_stories(stories: &[Story]) -> Result<(), SelectionError> {
    if stories.is_empty() {
        return Err(SelectionError::EmptyStories);
    }
    let mut seen = HashSet::with_capacity(stories.len());
    let mut bullets = HashSet::new();
    for story in stories {
        if !seen.insert(story.id) {
            return Err(SelectionError::DuplicateStory(story.id));
        }
        if let Some(bullet) = story.bullets.iter().find(|b| !bullets.insert(b.id)) {
            return Err(SelectionError::DuplicateBullet(bullet.id));
        }
    }
    Ok(())
}

/// Lines up `rankings` (keyed by story ID) with `stories` so that `result[i]` ranks
/// `stories[i]`. Every story needs a ranking with relevance in [0, 1].
pub fn align_rankings(
    stories: &[Story],
    rankings: &[RankedStory],
) -> Result<Vec<RankedStory>, SelectionError> {
    let by_id: HashMap<Uuid, &RankedStory> = rankings.iter().map(|r| (r.story_id, r)).collect();

    stories
        .iter()
        .map(|story| {
            let ranked = by_id
                .get(&story.id)
                .ok_or(SelectionError::MissingRanking(story.id))?;
            if !ranked.relevance.is_finite() || !(0.0..=1.0).contains(&ranked.relevance) {
                return Err(SelectionError::InvalidRelevance {
                    story_id: story.id,
                    relevance: ranked.relevance,
                });
            }
            Ok((*ranked).clone())
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bullet(skills: &[&str]) -> Bullet {
        Bullet {
            id: Uuid::new_v4(),
            char_length: 80,
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn make_targets(targets: &[(&str, f64)]) -> SkillTargets {
        SkillTargets::new(
            targets
                .iter()
                .map(|(skill, weight)| SkillTarget {
                    skill: skill.to_string(),
                    weight: *weight,
                })
                .collect(),
        )
    }

    #[test]
    fn test_has_skill_is_case_insensitive() {
        let bullet = make_bullet(&["Rust", "Kafka"]);
        assert!(bullet.has_skill("rust"));
        assert!(bullet.has_skill("KAFKA"));
        assert!(!bullet.has_skill("go"));
    }

    #[test]
    fn test_bullet_contribution_sums_matched_weights() {
        let targets = make_targets(&[("rust", 3.0), ("kafka", 2.0), ("go", 1.0)]);
        let bullet = make_bullet(&["Rust", "Kafka"]);
        assert!((targets.bullet_contribution(&bullet) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_covered_weight_counts_each_target_once() {
        let targets = make_targets(&[("rust", 3.0), ("kafka", 2.0)]);
        let a = make_bullet(&["rust"]);
        let b = make_bullet(&["rust", "kafka"]);
        assert!((targets.covered_weight([&a, &b]) - 5.0).abs() < 1e-9);
        assert!((targets.covered_weight([&a]) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_without_drops_covered_skills() {
        let targets = make_targets(&[("Rust", 3.0), ("kafka", 2.0)]);
        let covered = targets.covered_by([&make_bullet(&["rust"])]);
        let remaining = targets.without(&covered);
        assert_eq!(remaining.targets.len(), 1);
        assert_eq!(remaining.targets[0].skill, "kafka");
    }

    #[test]
    fn test_zero_weight_targets_are_empty() {
        assert!(make_targets(&[("rust", 0.0)]).is_empty());
        assert!(SkillTargets::default().is_empty());
        assert!(!make_targets(&[("rust", 0.1)]).is_empty());
    }

    #[test]
    fn test_budget_rejects_zero() {
        assert!(SelectionBudget::new(0, 10).validate().is_err());
        assert!(SelectionBudget::new(10, 0).validate().is_err());
        assert!(SelectionBudget::new(1, 1).validate().is_ok());
    }

    #[test]
    fn test_validate_stories_rejects_empty_and_duplicates() {
        assert!(matches!(validate_stories(&[]), Err(SelectionError::EmptyStories)));

        let story = Story {
            id: Uuid::new_v4(),
            bullets: vec![],
        };
        let result = validate_stories(&[story.clone(), story]);
        assert!(matches!(result, Err(SelectionError::DuplicateStory(_))));
    }

    #[test]
    fn test_validate_stories_rejects_repeated_bullet_ids() {
        let bullet = make_bullet(&[]);
        let within = Story {
            id: Uuid::new_v4(),
            bullets: vec![bullet.clone(), bullet.clone()],
        };
        assert_eq!(
            validate_stories(&[within]),
            Err(SelectionError::DuplicateBullet(bullet.id))
        );

        let first = Story {
            id: Uuid::new_v4(),
            bullets: vec![bullet.clone()],
        };
        let second = Story {
            id: Uuid::new_v4(),
            bullets: vec![make_bullet(&[]), bullet.clone()],
        };
        assert_eq!(
            validate_stories(&[first, second]),
            Err(SelectionError::DuplicateBullet(bullet.id))
        );
    }

    #[test]
    fn test_align_rankings_follows_story_order() {
        let a = Story {
            id: Uuid::new_v4(),
            bullets: vec![],
        };
        let b = Story {
            id: Uuid::new_v4(),
            bullets: vec![],
        };
        let rankings = vec![
            RankedStory {
                story_id: b.id,
                relevance: 0.2,
            },
            RankedStory {
                story_id: a.id,
                relevance: 0.9,
            },
        ];
        let aligned = align_rankings(&[a.clone(), b.clone()], &rankings).unwrap();
        assert_eq!(aligned[0].story_id, a.id);
        assert_eq!(aligned[1].story_id, b.id);
    }

    #[test]
    fn test_align_rankings_rejects_missing_and_out_of_range() {
        let story = Story {
            id: Uuid::new_v4(),
            bullets: vec![],
        };
        assert!(matches!(
            align_rankings(&[story.clone()], &[]),
            Err(SelectionError::MissingRanking(_))
        ));

        let rankings = vec![RankedStory {
            story_id: story.id,
            relevance: 1.5,
        }];
        assert!(matches!(
            align_rankings(&[story], &rankings),
            Err(SelectionError::InvalidRelevance { .. })
        ));
    }
}
