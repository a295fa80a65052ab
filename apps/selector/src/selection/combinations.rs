//! Combination Generator — enumerates candidate bullet subsets for one story.
//!
//! Enumeration is exponential in bullets per story. Capping story length is the
//! caller's job (the hybrid orchestrator truncates to `max_combination_bullets`).

use serde::{Deserialize, Serialize};

use crate::selection::models::{Bullet, Story};

/// A non-empty subset of one story's bullets, stored as ascending bullet indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    indices: Vec<usize>,
}

impl Combination {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn single(index: usize) -> Self {
        Self {
            indices: vec![index],
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The story's bullets in this combination, in story order. Out-of-range
    /// indices are skipped; the solver rejects them before they get here.
    pub fn bullets<'a>(&'a self, story: &'a Story) -> impl Iterator<Item = &'a Bullet> + 'a {
        self.indices.iter().filter_map(|&i| story.bullets.get(i))
    }
}

/// Which subsets of a story count as candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationPolicy {
    /// Every non-empty subset.
    #[default]
    PowerSet,
    /// Only non-empty contiguous runs of bullets.
    Contiguous,
}

/// Enumerates candidate combinations for a story's bullets.
///
/// `PowerSet` order matches ascending subset bitmasks:
/// `[0], [1], [0,1], [2], [0,2], [1,2], [0,1,2], ...`
/// `Contiguous` order is by start index, then by length.
pub fn generate_combinations(bullets: &[Bullet], policy: CombinationPolicy) -> Vec<Combination> {
    match policy {
        CombinationPolicy::PowerSet => power_set(bullets.len()),
        CombinationPolicy::Contiguous => contiguous_runs(bullets.len()),
    }
}

fn power_set(n: usize) -> Vec<Combination> {
    let mut subsets: Vec<Vec<usize>> = Vec::new();
    for i in 0..n {
        let existing = subsets.len();
        subsets.push(vec![i]);
        for j in 0..existing {
            let mut extended = subsets[j].clone();
            extended.push(i);
            subsets.push(extended);
        }
    }
    subsets.into_iter().map(Combination::new).collect()
}

fn contiguous_runs(n: usize) -> Vec<Combination> {
    (0..n)
        .flat_map(|start| (start + 1..=n).map(move |end| Combination::new((start..end).collect())))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_bullets(n: usize) -> Vec<Bullet> {
        (0..n)
            .map(|_| Bullet {
                id: Uuid::new_v4(),
                char_length: 80,
                skills: vec![],
            })
            .collect()
    }

    #[test]
    fn test_power_set_size() {
        for n in 0..6 {
            let combos = generate_combinations(&make_bullets(n), CombinationPolicy::PowerSet);
            assert_eq!(combos.len(), (1usize << n) - 1, "n={n}");
        }
    }

    #[test]
    fn test_power_set_order_matches_bitmask() {
        let combos = generate_combinations(&make_bullets(3), CombinationPolicy::PowerSet);
        let indices: Vec<&[usize]> = combos.iter().map(|c| c.indices()).collect();
        assert_eq!(
            indices,
            vec![
                &[0][..],
                &[1][..],
                &[0, 1][..],
                &[2][..],
                &[0, 2][..],
                &[1, 2][..],
                &[0, 1, 2][..],
            ]
        );
    }

    #[test]
    fn test_every_combination_preserves_story_order() {
        let combos = generate_combinations(&make_bullets(5), CombinationPolicy::PowerSet);
        for combo in &combos {
            assert!(!combo.indices().is_empty());
            assert!(combo.indices().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_includes_singletons_and_full_set() {
        let combos = generate_combinations(&make_bullets(4), CombinationPolicy::PowerSet);
        for i in 0..4 {
            assert!(combos.contains(&Combination::single(i)));
        }
        assert!(combos.contains(&Combination::new(vec![0, 1, 2, 3])));
    }

    #[test]
    fn test_contiguous_runs() {
        let combos = generate_combinations(&make_bullets(3), CombinationPolicy::Contiguous);
        let indices: Vec<&[usize]> = combos.iter().map(|c| c.indices()).collect();
        assert_eq!(
            indices,
            vec![&[0][..], &[0, 1][..], &[0, 1, 2][..], &[1][..], &[1, 2][..], &[2][..]]
        );
    }

    #[test]
    fn test_empty_story_has_no_combinations() {
        assert!(generate_combinations(&[], CombinationPolicy::PowerSet).is_empty());
        assert!(generate_combinations(&[], CombinationPolicy::Contiguous).is_empty());
    }

    #[test]
    fn test_bullets_iterates_in_story_order() {
        let story = Story {
            id: Uuid::new_v4(),
            bullets: make_bullets(3),
        };
        let combo = Combination::new(vec![0, 2]);
        let ids: Vec<Uuid> = combo.bullets(&story).map(|b| b.id).collect();
        assert_eq!(ids, vec![story.bullets[0].id, story.bullets[2].id]);
    }
}
