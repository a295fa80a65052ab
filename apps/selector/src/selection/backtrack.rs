//! DP state arena and backtracking.
//!
//! Each DP cell points at a node in an append-only arena. A node records only the
//! step taken at that point plus the index of its parent, so reaching a cell never
//! copies the full path. Index 0 is always the root (no step, score 0).

pub type StateId = usize;

/// The root node's index in every arena.
pub const ROOT: StateId = 0;

/// One node of the DP solution graph. Many nodes may share a parent.
#[derive(Debug, Clone)]
pub struct DpState<T> {
    pub score: f64,
    pub parent: Option<StateId>,
    pub step: Option<T>,
}

#[derive(Debug, Clone)]
pub struct StateArena<T> {
    nodes: Vec<DpState<T>>,
}

impl<T> StateArena<T> {
    /// Creates an arena holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![DpState {
                score: 0.0,
                parent: None,
                step: None,
            }],
        }
    }

    /// Appends a node that extends `parent` by `step`, adding `gain` to its score.
    pub fn push(&mut self, parent: StateId, step: T, gain: f64) -> StateId {
        let score = self.score(parent) + gain;
        self.nodes.push(DpState {
            score,
            parent: Some(parent),
            step: Some(step),
        });
        self.nodes.len() - 1
    }

    /// Score of a node; unknown ids score as the root.
    pub fn score(&self, id: StateId) -> f64 {
        self.nodes.get(id).map(|n| n.score).unwrap_or(0.0)
    }

    pub fn get(&self, id: StateId) -> Option<&DpState<T>> {
        self.nodes.get(id)
    }

    /// Always at least 1 (the root).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Walks parent links from `terminal` to the root and returns the steps
/// oldest-first. The root contributes nothing.
pub fn backtrack<T: Clone>(arena: &StateArena<T>, terminal: StateId) -> Vec<T> {
    let mut steps = Vec::new();
    let mut current = Some(terminal);
    while let Some(id) = current {
        let Some(node) = arena.get(id) else {
            break;
        };
        if let Some(step) = &node.step {
            steps.push(step.clone());
        }
        current = node.parent;
    }
    steps.reverse();
    steps
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::models::StorySelection;
    use uuid::Uuid;

    fn make_selection() -> StorySelection {
        StorySelection {
            story_id: Uuid::new_v4(),
            bullet_ids: vec![Uuid::new_v4()],
        }
    }

    #[test]
    fn test_root_yields_empty() {
        let arena: StateArena<StorySelection> = StateArena::new();
        assert!(backtrack(&arena, ROOT).is_empty());
        assert_eq!(arena.score(ROOT), 0.0);
    }

    #[test]
    fn test_single_node_chain() {
        let mut arena = StateArena::new();
        let sel = make_selection();
        let id = arena.push(ROOT, sel.clone(), 1.5);
        assert_eq!(backtrack(&arena, id), vec![sel]);
        assert!((arena.score(id) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_chain_of_k_is_oldest_first() {
        let mut arena = StateArena::new();
        let selections: Vec<StorySelection> = (0..4).map(|_| make_selection()).collect();
        let mut tip = ROOT;
        for sel in &selections {
            tip = arena.push(tip, sel.clone(), 1.0);
        }
        assert_eq!(backtrack(&arena, tip), selections);
        assert!((arena.score(tip) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_shared_parent_branches_are_independent() {
        let mut arena = StateArena::new();
        let shared = arena.push(ROOT, 1u32, 1.0);
        let left = arena.push(shared, 2u32, 1.0);
        let right = arena.push(shared, 3u32, 2.0);

        assert_eq!(backtrack(&arena, left), vec![1, 2]);
        assert_eq!(backtrack(&arena, right), vec![1, 3]);
        assert_eq!(arena.node_count(), 4);
    }

    #[test]
    fn test_unknown_id_yields_empty() {
        let arena: StateArena<u32> = StateArena::new();
        assert!(backtrack(&arena, 42).is_empty());
    }
}
