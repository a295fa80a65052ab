// Bullet Selection Engine
// Implements: combination generation, value scoring, multiple-choice knapsack with
// backtracking, greedy skill pass, and the hybrid orchestrator.
// Pure computation; handlers run it inside tokio::task::spawn_blocking.

pub mod artifact;
pub mod backtrack;
pub mod combinations;
pub mod greedy;
pub mod handlers;
pub mod hybrid;
pub mod knapsack;
pub mod lines;
pub mod models;
pub mod value;
