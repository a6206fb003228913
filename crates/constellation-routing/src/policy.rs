//! Tabular Q-learning: epsilon-greedy selection and the one-step update.
//!
//! ```text
//! Q(s,a) ← Q(s,a) + α·( r + γ·max_a' Q(s',a') − Q(s,a) )
//! ```

use crate::config::LearningParams;
use crate::mdp::State;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Per-satellite table of (state, next hop) → value. Unseen pairs read as 0.
#[derive(Debug, Clone, Default)]
pub struct QTable {
    values: HashMap<(State, usize), f64>,
}

impl QTable {
    pub fn get(&self, state: State, action: usize) -> f64 {
        self.values.get(&(state, action)).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, state: State, action: usize, value: f64) {
        self.values.insert((state, action), value);
    }

    /// Best value over `actions`; an empty action set yields 0.
    pub fn max_value(&self, state: State, actions: &[usize]) -> f64 {
        actions
            .iter()
            .map(|&a| self.get(state, a))
            .fold(None, |best: Option<f64>, q| Some(best.map_or(q, |b| b.max(q))))
            .unwrap_or(0.0)
    }

    /// Apply one update and return the new value.
    pub fn update(
        &mut self,
        state: State,
        action: usize,
        reward: f64,
        max_next: f64,
        params: &LearningParams,
    ) -> f64 {
        let current = self.get(state, action);
        let updated = current + params.alpha * (reward + params.gamma * max_next - current);
        self.set(state, action, updated);
        updated
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Epsilon-greedy choice among `actions`.
///
/// Exploitation breaks ties uniformly at random. Returns `None` only when
/// `actions` is empty.
pub fn choose_action<R: Rng>(
    table: &QTable,
    state: State,
    actions: &[usize],
    epsilon: f64,
    rng: &mut R,
) -> Option<usize> {
    if actions.is_empty() {
        return None;
    }

    if rng.gen::<f64>() < epsilon {
        return actions.choose(rng).copied();
    }

    let best = table.max_value(state, actions);
    let best_actions: Vec<usize> = actions
        .iter()
        .copied()
        .filter(|&a| table.get(state, a) == best)
        .collect();
    best_actions.choose(rng).copied()
}
