//! Uniform choice among the legal actions, from a seeded generator.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::AIPlayer;
use cardroom_engine::action::{legal_actions, Action, GameState};

/// Picks any legal action with equal probability. Useful for shaking out
/// rule paths the baseline policy never takes.
#[derive(Debug)]
pub struct RandomAI {
    rng: Mutex<StdRng>,
}

impl RandomAI {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl AIPlayer for RandomAI {
    fn choose_action(&self, state: &GameState, player_id: &str) -> Option<Action> {
        let legal = legal_actions(state, player_id);
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        legal.choose(&mut *rng).cloned()
    }

    fn name(&self) -> &str {
        "RandomAI"
    }
}
