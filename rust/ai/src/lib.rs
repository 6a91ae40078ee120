//! # cardroom-ai: Automated Players
//!
//! Policies that pick an action for a seat from the engine's legal actions.
//! The simulator drives every seat with one of these, and the sync tests use
//! them to generate realistic traffic.
//!
//! ## Core Components
//!
//! - [`AIPlayer`] - the decision interface
//! - [`baseline`] - deterministic rule-of-thumb play for both games
//! - [`random`] - seeded uniform choice among legal actions
//! - [`create_ai`] - factory by name
//!
//! ```rust
//! use cardroom_ai::create_ai;
//! use cardroom_engine::action::{apply, legal_actions, GameKind, GameState};
//!
//! let ai = create_ai("baseline").unwrap();
//! let game = GameState::new_game(GameKind::ColorClash, vec!["a".into(), "b".into()], 42).unwrap();
//! let action = ai.choose_action(&game, "a").unwrap();
//! assert!(legal_actions(&game, "a").contains(&action));
//! let next = apply(&game, "a", &action).unwrap();
//! assert_ne!(next, game);
//! ```

use cardroom_engine::action::{Action, GameState};

pub mod baseline;
pub mod random;

/// Something that can take a seat.
///
/// Implementations only ever return actions found in
/// [`legal_actions`](cardroom_engine::action::legal_actions) for the given
/// state and player, and return `None` when that list is empty.
///
/// ```rust
/// use cardroom_ai::AIPlayer;
/// use cardroom_engine::action::{legal_actions, Action, GameState};
///
/// struct FirstLegal;
///
/// impl AIPlayer for FirstLegal {
///     fn choose_action(&self, state: &GameState, player_id: &str) -> Option<Action> {
///         legal_actions(state, player_id).into_iter().next()
///     }
///
///     fn name(&self) -> &str {
///         "FirstLegal"
///     }
/// }
/// ```
pub trait AIPlayer: Send + Sync {
    /// The action this policy takes for `player_id`, if it has any.
    fn choose_action(&self, state: &GameState, player_id: &str) -> Option<Action>;

    fn name(&self) -> &str;
}

/// Names accepted by [`create_ai`].
pub const AI_KINDS: [&str; 2] = ["baseline", "random"];

/// Builds a policy by name. `random` is seeded with `seed` so simulations
/// stay reproducible.
///
/// ```rust
/// use cardroom_ai::create_ai;
///
/// assert_eq!(create_ai("baseline").unwrap().name(), "BaselineAI");
/// assert!(create_ai("oracle").is_none());
/// ```
pub fn create_ai(kind: &str) -> Option<Box<dyn AIPlayer>> {
    create_seeded_ai(kind, 0)
}

pub fn create_seeded_ai(kind: &str, seed: u64) -> Option<Box<dyn AIPlayer>> {
    match kind {
        "baseline" => Some(Box::new(baseline::BaselineAI::new())),
        "random" => Some(Box::new(random::RandomAI::new(seed))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_kind_can_be_built() {
        for kind in AI_KINDS {
            assert!(create_seeded_ai(kind, 3).is_some(), "{kind}");
        }
    }

    #[test]
    fn unknown_kind_is_none() {
        assert!(create_ai("").is_none());
        assert!(create_ai("Baseline").is_none());
    }
}
