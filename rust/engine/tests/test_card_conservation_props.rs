//! Property tests over random legal play.
//!
//! Whatever sequence of legal actions is taken, no Color Clash card is ever
//! created or lost and every card id stays unique.

use std::collections::HashSet;

use cardroom_engine::action::{apply, legal_actions, GameKind, GameState};
use cardroom_engine::cards::COLOR_CLASH_DECK_SIZE;
use cardroom_engine::color_clash::ClashState;
use cardroom_engine::flip21::{self, RoundStatus};
use cardroom_engine::player::SeatStatus;
use proptest::prelude::*;

fn clash(state: &GameState) -> &ClashState {
    match state {
        GameState::ColorClash(s) => s,
        GameState::Flip21(_) => unreachable!("color clash game expected"),
    }
}

fn unique_ids(state: &ClashState) -> bool {
    let mut seen = HashSet::new();
    state
        .draw_pile
        .iter()
        .chain(&state.discard_pile)
        .chain(state.hands.values().flatten())
        .all(|c| seen.insert(c.id))
}

/// Picks the acting player and one of their legal actions from `choice`.
fn step(state: &GameState, choice: usize) -> Option<GameState> {
    let players = state.players().to_vec();
    let actor = if choice % 7 == 0 {
        players[choice / 7 % players.len()].clone()
    } else {
        state.current_player()?.clone()
    };
    let actions = legal_actions(state, &actor);
    if actions.is_empty() {
        return None;
    }
    let action = &actions[choice % actions.len()];
    Some(apply(state, &actor, action).expect("legal action must apply"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_clash_card_count_is_conserved(
        seed in any::<u64>(),
        players in 2usize..=6,
        choices in proptest::collection::vec(any::<usize>(), 1..300),
    ) {
        let roster = (0..players).map(|i| format!("p{i}")).collect();
        let mut state = GameState::new_game(GameKind::ColorClash, roster, seed).unwrap();
        prop_assert_eq!(clash(&state).total_cards(), COLOR_CLASH_DECK_SIZE);

        for choice in choices {
            if state.is_finished() {
                break;
            }
            let Some(next) = step(&state, choice) else { continue };
            state = next;
            let s = clash(&state);
            prop_assert_eq!(s.total_cards(), COLOR_CLASH_DECK_SIZE);
            prop_assert!(unique_ids(s));
            prop_assert!(s.discard_pile.last().is_some());
        }
    }

    #[test]
    fn prop_same_seed_same_game(
        seed in any::<u64>(),
        choices in proptest::collection::vec(any::<usize>(), 1..60),
    ) {
        let roster: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let mut left = GameState::new_game(GameKind::ColorClash, roster.clone(), seed).unwrap();
        let mut right = GameState::new_game(GameKind::ColorClash, roster, seed).unwrap();
        for choice in choices {
            match (step(&left, choice), step(&right, choice)) {
                (Some(l), Some(r)) => {
                    left = l;
                    right = r;
                }
                (None, None) => {}
                _ => prop_assert!(false, "replicas diverged"),
            }
            prop_assert_eq!(&left, &right);
        }
    }

    #[test]
    fn prop_flip21_rounds_always_settle(
        seed in any::<u64>(),
        players in 1usize..=7,
        choices in proptest::collection::vec(any::<usize>(), 1..200),
    ) {
        let roster = (0..players).map(|i| format!("p{i}")).collect();
        let mut state = GameState::new_game(GameKind::Flip21, roster, seed).unwrap();
        for choice in choices {
            let GameState::Flip21(s) = &state else { unreachable!() };
            if s.round_status == RoundStatus::Finished {
                prop_assert_eq!(s.results.len(), s.player_order.len());
                prop_assert!(s.dealer_hand.iter().all(|c| c.face_up));
                if s.seats.values().any(|seat| *seat != SeatStatus::Busted) {
                    prop_assert!(flip21::calculate_value(&s.dealer_hand) >= flip21::DEALER_STANDS_ON);
                }
            }
            if let Some(next) = step(&state, choice) {
                state = next;
            } else if state.is_finished() {
                // between rounds nobody holds the turn; anyone may deal
                let actor = state.players()[0].clone();
                let actions = legal_actions(&state, &actor);
                prop_assert!(!actions.is_empty());
                state = apply(&state, &actor, &actions[0]).unwrap();
            }
        }
    }
}
