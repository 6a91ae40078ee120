use cardroom_ai::{create_seeded_ai, AIPlayer};
use cardroom_engine::action::{apply, GameKind, GameState};
use cardroom_engine::cards::COLOR_CLASH_DECK_SIZE;
use cardroom_engine::flip21::RoundStatus;

const ACTION_CAP: usize = 5_000;

fn players(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("p{i}")).collect()
}

/// Lets every seat act in order until nobody has anything to do.
fn play_out(ai: &dyn AIPlayer, mut game: GameState) -> (GameState, usize) {
    let seats = game.players().to_vec();
    for taken in 0..ACTION_CAP {
        if game.is_finished() {
            return (game, taken);
        }
        let Some((player, action)) = seats
            .iter()
            .find_map(|p| ai.choose_action(&game, p).map(|a| (p.clone(), a)))
        else {
            return (game, taken);
        };
        game = apply(&game, &player, &action).expect("policies only pick legal actions");
        if let GameState::ColorClash(clash) = &game {
            assert_eq!(clash.total_cards(), COLOR_CLASH_DECK_SIZE);
        }
    }
    (game, ACTION_CAP)
}

#[test]
fn baseline_finishes_color_clash() {
    let ai = create_seeded_ai("baseline", 0).unwrap();
    for seed in 0..6 {
        let game = GameState::new_game(GameKind::ColorClash, players(3), seed).unwrap();
        let (end, taken) = play_out(ai.as_ref(), game);
        assert!(end.is_finished(), "seed {seed} still running after {taken} actions");
        let GameState::ColorClash(clash) = end else {
            unreachable!()
        };
        let winner = clash.winner.clone().expect("a finished game has a winner");
        assert!(clash.hand(&winner).unwrap().is_empty());
    }
}

#[test]
fn baseline_settles_a_flip21_round() {
    let ai = create_seeded_ai("baseline", 0).unwrap();
    for seed in 0..10 {
        let game = GameState::new_game(GameKind::Flip21, players(4), seed).unwrap();
        let (end, _) = play_out(ai.as_ref(), game);
        let GameState::Flip21(table) = end else {
            unreachable!()
        };
        assert_eq!(table.round_status, RoundStatus::Finished);
        assert_eq!(table.results.len(), 4);
    }
}

#[test]
fn random_policy_never_breaks_conservation() {
    for seed in 0..4 {
        let ai = create_seeded_ai("random", seed).unwrap();
        let game = GameState::new_game(GameKind::ColorClash, players(4), seed).unwrap();
        let (end, _) = play_out(ai.as_ref(), game);
        if let GameState::ColorClash(clash) = end {
            assert_eq!(clash.total_cards(), COLOR_CLASH_DECK_SIZE);
        }
    }
}
