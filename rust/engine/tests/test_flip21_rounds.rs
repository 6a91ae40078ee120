use cardroom_engine::cards::{FlipCard, Rank as R, Suit as S, FLIP21_DECK_SIZE};
use cardroom_engine::errors::GameError;
use cardroom_engine::flip21::{calculate_value, is_blackjack, is_busted, Flip21State, RoundStatus};
use cardroom_engine::player::{RoundResult, SeatStatus};

fn up(id: u16, rank: R) -> FlipCard {
    FlipCard::new(id, S::Spades, rank).face_up()
}

/// Two players in the middle of a hand, first player to act.
fn mid_round(a: Vec<FlipCard>, b: Vec<FlipCard>, dealer: Vec<FlipCard>, pile: Vec<FlipCard>) -> Flip21State {
    let mut state = Flip21State::new(vec!["a".into(), "b".into()], 3).unwrap();
    state.hands.insert("a".into(), a);
    state.hands.insert("b".into(), b);
    state.dealer_hand = dealer;
    state.draw_pile = pile;
    state.round_status = RoundStatus::PlayerTurns;
    state.round_number = 1;
    state.current_index = Some(0);
    state
}

#[test]
fn greedy_ace_values() {
    let aan = [up(0, R::Ace), up(1, R::Ace), up(2, R::Nine)];
    assert_eq!(calculate_value(&aan), 21);
    let aaa = [up(0, R::Ace), up(1, R::Ace), up(2, R::Ace)];
    assert_eq!(calculate_value(&aaa), 13);
    assert!(!is_busted(&aaa));
    assert!(is_blackjack(&[up(0, R::Ace), up(1, R::King)]));
}

#[test]
fn round_resolution_assigns_win_push_and_loss() {
    let mut state = Flip21State::new(vec!["p20".into(), "p18".into(), "p25".into()], 1).unwrap();
    state.hands.insert("p20".into(), vec![up(0, R::King), up(1, R::Queen)]);
    state.hands.insert("p18".into(), vec![up(2, R::Ten), up(3, R::Eight)]);
    state
        .hands
        .insert("p25".into(), vec![up(4, R::Ten), up(5, R::Ten), up(6, R::Five)]);
    state.seats.insert("p20".into(), SeatStatus::Locked);
    state.seats.insert("p18".into(), SeatStatus::Locked);
    state.seats.insert("p25".into(), SeatStatus::Busted);
    state.dealer_hand = vec![up(7, R::Jack), up(8, R::Eight)];
    state.round_status = RoundStatus::Resolving;
    state.round_number = 1;

    let resolved = state.resolve_round().expect("resolve");
    assert_eq!(resolved.round_status, RoundStatus::Finished);
    assert_eq!(resolved.results["p20"], RoundResult::Win);
    assert_eq!(resolved.results["p18"], RoundResult::Push);
    assert_eq!(resolved.results["p25"], RoundResult::Loss);
    assert_eq!(resolved.results.len(), 3);
    assert_eq!(resolved.wins["p20"], 1);
    assert_eq!(resolved.wins["p18"], 0);
}

#[test]
fn resolve_requires_the_resolving_phase() {
    let state = Flip21State::new(vec!["a".into()], 1).unwrap();
    assert!(matches!(
        state.resolve_round(),
        Err(GameError::RoomNotPlayable(_))
    ));
    assert!(matches!(
        state.play_dealer_turn(),
        Err(GameError::RoomNotPlayable(_))
    ));
}

#[test]
fn dealer_reveals_and_draws_to_seventeen() {
    let mut state = mid_round(
        vec![up(0, R::Ten), up(1, R::Nine)],
        vec![up(2, R::Ten), up(3, R::Eight)],
        vec![up(4, R::Ten), FlipCard::new(5, S::Hearts, R::Six)],
        vec![up(6, R::Two), up(7, R::Five)],
    );
    state.round_status = RoundStatus::DealerTurn;
    state.current_index = None;
    assert_eq!(state.dealer_visible_value(), 10);

    let played = state.play_dealer_turn().unwrap();
    assert_eq!(played.round_status, RoundStatus::Resolving);
    assert!(played.dealer_hand.iter().all(|c| c.face_up));
    // 10 + 6 + 5
    assert_eq!(calculate_value(&played.dealer_hand), 21);
    assert_eq!(played.draw_pile.len(), 1);
}

#[test]
fn dealer_does_not_draw_when_everyone_busted() {
    let mut state = mid_round(
        vec![up(0, R::Ten), up(1, R::Nine), up(2, R::Five)],
        vec![up(3, R::Ten), up(4, R::Eight), up(5, R::King)],
        vec![up(6, R::Two), FlipCard::new(7, S::Hearts, R::Three)],
        vec![up(8, R::Two)],
    );
    state.seats.insert("a".into(), SeatStatus::Busted);
    state.seats.insert("b".into(), SeatStatus::Busted);
    state.round_status = RoundStatus::DealerTurn;
    state.current_index = None;

    let played = state.play_dealer_turn().unwrap();
    assert_eq!(played.dealer_hand.len(), 2);
    let resolved = played.resolve_round().unwrap();
    assert!(resolved.results.values().all(|r| *r == RoundResult::Loss));
}

#[test]
fn hitting_to_twenty_one_locks_and_the_round_settles_after_the_last_stand() {
    let state = mid_round(
        vec![up(0, R::Ten), up(1, R::Six)],
        vec![up(2, R::Nine), up(3, R::Nine)],
        vec![up(4, R::Ten), FlipCard::new(5, S::Hearts, R::Seven)],
        vec![up(6, R::Two), up(7, R::Five)],
    );
    let after_hit = state.hit("a").unwrap();
    assert_eq!(after_hit.seat("a"), Some(SeatStatus::Locked));
    assert_eq!(after_hit.current_player().map(String::as_str), Some("b"));

    let settled = after_hit.stand("b").unwrap();
    assert_eq!(settled.round_status, RoundStatus::Finished);
    assert_eq!(calculate_value(&settled.dealer_hand), 17);
    assert_eq!(settled.results["a"], RoundResult::Win);
    assert_eq!(settled.results["b"], RoundResult::Win);
    assert!(settled.current_player().is_none());
}

#[test]
fn busting_passes_the_turn() {
    let state = mid_round(
        vec![up(0, R::Ten), up(1, R::Six)],
        vec![up(2, R::Nine), up(3, R::Nine)],
        vec![up(4, R::Ten), FlipCard::new(5, S::Hearts, R::Seven)],
        vec![up(6, R::King)],
    );
    let next = state.hit("a").unwrap();
    assert_eq!(next.seat("a"), Some(SeatStatus::Busted));
    assert_eq!(next.current_player().map(String::as_str), Some("b"));
}

#[test]
fn hit_below_twenty_one_keeps_the_turn() {
    let state = mid_round(
        vec![up(0, R::Two), up(1, R::Three)],
        vec![up(2, R::Nine), up(3, R::Nine)],
        vec![up(4, R::Ten), FlipCard::new(5, S::Hearts, R::Seven)],
        vec![up(6, R::Four)],
    );
    let next = state.hit("a").unwrap();
    assert_eq!(next.seat("a"), Some(SeatStatus::Active));
    assert_eq!(next.current_player().map(String::as_str), Some("a"));
    assert_eq!(
        next.hit("b"),
        Err(GameError::OutOfTurn {
            expected: "a".into(),
            actual: "b".into()
        })
    );
    assert_eq!(next.stand("z"), Err(GameError::PlayerNotInGame("z".into())));
}

#[test]
fn deal_round_deals_two_cards_each_and_hides_the_hole_card() {
    let state = Flip21State::new(vec!["a".into(), "b".into(), "c".into()], 77).unwrap();
    let dealt = state.deal_round().unwrap();
    assert_eq!(dealt.round_number, 1);
    assert!(dealt.hands.values().all(|h| h.len() == 2));
    let in_hands: usize = dealt.hands.values().map(Vec::len).sum();
    assert_eq!(
        dealt.draw_pile.len() + dealt.dealer_hand.len() + in_hands,
        FLIP21_DECK_SIZE
    );
    if dealt.round_status == RoundStatus::PlayerTurns {
        assert!(!dealt.dealer_hand[1].face_up);
        assert!(matches!(
            dealt.deal_round(),
            Err(GameError::RoomNotPlayable(_))
        ));
    }
    assert_eq!(dealt, state.deal_round().unwrap());
}

#[test]
fn next_round_starts_after_finish() {
    let state = mid_round(
        vec![up(0, R::Ten), up(1, R::Six)],
        vec![up(2, R::Nine), up(3, R::Nine)],
        vec![up(4, R::Ten), FlipCard::new(5, S::Hearts, R::Seven)],
        vec![],
    );
    let finished = state.stand("a").unwrap().stand("b").unwrap();
    assert_eq!(finished.round_status, RoundStatus::Finished);
    let wins_before = finished.wins.clone();

    let next = finished.deal_round().unwrap();
    assert_eq!(next.round_number, 2);
    for player in ["a", "b"] {
        assert_eq!(next.hands[player].len(), 2, "{player} gets two fresh cards");
    }
    match next.round_status {
        RoundStatus::PlayerTurns => {
            assert!(next.results.is_empty());
            assert!(next.current_player().is_some());
            assert_eq!(next.wins, wins_before);
        }
        // every seat dealt a blackjack settles the round on the spot
        RoundStatus::Finished => {
            assert_eq!(next.results.len(), 2);
            let new_wins = next.results.values().filter(|r| **r == RoundResult::Win).count();
            assert_eq!(
                next.wins.values().sum::<u32>(),
                wins_before.values().sum::<u32>() + new_wins as u32
            );
        }
        other => panic!("unexpected round status after dealing: {other:?}"),
    }
}

#[test]
fn departed_player_is_not_in_game_between_rounds() {
    let state = mid_round(
        vec![up(0, R::Ten), up(1, R::Six)],
        vec![up(2, R::Nine), up(3, R::Nine)],
        vec![up(4, R::Ten), FlipCard::new(5, S::Hearts, R::Seven)],
        vec![],
    );
    let finished = state.stand("a").unwrap().stand("b").unwrap();
    assert_eq!(finished.round_status, RoundStatus::Finished);
    let without_b = finished.remove_player("b").unwrap();

    assert_eq!(without_b.hit("b"), Err(GameError::PlayerNotInGame("b".into())));
    assert_eq!(without_b.stand("b"), Err(GameError::PlayerNotInGame("b".into())));
    // a seated player outside their turn phase still hears the round status
    assert!(matches!(without_b.hit("a"), Err(GameError::RoomNotPlayable(_))));
}

#[test]
fn removing_the_current_player_moves_the_turn() {
    let state = mid_round(
        vec![up(0, R::Two), up(1, R::Three)],
        vec![up(2, R::Nine), up(3, R::Nine)],
        vec![up(4, R::Ten), FlipCard::new(5, S::Hearts, R::Seven)],
        vec![up(6, R::Four)],
    );
    let next = state.remove_player("a").unwrap();
    assert_eq!(next.current_player().map(String::as_str), Some("b"));
    assert!(!next.hands.contains_key("a"));
}
