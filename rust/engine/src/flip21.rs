//! Flip21 rule engine: players against a dealer, closest to 21 without going
//! over.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::cards::{flip21_deck, FlipCard, Rank};
use crate::deck::Shuffler;
use crate::errors::GameError;
use crate::player::{PlayerId, RoundResult, SeatStatus};

pub const TARGET: u32 = 21;
/// Dealer draws while below this value.
pub const DEALER_STANDS_ON: u32 = 17;
pub const MAX_PLAYERS: usize = 7;

/// Round phase. Moves strictly forward:
/// `dealing → player_turns → dealer_turn → resolving → finished`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Dealing,
    PlayerTurns,
    DealerTurn,
    Resolving,
    Finished,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Flip21State {
    pub draw_pile: Vec<FlipCard>,
    pub dealer_hand: Vec<FlipCard>,
    pub hands: BTreeMap<PlayerId, Vec<FlipCard>>,
    pub seats: BTreeMap<PlayerId, SeatStatus>,
    pub player_order: Vec<PlayerId>,
    /// Index into `player_order`; only set during `PlayerTurns`.
    pub current_index: Option<usize>,
    pub round_status: RoundStatus,
    pub round_number: u32,
    pub wins: BTreeMap<PlayerId, u32>,
    pub results: BTreeMap<PlayerId, RoundResult>,
    pub seed: u64,
}

/// Value of the face-up cards in `hand`.
///
/// Aces are resolved greedily left to right: each ace counts 11 if that keeps
/// the running total at or below 21, otherwise 1. Earlier choices are never
/// revisited, so `[5, A, 9]` is 25, not 15.
pub fn calculate_value(hand: &[FlipCard]) -> u32 {
    hand.iter()
        .filter(|c| c.face_up)
        .fold(0, |total, card| match card.rank {
            Rank::Ace if total + 11 <= TARGET => total + 11,
            rank => total + rank.points(),
        })
}

pub fn is_busted(hand: &[FlipCard]) -> bool {
    calculate_value(hand) > TARGET
}

pub fn is_blackjack(hand: &[FlipCard]) -> bool {
    hand.iter().filter(|c| c.face_up).count() == 2 && calculate_value(hand) == TARGET
}

/// Result for one player hand against the dealer.
pub fn compare_hands(player_value: u32, dealer_value: u32) -> RoundResult {
    if player_value > TARGET {
        RoundResult::Loss
    } else if dealer_value > TARGET || player_value > dealer_value {
        RoundResult::Win
    } else if dealer_value > player_value {
        RoundResult::Loss
    } else {
        RoundResult::Push
    }
}

impl Flip21State {
    /// A table waiting for its first deal.
    pub fn new(players: Vec<PlayerId>, seed: u64) -> Result<Self, GameError> {
        if players.is_empty() || players.len() > MAX_PLAYERS {
            return Err(GameError::RoomNotPlayable(format!(
                "flip21 seats 1-{MAX_PLAYERS} players, got {}",
                players.len()
            )));
        }
        let unique: BTreeSet<_> = players.iter().collect();
        if unique.len() != players.len() {
            return Err(GameError::IllegalMove("duplicate player in roster".into()));
        }
        Ok(Self {
            draw_pile: Vec::new(),
            dealer_hand: Vec::new(),
            hands: players.iter().map(|p| (p.clone(), Vec::new())).collect(),
            seats: players
                .iter()
                .map(|p| (p.clone(), SeatStatus::Active))
                .collect(),
            wins: players.iter().map(|p| (p.clone(), 0)).collect(),
            player_order: players,
            current_index: None,
            round_status: RoundStatus::Dealing,
            round_number: 0,
            results: BTreeMap::new(),
            seed,
        })
    }

    pub fn current_player(&self) -> Option<&PlayerId> {
        match self.round_status {
            RoundStatus::PlayerTurns => self.current_index.and_then(|i| self.player_order.get(i)),
            _ => None,
        }
    }

    pub fn hand(&self, player: &str) -> Option<&[FlipCard]> {
        self.hands.get(player).map(Vec::as_slice)
    }

    pub fn seat(&self, player: &str) -> Option<SeatStatus> {
        self.seats.get(player).copied()
    }

    /// Value of the dealer's cards that are currently face up.
    pub fn dealer_visible_value(&self) -> u32 {
        calculate_value(&self.dealer_hand)
    }

    /// Starts a round with a freshly shuffled deck. Legal while dealing or
    /// after the previous round finished.
    pub fn deal_round(&self) -> Result<Self, GameError> {
        if !matches!(
            self.round_status,
            RoundStatus::Dealing | RoundStatus::Finished
        ) {
            return Err(GameError::RoomNotPlayable(format!(
                "round is {:?}",
                self.round_status
            )));
        }
        let mut next = self.clone();
        next.round_number += 1;
        next.results.clear();
        next.dealer_hand.clear();
        next.draw_pile = flip21_deck();
        Shuffler::for_stream(next.seed, u64::from(next.round_number)).shuffle(&mut next.draw_pile);
        for player in &next.player_order {
            next.hands.insert(player.clone(), Vec::new());
            next.seats.insert(player.clone(), SeatStatus::Active);
        }

        for pass in 0..2 {
            for player in &next.player_order {
                let card = next.draw_pile.pop().ok_or(GameError::DeckExhausted)?;
                next.hands.entry(player.clone()).or_default().push(card.face_up());
            }
            let card = next.draw_pile.pop().ok_or(GameError::DeckExhausted)?;
            // dealer's second card is the hole card
            let card = if pass == 0 { card.face_up() } else { card.face_down() };
            next.dealer_hand.push(card);
        }

        for player in &next.player_order {
            if next.hands.get(player).is_some_and(|h| is_blackjack(h)) {
                next.seats.insert(player.clone(), SeatStatus::Locked);
            }
        }

        next.round_status = RoundStatus::PlayerTurns;
        next.current_index = None;
        next.select_active_from(0);
        next.settle_if_ready()
    }

    /// Takes one more card.
    pub fn hit(&self, player: &str) -> Result<Self, GameError> {
        self.require_turn(player)?;
        let mut next = self.clone();
        let card = next.draw_pile.pop().ok_or(GameError::DeckExhausted)?;
        let hand = next
            .hands
            .get_mut(player)
            .ok_or_else(|| GameError::PlayerNotInGame(player.to_string()))?;
        hand.push(card.face_up());
        let value = calculate_value(hand);
        let status = if value > TARGET {
            SeatStatus::Busted
        } else if value == TARGET {
            SeatStatus::Locked
        } else {
            SeatStatus::Active
        };
        next.seats.insert(player.to_string(), status);
        if status != SeatStatus::Active {
            next = next.advance_to_next_player();
        }
        next.settle_if_ready()
    }

    /// Keeps the current hand and passes the turn on.
    pub fn stand(&self, player: &str) -> Result<Self, GameError> {
        self.require_turn(player)?;
        let mut next = self.clone();
        next.seats.insert(player.to_string(), SeatStatus::Locked);
        next.advance_to_next_player().settle_if_ready()
    }

    /// Moves the turn to the next active player after the current one. When
    /// nobody is active any more the round moves on to the dealer.
    pub fn advance_to_next_player(&self) -> Self {
        let mut next = self.clone();
        let start = self.current_index.map_or(0, |i| i + 1);
        next.select_active_from(start);
        next
    }

    /// Dealer reveals the hole card and draws to 17. No cards are drawn when
    /// every player has busted.
    pub fn play_dealer_turn(&self) -> Result<Self, GameError> {
        if self.round_status != RoundStatus::DealerTurn {
            return Err(GameError::RoomNotPlayable(format!(
                "round is {:?}",
                self.round_status
            )));
        }
        let mut next = self.clone();
        for card in &mut next.dealer_hand {
            card.face_up = true;
        }
        let anyone_standing = next
            .seats
            .values()
            .any(|s| *s != SeatStatus::Busted);
        if anyone_standing {
            while calculate_value(&next.dealer_hand) < DEALER_STANDS_ON {
                let card = next.draw_pile.pop().ok_or(GameError::DeckExhausted)?;
                next.dealer_hand.push(card.face_up());
            }
        }
        next.round_status = RoundStatus::Resolving;
        Ok(next)
    }

    /// Compares every hand with the dealer, records results and win counts.
    pub fn resolve_round(&self) -> Result<Self, GameError> {
        if self.round_status != RoundStatus::Resolving {
            return Err(GameError::RoomNotPlayable(format!(
                "round is {:?}",
                self.round_status
            )));
        }
        let mut next = self.clone();
        let dealer_value = calculate_value(&next.dealer_hand);
        for player in &next.player_order {
            let busted = next.seats.get(player) == Some(&SeatStatus::Busted);
            let value = next.hands.get(player).map_or(0, |h| calculate_value(h));
            let result = if busted {
                RoundResult::Loss
            } else {
                compare_hands(value, dealer_value)
            };
            if result == RoundResult::Win {
                *next.wins.entry(player.clone()).or_insert(0) += 1;
            }
            next.results.insert(player.clone(), result);
        }
        next.round_status = RoundStatus::Finished;
        Ok(next)
    }

    /// Drops `player` from the table, moving the turn on if it was theirs.
    pub fn remove_player(&self, player: &str) -> Result<Self, GameError> {
        let index = self
            .player_order
            .iter()
            .position(|p| p == player)
            .ok_or_else(|| GameError::PlayerNotInGame(player.to_string()))?;
        if self.player_order.len() == 1 {
            return Err(GameError::IllegalMove("cannot remove the last player".into()));
        }
        let mut next = self.clone();
        next.player_order.remove(index);
        next.hands.remove(player);
        next.seats.remove(player);
        next.wins.remove(player);
        next.results.remove(player);

        if next.round_status == RoundStatus::PlayerTurns {
            match next.current_index {
                Some(current) if current == index => {
                    next.current_index = None;
                    next.select_active_from(index);
                }
                Some(current) if current > index => next.current_index = Some(current - 1),
                _ => {}
            }
            return next.settle_if_ready();
        }
        Ok(next)
    }

    fn require_turn(&self, player: &str) -> Result<usize, GameError> {
        if !self.hands.contains_key(player) {
            return Err(GameError::PlayerNotInGame(player.to_string()));
        }
        if self.round_status != RoundStatus::PlayerTurns {
            return Err(GameError::RoomNotPlayable(format!(
                "round is {:?}",
                self.round_status
            )));
        }
        let index = self
            .current_index
            .ok_or_else(|| GameError::RoomNotPlayable("no player to act".into()))?;
        let current = &self.player_order[index];
        if current != player {
            return Err(GameError::OutOfTurn {
                expected: current.clone(),
                actual: player.to_string(),
            });
        }
        Ok(index)
    }

    /// Points `current_index` at the first active seat at or after `start`
    /// (wrapping). With no active seat left the dealer takes over.
    fn select_active_from(&mut self, start: usize) {
        let n = self.player_order.len();
        let found = (0..n)
            .map(|offset| (start + offset) % n)
            .find(|&i| self.seats.get(&self.player_order[i]) == Some(&SeatStatus::Active));
        match found {
            Some(i) => self.current_index = Some(i),
            None => {
                self.current_index = None;
                self.round_status = RoundStatus::DealerTurn;
            }
        }
    }

    fn settle_if_ready(self) -> Result<Self, GameError> {
        if self.round_status == RoundStatus::DealerTurn {
            self.play_dealer_turn()?.resolve_round()
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Suit;

    fn up(rank: Rank) -> FlipCard {
        FlipCard::new(0, Suit::Spades, rank).face_up()
    }

    #[test]
    fn aces_resolve_greedily() {
        assert_eq!(calculate_value(&[up(Rank::Ace), up(Rank::Ace), up(Rank::Nine)]), 21);
        assert_eq!(calculate_value(&[up(Rank::Ace), up(Rank::Ace), up(Rank::Ace)]), 13);
        assert_eq!(calculate_value(&[up(Rank::Five), up(Rank::Ace), up(Rank::Nine)]), 25);
        assert_eq!(calculate_value(&[up(Rank::King), up(Rank::Ace)]), 21);
    }

    #[test]
    fn face_down_cards_do_not_count() {
        let hand = [up(Rank::Ten), FlipCard::new(1, Suit::Hearts, Rank::King)];
        assert_eq!(calculate_value(&hand), 10);
        assert!(!is_blackjack(&hand));
    }

    #[test]
    fn blackjack_needs_exactly_two_cards() {
        assert!(is_blackjack(&[up(Rank::Ace), up(Rank::Queen)]));
        assert!(!is_blackjack(&[up(Rank::Seven), up(Rank::Seven), up(Rank::Seven)]));
        assert!(is_busted(&[up(Rank::King), up(Rank::Queen), up(Rank::Two)]));
    }

    #[test]
    fn compare_hands_covers_all_outcomes() {
        assert_eq!(compare_hands(20, 18), RoundResult::Win);
        assert_eq!(compare_hands(18, 18), RoundResult::Push);
        assert_eq!(compare_hands(17, 18), RoundResult::Loss);
        assert_eq!(compare_hands(25, 18), RoundResult::Loss);
        assert_eq!(compare_hands(12, 24), RoundResult::Win);
        assert_eq!(compare_hands(22, 24), RoundResult::Loss);
    }

    #[test]
    fn advance_skips_players_who_are_done() {
        let mut state =
            Flip21State::new(vec!["a".into(), "b".into(), "c".into()], 1).unwrap();
        state.round_status = RoundStatus::PlayerTurns;
        state.current_index = Some(0);
        state.seats.insert("b".into(), SeatStatus::Busted);
        let next = state.advance_to_next_player();
        assert_eq!(next.current_player().map(String::as_str), Some("c"));

        let mut last = next.clone();
        last.seats.insert("a".into(), SeatStatus::Locked);
        let after = last.advance_to_next_player();
        assert_eq!(after.current_player().map(String::as_str), Some("c"));

        last.seats.insert("c".into(), SeatStatus::Locked);
        let dealer = last.advance_to_next_player();
        assert_eq!(dealer.round_status, RoundStatus::DealerTurn);
        assert_eq!(dealer.current_index, None);
    }
}
