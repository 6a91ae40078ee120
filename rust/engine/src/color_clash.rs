//! Color Clash rule engine.
//!
//! Every operation takes the current [`ClashState`] by reference and returns a
//! new state; the input is never modified, so a rejected action leaves no
//! trace.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::cards::{all_colors, CardId, ClashCard, ClashRank, Color, COLOR_CLASH_DECK_SIZE};
use crate::deck::Shuffler;
use crate::errors::GameError;
use crate::player::PlayerId;
use crate::turn::{self, Direction};

/// Cards dealt to each player when a game starts.
pub const DEFAULT_HAND_SIZE: usize = 7;
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 10;
/// Cards drawn by a player caught holding one undeclared card.
pub const CATCH_PENALTY: u32 = 2;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

/// Where the current player is within their turn.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum TurnStage {
    /// May play from hand or draw
    Open,
    /// Has drawn; may play one of `playable` or pass
    Drawn { playable: Vec<CardId> },
}

/// Complete Color Clash game state.
///
/// Both piles keep their top card at the end of the vector.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClashState {
    pub draw_pile: Vec<ClashCard>,
    pub discard_pile: Vec<ClashCard>,
    pub hands: BTreeMap<PlayerId, Vec<ClashCard>>,
    pub player_order: Vec<PlayerId>,
    pub current_player: PlayerId,
    pub direction: Direction,
    pub active_color: Option<Color>,
    pub burned_color: Option<Color>,
    pub pending_draw: u32,
    pub skip_next: bool,
    pub declared_last_card: BTreeSet<PlayerId>,
    pub stage: TurnStage,
    pub status: GameStatus,
    pub winner: Option<PlayerId>,
    pub hand_size: usize,
    pub seed: u64,
    /// Number of shuffles performed so far; feeds the next shuffle's RNG.
    pub shuffles: u64,
}

/// Builds the fixed 108-card deck in a deterministic order.
///
/// Per color: one zero, two each of 1-9, two each of skip, reverse and
/// draw-two. Then four wilds and four wild-draw-fours.
pub fn create_standard_deck() -> Vec<ClashCard> {
    let mut deck = Vec::with_capacity(COLOR_CLASH_DECK_SIZE);
    for color in all_colors() {
        deck.push(ClashCard::colored(deck.len() as CardId, color, ClashRank::Number(0)));
        for n in 1..=9 {
            for _ in 0..2 {
                deck.push(ClashCard::colored(deck.len() as CardId, color, ClashRank::Number(n)));
            }
        }
        for rank in [ClashRank::Skip, ClashRank::Reverse, ClashRank::DrawTwo] {
            for _ in 0..2 {
                deck.push(ClashCard::colored(deck.len() as CardId, color, rank));
            }
        }
    }
    for rank in [ClashRank::Wild, ClashRank::WildDrawFour] {
        for _ in 0..4 {
            deck.push(ClashCard::wild(deck.len() as CardId, rank));
        }
    }
    deck
}

/// Whether `card` may be placed on `top`.
///
/// Wilds are always legal. A number card of the burned color is never legal.
/// Otherwise the card must match the active color, the top card's number, or
/// the top card's action type.
pub fn can_play(card: &ClashCard, top: &ClashCard, active: Color, burned: Option<Color>) -> bool {
    if card.is_wild() {
        return true;
    }
    if card.color.is_some() && card.color == burned && card.rank.is_number() {
        return false;
    }
    if card.color == Some(active) {
        return true;
    }
    match (card.rank, top.rank) {
        (ClashRank::Number(a), ClashRank::Number(b)) => a == b,
        (ClashRank::Skip, ClashRank::Skip)
        | (ClashRank::Reverse, ClashRank::Reverse)
        | (ClashRank::DrawTwo, ClashRank::DrawTwo) => true,
        _ => false,
    }
}

impl ClashState {
    /// A waiting game with a shuffled, undealt deck.
    pub fn new(players: Vec<PlayerId>, seed: u64) -> Result<Self, GameError> {
        validate_roster(&players)?;
        let mut draw_pile = create_standard_deck();
        Shuffler::for_stream(seed, 0).shuffle(&mut draw_pile);
        let hands = players.iter().map(|p| (p.clone(), Vec::new())).collect();
        Ok(Self {
            draw_pile,
            discard_pile: Vec::new(),
            hands,
            current_player: players[0].clone(),
            player_order: players,
            direction: Direction::Clockwise,
            active_color: None,
            burned_color: None,
            pending_draw: 0,
            skip_next: false,
            declared_last_card: BTreeSet::new(),
            stage: TurnStage::Open,
            status: GameStatus::Waiting,
            winner: None,
            hand_size: DEFAULT_HAND_SIZE,
            seed,
            shuffles: 1,
        })
    }

    pub fn with_hand_size(mut self, hand_size: usize) -> Self {
        self.hand_size = hand_size;
        self
    }

    /// Deals the hands and turns over the opening card: `waiting → playing`.
    pub fn start(&self) -> Result<Self, GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::RoomNotPlayable("game already started".into()));
        }
        if self.hand_size == 0 || self.hand_size * self.player_order.len() >= self.draw_pile.len() {
            return Err(GameError::RoomNotPlayable(format!(
                "cannot deal {} cards to {} players",
                self.hand_size,
                self.player_order.len()
            )));
        }
        let mut next = self.clone();
        for _ in 0..next.hand_size {
            for player in &next.player_order {
                let card = next.draw_pile.pop().ok_or(GameError::DeckExhausted)?;
                next.hands.entry(player.clone()).or_default().push(card);
            }
        }

        // Open on a number card; anything else goes to the bottom.
        let mut inspected = 0;
        let opening = loop {
            let card = next.draw_pile.pop().ok_or(GameError::DeckExhausted)?;
            if card.rank.is_number() {
                break card;
            }
            next.draw_pile.insert(0, card);
            inspected += 1;
            if inspected > next.draw_pile.len() {
                return Err(GameError::DeckExhausted);
            }
        };
        next.active_color = opening.color;
        next.discard_pile.push(opening);
        next.current_player = next.player_order[0].clone();
        next.status = GameStatus::Playing;
        Ok(next)
    }

    pub fn top_card(&self) -> Option<&ClashCard> {
        self.discard_pile.last()
    }

    pub fn hand(&self, player: &str) -> Option<&[ClashCard]> {
        self.hands.get(player).map(Vec::as_slice)
    }

    /// Cards across both piles and every hand. Always 108.
    pub fn total_cards(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.hands.values().map(Vec::len).sum::<usize>()
    }

    /// The player to act, only while the game is being played.
    pub fn active_player(&self) -> Option<&PlayerId> {
        (self.status == GameStatus::Playing).then_some(&self.current_player)
    }

    /// Cards `player` could legally play right now.
    pub fn playable_cards(&self, player: &str) -> Vec<CardId> {
        if self.require_turn(player).is_err() {
            return Vec::new();
        }
        let (Some(top), Some(active)) = (self.top_card(), self.active_color) else {
            return Vec::new();
        };
        let Some(hand) = self.hands.get(player) else {
            return Vec::new();
        };
        hand.iter()
            .filter(|card| match &self.stage {
                TurnStage::Open => true,
                TurnStage::Drawn { playable } => playable.contains(&card.id),
            })
            .filter(|card| self.pending_draw == 0 || card.rank.draw_penalty() > 0)
            .filter(|card| can_play(card, top, active, self.burned_color))
            .map(|card| card.id)
            .collect()
    }

    /// Drops `player` from the game. Their cards go to the bottom of the draw
    /// pile; if fewer than two players remain the game ends.
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
        let successor = turn::next_player_id(&next.player_order, player, next.direction).cloned();
        next.player_order.remove(index);
        if let Some(hand) = next.hands.remove(player) {
            let returned: Vec<_> = hand.into_iter().map(ClashCard::returned_to_pile).collect();
            next.draw_pile.splice(0..0, returned);
        }
        next.declared_last_card.remove(player);

        if next.current_player == player {
            next.current_player = successor.unwrap_or_else(|| next.player_order[0].clone());
            next.stage = TurnStage::Open;
        }
        if next.status == GameStatus::Playing && next.player_order.len() < MIN_PLAYERS {
            next.status = GameStatus::Finished;
            next.winner = next.player_order.first().cloned();
            next.pending_draw = 0;
            next.skip_next = false;
        }
        Ok(next)
    }

    fn require_playing(&self, player: &str) -> Result<(), GameError> {
        if !self.hands.contains_key(player) {
            return Err(GameError::PlayerNotInGame(player.to_string()));
        }
        if self.status != GameStatus::Playing {
            return Err(GameError::RoomNotPlayable(format!(
                "game is {:?}",
                self.status
            )));
        }
        Ok(())
    }

    fn require_turn(&self, player: &str) -> Result<(), GameError> {
        self.require_playing(player)?;
        if self.current_player != player {
            return Err(GameError::OutOfTurn {
                expected: self.current_player.clone(),
                actual: player.to_string(),
            });
        }
        Ok(())
    }

    /// Hands the turn to the next player.
    ///
    /// A pending draw is served by the next player on their own turn, so it
    /// takes precedence over a skip flag: with both set the turn moves one
    /// seat and the skip is dropped.
    fn end_turn(&mut self) {
        let skip = self.skip_next && self.pending_draw == 0;
        self.skip_next = false;
        if let Some(next) = turn::advance(&self.player_order, &self.current_player, self.direction, skip) {
            self.current_player = next.clone();
        }
        self.stage = TurnStage::Open;
    }

    /// Moves up to `count` cards into `player`'s hand, reshuffling the discard
    /// pile when the draw pile runs dry. Returns the ids drawn.
    fn draw_into(&mut self, player: &str, count: u32) -> Result<Vec<CardId>, GameError> {
        let mut drawn = Vec::new();
        for _ in 0..count {
            if self.draw_pile.is_empty() {
                self.reshuffle_discards();
            }
            match self.draw_pile.pop() {
                Some(card) => drawn.push(card),
                None => break,
            }
        }
        if drawn.is_empty() && count > 0 {
            return Err(GameError::DeckExhausted);
        }
        let ids = drawn.iter().map(|c| c.id).collect();
        self.hands
            .get_mut(player)
            .ok_or_else(|| GameError::PlayerNotInGame(player.to_string()))?
            .extend(drawn);
        Ok(ids)
    }

    fn reshuffle_discards(&mut self) {
        let Some(top) = self.discard_pile.pop() else {
            return;
        };
        let mut cards: Vec<_> = self
            .discard_pile
            .drain(..)
            .map(ClashCard::returned_to_pile)
            .collect();
        Shuffler::for_stream(self.seed, self.shuffles).shuffle(&mut cards);
        self.shuffles += 1;
        self.draw_pile = cards;
        self.discard_pile.push(top);
    }

    fn prune_declarations(&mut self) {
        let hands = &self.hands;
        self.declared_last_card
            .retain(|p| hands.get(p).is_some_and(|h| h.len() <= 2));
    }
}

fn validate_roster(players: &[PlayerId]) -> Result<(), GameError> {
    if players.len() < MIN_PLAYERS || players.len() > MAX_PLAYERS {
        return Err(GameError::RoomNotPlayable(format!(
            "color clash needs {MIN_PLAYERS}-{MAX_PLAYERS} players, got {}",
            players.len()
        )));
    }
    let unique: BTreeSet<_> = players.iter().collect();
    if unique.len() != players.len() {
        return Err(GameError::IllegalMove("duplicate player in roster".into()));
    }
    Ok(())
}

/// Plays `card_id` from `player`'s hand.
///
/// `chosen_color` is required for wild cards and must be absent otherwise.
pub fn apply_play(
    state: &ClashState,
    player: &str,
    card_id: CardId,
    chosen_color: Option<Color>,
) -> Result<ClashState, GameError> {
    state.require_turn(player)?;
    let hand = state
        .hands
        .get(player)
        .ok_or_else(|| GameError::PlayerNotInGame(player.to_string()))?;
    let position = hand
        .iter()
        .position(|c| c.id == card_id)
        .ok_or_else(|| GameError::IllegalMove(format!("card {card_id} is not in {player}'s hand")))?;
    let card = hand[position];

    if let TurnStage::Drawn { playable } = &state.stage {
        if !playable.contains(&card_id) {
            return Err(GameError::IllegalMove(
                "after drawing only a drawn card may be played".into(),
            ));
        }
    }
    if state.pending_draw > 0 && card.rank.draw_penalty() == 0 {
        return Err(GameError::IllegalMove(format!(
            "{} cards are pending: stack a draw card or draw",
            state.pending_draw
        )));
    }
    let top = state
        .top_card()
        .ok_or_else(|| GameError::RoomNotPlayable("discard pile is empty".into()))?;
    let active = state
        .active_color
        .ok_or_else(|| GameError::RoomNotPlayable("no active color".into()))?;
    if !can_play(&card, top, active, state.burned_color) {
        return Err(GameError::IllegalMove(format!(
            "{:?} {:?} cannot be played on {:?} {:?}",
            card.color, card.rank, top.effective_color(), top.rank
        )));
    }
    let chosen = match (card.is_wild(), chosen_color) {
        (true, Some(color)) => Some(color),
        (false, None) => None,
        _ => return Err(GameError::InvalidColorChoice),
    };

    let mut next = state.clone();
    let played = next
        .hands
        .get_mut(player)
        .ok_or_else(|| GameError::PlayerNotInGame(player.to_string()))?
        .remove(position)
        .played_as(chosen);
    next.discard_pile.push(played);
    next.active_color = played.effective_color();
    if next.burned_color.is_some() && next.burned_color != next.active_color {
        next.burned_color = None;
    }

    match played.rank {
        ClashRank::Skip => next.skip_next = true,
        ClashRank::Reverse => {
            next.direction = next.direction.reversed();
            if next.player_order.len() == 2 {
                next.skip_next = true;
            }
        }
        rank => next.pending_draw += rank.draw_penalty(),
    }

    let emptied = next.hands.get(player).is_some_and(Vec::is_empty);
    if emptied {
        next.status = GameStatus::Finished;
        next.winner = Some(player.to_string());
        next.pending_draw = 0;
        next.skip_next = false;
        next.stage = TurnStage::Open;
    } else {
        next.end_turn();
    }
    next.prune_declarations();
    Ok(next)
}

/// Moves `count` cards from the draw pile into `player`'s hand.
///
/// Reshuffles all but the top discard when the draw pile is exhausted. Draws
/// as many as are available; fails with [`GameError::DeckExhausted`] only when
/// not a single card could be drawn.
pub fn apply_draw(state: &ClashState, player: &str, count: u32) -> Result<ClashState, GameError> {
    state.require_playing(player)?;
    let mut next = state.clone();
    next.draw_into(player, count)?;
    next.prune_declarations();
    Ok(next)
}

/// The draw a player takes on their own turn.
///
/// Serves a pending penalty if one is due (burning the active color),
/// otherwise draws one card. If none of the drawn cards can be played the
/// turn passes immediately.
pub fn draw_for_turn(state: &ClashState, player: &str) -> Result<ClashState, GameError> {
    state.require_turn(player)?;
    if matches!(state.stage, TurnStage::Drawn { .. }) {
        return Err(GameError::IllegalMove("already drew this turn".into()));
    }
    let penalty = state.pending_draw;
    let mut next = state.clone();
    let drawn = match next.draw_into(player, penalty.max(1)) {
        Ok(ids) => ids,
        // every card is in someone's hand; the turn still has to move on
        Err(GameError::DeckExhausted) => Vec::new(),
        Err(e) => return Err(e),
    };
    if penalty > 0 {
        next.pending_draw = 0;
        next.burned_color = next.active_color;
    }

    next.stage = TurnStage::Drawn { playable: drawn };
    let playable = next.playable_cards(player);
    if playable.is_empty() {
        next.end_turn();
    } else {
        next.stage = TurnStage::Drawn { playable };
    }
    next.prune_declarations();
    Ok(next)
}

/// Ends the turn after drawing without playing.
pub fn pass(state: &ClashState, player: &str) -> Result<ClashState, GameError> {
    state.require_turn(player)?;
    if state.stage == TurnStage::Open {
        return Err(GameError::IllegalMove("draw before passing".into()));
    }
    let mut next = state.clone();
    next.end_turn();
    Ok(next)
}

/// Announces that `player` is down to their last card (or about to be).
pub fn declare_last_card(state: &ClashState, player: &str) -> Result<ClashState, GameError> {
    state.require_playing(player)?;
    let held = state.hands.get(player).map_or(0, Vec::len);
    if held > 2 {
        return Err(GameError::IllegalMove(format!(
            "{player} holds {held} cards"
        )));
    }
    if state.declared_last_card.contains(player) {
        return Err(GameError::IllegalMove(format!("{player} already declared")));
    }
    let mut next = state.clone();
    next.declared_last_card.insert(player.to_string());
    Ok(next)
}

/// `caller` points out that `target` holds one card without having declared
/// it; `target` draws [`CATCH_PENALTY`] cards.
pub fn catch_last_card(
    state: &ClashState,
    caller: &str,
    target: &str,
) -> Result<ClashState, GameError> {
    state.require_playing(caller)?;
    let held = state
        .hands
        .get(target)
        .map(Vec::len)
        .ok_or_else(|| GameError::PlayerNotInGame(target.to_string()))?;
    if caller == target {
        return Err(GameError::IllegalMove("cannot catch yourself".into()));
    }
    if held != 1 || state.declared_last_card.contains(target) {
        return Err(GameError::IllegalMove(format!("{target} cannot be caught")));
    }
    let mut next = state.clone();
    match next.draw_into(target, CATCH_PENALTY) {
        // nothing left to draw; the catch still stands
        Ok(_) | Err(GameError::DeckExhausted) => {}
        Err(e) => return Err(e),
    }
    next.prune_declarations();
    Ok(next)
}

/// Players that `caller` could currently catch.
pub fn catchable_players(state: &ClashState, caller: &str) -> Vec<PlayerId> {
    if state.require_playing(caller).is_err() {
        return Vec::new();
    }
    state
        .player_order
        .iter()
        .filter(|p| p.as_str() != caller)
        .filter(|p| state.hands.get(*p).is_some_and(|h| h.len() == 1))
        .filter(|p| !state.declared_last_card.contains(*p))
        .cloned()
        .collect()
}
