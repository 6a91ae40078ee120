//! Game-agnostic entry points used by the room and sync layers.

use serde::{Deserialize, Serialize};

use crate::cards::{all_colors, CardId, Color};
use crate::color_clash::{self, ClashState, GameStatus, TurnStage};
use crate::errors::GameError;
use crate::flip21::{Flip21State, RoundStatus};
use crate::player::PlayerId;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    ColorClash,
    Flip21,
}

/// The game embedded in a room document.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameState {
    ColorClash(ClashState),
    Flip21(Flip21State),
}

/// Something a player asks to do.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Color Clash: play a card, naming a color for wilds
    Play {
        card_id: CardId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chosen_color: Option<Color>,
    },
    /// Color Clash: draw (serving any pending penalty)
    Draw,
    /// Color Clash: end the turn after drawing
    Pass,
    /// Color Clash: announce the last card
    DeclareLastCard,
    /// Color Clash: call out a player holding one undeclared card
    CatchLastCard { target: PlayerId },
    /// Flip21: take a card
    Hit,
    /// Flip21: keep the hand
    Stand,
    /// Flip21: start the next round
    DealRound,
}

impl GameState {
    /// A freshly started game: Color Clash dealt and playing, Flip21 with its
    /// first round dealt.
    pub fn new_game(kind: GameKind, players: Vec<PlayerId>, seed: u64) -> Result<Self, GameError> {
        match kind {
            GameKind::ColorClash => Ok(GameState::ColorClash(
                ClashState::new(players, seed)?.start()?,
            )),
            GameKind::Flip21 => Ok(GameState::Flip21(
                Flip21State::new(players, seed)?.deal_round()?,
            )),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            GameState::ColorClash(_) => GameKind::ColorClash,
            GameState::Flip21(_) => GameKind::Flip21,
        }
    }

    pub fn players(&self) -> &[PlayerId] {
        match self {
            GameState::ColorClash(s) => &s.player_order,
            GameState::Flip21(s) => &s.player_order,
        }
    }

    /// Whose turn it is, if anyone's.
    pub fn current_player(&self) -> Option<&PlayerId> {
        match self {
            GameState::ColorClash(s) => s.active_player(),
            GameState::Flip21(s) => s.current_player(),
        }
    }

    /// Color Clash has a winner; Flip21 finishes round by round.
    pub fn is_finished(&self) -> bool {
        match self {
            GameState::ColorClash(s) => s.status == GameStatus::Finished,
            GameState::Flip21(s) => s.round_status == RoundStatus::Finished,
        }
    }

    pub fn remove_player(&self, player: &str) -> Result<Self, GameError> {
        match self {
            GameState::ColorClash(s) => s.remove_player(player).map(GameState::ColorClash),
            GameState::Flip21(s) => s.remove_player(player).map(GameState::Flip21),
        }
    }
}

/// Every action `player` could submit against `state` right now.
pub fn legal_actions(state: &GameState, player: &str) -> Vec<Action> {
    match state {
        GameState::ColorClash(s) => clash_actions(s, player),
        GameState::Flip21(s) => flip21_actions(s, player),
    }
}

fn clash_actions(state: &ClashState, player: &str) -> Vec<Action> {
    let mut actions = Vec::new();
    if state.status != GameStatus::Playing || !state.hands.contains_key(player) {
        return actions;
    }
    let hand = state.hand(player).unwrap_or_default();
    for card_id in state.playable_cards(player) {
        let wild = hand.iter().any(|c| c.id == card_id && c.is_wild());
        if wild {
            actions.extend(all_colors().into_iter().map(|color| Action::Play {
                card_id,
                chosen_color: Some(color),
            }));
        } else {
            actions.push(Action::Play {
                card_id,
                chosen_color: None,
            });
        }
    }
    if state.current_player == player {
        match state.stage {
            TurnStage::Open => actions.push(Action::Draw),
            TurnStage::Drawn { .. } => actions.push(Action::Pass),
        }
    }
    if hand.len() <= 2 && !state.declared_last_card.contains(player) {
        actions.push(Action::DeclareLastCard);
    }
    actions.extend(
        color_clash::catchable_players(state, player)
            .into_iter()
            .map(|target| Action::CatchLastCard { target }),
    );
    actions
}

fn flip21_actions(state: &Flip21State, player: &str) -> Vec<Action> {
    if !state.hands.contains_key(player) {
        return Vec::new();
    }
    match state.round_status {
        RoundStatus::PlayerTurns if state.current_player().is_some_and(|p| p == player) => {
            if state.draw_pile.is_empty() {
                vec![Action::Stand]
            } else {
                vec![Action::Hit, Action::Stand]
            }
        }
        RoundStatus::Dealing | RoundStatus::Finished => vec![Action::DealRound],
        _ => Vec::new(),
    }
}

/// Validates `action` for `player` against `state` and returns the next
/// state. Pure: `state` is never modified.
pub fn apply(state: &GameState, player: &str, action: &Action) -> Result<GameState, GameError> {
    match (state, action) {
        (GameState::ColorClash(s), Action::Play { card_id, chosen_color }) => {
            color_clash::apply_play(s, player, *card_id, *chosen_color).map(GameState::ColorClash)
        }
        (GameState::ColorClash(s), Action::Draw) => {
            color_clash::draw_for_turn(s, player).map(GameState::ColorClash)
        }
        (GameState::ColorClash(s), Action::Pass) => {
            color_clash::pass(s, player).map(GameState::ColorClash)
        }
        (GameState::ColorClash(s), Action::DeclareLastCard) => {
            color_clash::declare_last_card(s, player).map(GameState::ColorClash)
        }
        (GameState::ColorClash(s), Action::CatchLastCard { target }) => {
            color_clash::catch_last_card(s, player, target).map(GameState::ColorClash)
        }
        (GameState::Flip21(s), Action::Hit) => s.hit(player).map(GameState::Flip21),
        (GameState::Flip21(s), Action::Stand) => s.stand(player).map(GameState::Flip21),
        (GameState::Flip21(s), Action::DealRound) => {
            if !s.hands.contains_key(player) {
                return Err(GameError::PlayerNotInGame(player.to_string()));
            }
            s.deal_round().map(GameState::Flip21)
        }
        (state, action) => Err(GameError::IllegalMove(format!(
            "{action:?} is not an action in {:?}",
            state.kind()
        ))),
    }
}

/// The action taken on behalf of the current player when their turn
/// deadline passes: draw (or pass after drawing) in Color Clash, stand in
/// Flip21.
pub fn timeout_action(state: &GameState) -> Option<(PlayerId, Action)> {
    match state {
        GameState::ColorClash(s) => {
            let player = s.active_player()?.clone();
            let action = match s.stage {
                TurnStage::Open => Action::Draw,
                TurnStage::Drawn { .. } => Action::Pass,
            };
            Some((player, action))
        }
        GameState::Flip21(s) => s.current_player().map(|p| (p.clone(), Action::Stand)),
    }
}
