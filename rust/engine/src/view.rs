use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{GameKind, GameState};
use crate::cards::{ClashCard, Color, FlipCard};
use crate::color_clash::{ClashState, GameStatus};
use crate::flip21::{self, Flip21State, RoundStatus};
use crate::player::{PlayerId, RoundResult, SeatStatus};
use crate::turn::Direction;

/// Read-only summary of a game for rendering. Carries hand sizes, never the
/// cards in other players' hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub game: GameKind,
    pub player_order: Vec<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<PlayerId>,
    pub hand_counts: BTreeMap<PlayerId, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_clash: Option<ClashStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip21: Option<Flip21Status>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClashStatus {
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_card: Option<ClashCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burned_color: Option<Color>,
    pub direction: Direction,
    pub pending_draw: u32,
    pub draw_pile_count: usize,
    pub declared_last_card: Vec<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flip21Status {
    pub round_status: RoundStatus,
    pub round_number: u32,
    /// Face-up dealer cards only
    pub dealer_cards: Vec<FlipCard>,
    pub dealer_value: u32,
    pub hand_values: BTreeMap<PlayerId, u32>,
    pub seats: BTreeMap<PlayerId, SeatStatus>,
    pub results: BTreeMap<PlayerId, RoundResult>,
    pub wins: BTreeMap<PlayerId, u32>,
}

pub fn status_view(state: &GameState) -> StatusView {
    match state {
        GameState::ColorClash(s) => clash_view(s),
        GameState::Flip21(s) => flip21_view(s),
    }
}

fn clash_view(s: &ClashState) -> StatusView {
    StatusView {
        game: GameKind::ColorClash,
        player_order: s.player_order.clone(),
        current_player: s.active_player().cloned(),
        hand_counts: s.hands.iter().map(|(p, h)| (p.clone(), h.len())).collect(),
        color_clash: Some(ClashStatus {
            status: s.status,
            top_card: s.top_card().copied(),
            active_color: s.active_color,
            burned_color: s.burned_color,
            direction: s.direction,
            pending_draw: s.pending_draw,
            draw_pile_count: s.draw_pile.len(),
            declared_last_card: s.declared_last_card.iter().cloned().collect(),
            winner: s.winner.clone(),
        }),
        flip21: None,
    }
}

fn flip21_view(s: &Flip21State) -> StatusView {
    StatusView {
        game: GameKind::Flip21,
        player_order: s.player_order.clone(),
        current_player: s.current_player().cloned(),
        hand_counts: s.hands.iter().map(|(p, h)| (p.clone(), h.len())).collect(),
        color_clash: None,
        flip21: Some(Flip21Status {
            round_status: s.round_status,
            round_number: s.round_number,
            dealer_cards: s.dealer_hand.iter().filter(|c| c.face_up).copied().collect(),
            dealer_value: s.dealer_visible_value(),
            hand_values: s
                .hands
                .iter()
                .map(|(p, h)| (p.clone(), flip21::calculate_value(h)))
                .collect(),
            seats: s.seats.clone(),
            results: s.results.clone(),
            wins: s.wins.clone(),
        }),
    }
}
