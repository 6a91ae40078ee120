//! Deterministic rule-of-thumb play.
//!
//! Color Clash: catch a careless opponent, declare the last card, then play
//! the card that keeps the most options open, saving wilds for when nothing
//! else fits. Flip21: the usual basic strategy cut down to hard totals.

use crate::AIPlayer;
use cardroom_engine::action::{legal_actions, Action, GameState};
use cardroom_engine::cards::{all_colors, ClashCard, ClashRank, Color};
use cardroom_engine::color_clash::ClashState;
use cardroom_engine::flip21::{self, Flip21State};

/// Always hit below this total.
const HIT_BELOW: u32 = 12;
/// Always stand from this total.
const STAND_FROM: u32 = 17;
/// Between the two, hit only against a dealer showing at least this much.
const STRONG_DEALER_CARD: u32 = 7;

/// Baseline policy for both games.
///
/// Picks the same action for the same state every time, which keeps
/// simulations reproducible for a given seed.
///
/// ```rust
/// use cardroom_ai::baseline::BaselineAI;
/// use cardroom_ai::AIPlayer;
/// use cardroom_engine::action::{Action, GameKind, GameState};
///
/// let ai = BaselineAI::new();
/// let game = GameState::new_game(GameKind::ColorClash, vec!["a".into(), "b".into()], 9).unwrap();
/// let action = ai.choose_action(&game, "a").unwrap();
/// assert!(matches!(action, Action::Play { .. } | Action::Draw));
/// assert_eq!(ai.choose_action(&game, "b"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaselineAI;

impl BaselineAI {
    pub fn new() -> Self {
        Self
    }

    fn choose_clash(state: &ClashState, player: &str, legal: Vec<Action>) -> Option<Action> {
        if let Some(catch) = legal
            .iter()
            .find(|a| matches!(a, Action::CatchLastCard { .. }))
        {
            return Some(catch.clone());
        }
        if legal.contains(&Action::DeclareLastCard) {
            return Some(Action::DeclareLastCard);
        }

        let hand = state.hand(player).unwrap_or_default();
        let favourite = favourite_color(hand, state.burned_color);
        let best_play = legal
            .iter()
            .filter_map(|action| match action {
                Action::Play {
                    card_id,
                    chosen_color,
                } => {
                    let card = hand.iter().find(|c| c.id == *card_id)?;
                    if card.is_wild() && *chosen_color != Some(favourite) {
                        return None;
                    }
                    Some((play_score(card, hand), action))
                }
                _ => None,
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, action)| action.clone());
        if best_play.is_some() {
            return best_play;
        }

        [Action::Draw, Action::Pass]
            .into_iter()
            .find(|fallback| legal.contains(fallback))
    }

    fn choose_flip21(state: &Flip21State, player: &str, legal: Vec<Action>) -> Option<Action> {
        if legal.contains(&Action::DealRound) {
            return Some(Action::DealRound);
        }
        let value = flip21::calculate_value(state.hand(player).unwrap_or_default());
        let wants_card = match value {
            v if v < HIT_BELOW => true,
            v if v >= STAND_FROM => false,
            _ => state.dealer_visible_value() >= STRONG_DEALER_CARD,
        };
        if wants_card && legal.contains(&Action::Hit) {
            Some(Action::Hit)
        } else if legal.contains(&Action::Stand) {
            Some(Action::Stand)
        } else {
            None
        }
    }
}

/// The color held most often among non-wild cards, skipping the burned
/// color. Ties go to the earlier color in [`all_colors`].
fn favourite_color(hand: &[ClashCard], burned: Option<Color>) -> Color {
    let mut best = (Color::Red, 0usize);
    let mut seen_any = false;
    for color in all_colors() {
        if Some(color) == burned {
            continue;
        }
        let held = hand.iter().filter(|c| c.color == Some(color)).count();
        if !seen_any || held > best.1 {
            best = (color, held);
            seen_any = true;
        }
    }
    best.0
}

/// Higher is better. Wilds rank last; among colored cards, those whose color
/// is well represented in the hand come first, then action cards, then high
/// numbers.
fn play_score(card: &ClashCard, hand: &[ClashCard]) -> (bool, usize, u8) {
    let same_color = hand
        .iter()
        .filter(|c| c.id != card.id && c.color.is_some() && c.color == card.color)
        .count();
    let weight = match card.rank {
        ClashRank::Number(n) => n,
        ClashRank::Skip | ClashRank::Reverse => 10,
        ClashRank::DrawTwo => 11,
        ClashRank::Wild | ClashRank::WildDrawFour => 0,
    };
    (!card.is_wild(), same_color, weight)
}

impl AIPlayer for BaselineAI {
    fn choose_action(&self, state: &GameState, player_id: &str) -> Option<Action> {
        let legal = legal_actions(state, player_id);
        if legal.is_empty() {
            return None;
        }
        match state {
            GameState::ColorClash(s) => Self::choose_clash(s, player_id, legal),
            GameState::Flip21(s) => Self::choose_flip21(s, player_id, legal),
        }
    }

    fn name(&self) -> &str {
        "BaselineAI"
    }
}
