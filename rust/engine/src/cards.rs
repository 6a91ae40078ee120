use serde::{Deserialize, Serialize};

/// Stable identity of a physical card within one deck.
pub type CardId = u16;

/// Number of cards in a Color Clash deck.
pub const COLOR_CLASH_DECK_SIZE: usize = 108;

/// Number of cards in a Flip21 deck.
pub const FLIP21_DECK_SIZE: usize = 52;

/// One of the four concrete Color Clash colors.
/// Wild cards carry no color until one is chosen at play time.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Blue,
    Yellow,
    Green,
}

pub fn all_colors() -> [Color; 4] {
    [Color::Red, Color::Blue, Color::Yellow, Color::Green]
}

/// Face of a Color Clash card.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ClashRank {
    /// Number card, 0 through 9
    Number(u8),
    /// Next player loses their turn
    Skip,
    /// Turn direction flips
    Reverse,
    /// Next player draws two
    DrawTwo,
    /// Playable on anything, player picks the color
    Wild,
    /// Wild that also makes the next player draw four
    WildDrawFour,
}

impl ClashRank {
    pub fn is_wild(self) -> bool {
        matches!(self, ClashRank::Wild | ClashRank::WildDrawFour)
    }

    pub fn is_number(self) -> bool {
        matches!(self, ClashRank::Number(_))
    }

    /// Cards that add to the pending draw count.
    pub fn draw_penalty(self) -> u32 {
        match self {
            ClashRank::DrawTwo => 2,
            ClashRank::WildDrawFour => 4,
            _ => 0,
        }
    }
}

/// A Color Clash card.
///
/// `chosen_color` is only ever set on a wild card that sits on the discard
/// pile; it is cleared again when the card is reshuffled into the draw pile.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ClashCard {
    pub id: CardId,
    pub color: Option<Color>,
    pub rank: ClashRank,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_color: Option<Color>,
}

impl ClashCard {
    pub fn colored(id: CardId, color: Color, rank: ClashRank) -> Self {
        Self {
            id,
            color: Some(color),
            rank,
            chosen_color: None,
        }
    }

    pub fn wild(id: CardId, rank: ClashRank) -> Self {
        Self {
            id,
            color: None,
            rank,
            chosen_color: None,
        }
    }

    pub fn is_wild(&self) -> bool {
        self.rank.is_wild()
    }

    /// The color this card counts as once played: its printed color, or the
    /// color chosen for a wild.
    pub fn effective_color(&self) -> Option<Color> {
        self.color.or(self.chosen_color)
    }

    pub(crate) fn played_as(mut self, chosen: Option<Color>) -> Self {
        if self.is_wild() {
            self.chosen_color = chosen;
        }
        self
    }

    pub(crate) fn returned_to_pile(mut self) -> Self {
        self.chosen_color = None;
        self
    }
}

/// Represents one of the four suits of a standard 52-card deck.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    /// Spades suit (♠)
    Spades,
    /// Hearts suit (♥)
    Hearts,
    /// Diamonds suit (♦)
    Diamonds,
    /// Clubs suit (♣)
    Clubs,
}

/// Rank of a Flip21 card from Ace through King.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Ace = 1,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    /// Fixed point value: ace counts 1 here, face cards 10.
    /// The soft-ace bonus is applied by hand valuation, not by the rank.
    pub fn points(self) -> u32 {
        match self {
            Rank::Jack | Rank::Queen | Rank::King => 10,
            other => other as u32,
        }
    }
}

pub fn all_suits() -> [Suit; 4] {
    [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs]
}

pub fn all_ranks() -> [Rank; 13] {
    [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ]
}

/// A Flip21 card. Only face-up cards contribute to a hand's value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FlipCard {
    pub id: CardId,
    pub suit: Suit,
    pub rank: Rank,
    pub face_up: bool,
}

impl FlipCard {
    pub fn new(id: CardId, suit: Suit, rank: Rank) -> Self {
        Self {
            id,
            suit,
            rank,
            face_up: false,
        }
    }

    pub fn face_up(mut self) -> Self {
        self.face_up = true;
        self
    }

    pub fn face_down(mut self) -> Self {
        self.face_up = false;
        self
    }
}

/// The 52-card Flip21 deck in suit-major order, all face down.
pub fn flip21_deck() -> Vec<FlipCard> {
    let mut v = Vec::with_capacity(FLIP21_DECK_SIZE);
    for &s in &all_suits() {
        for &r in &all_ranks() {
            v.push(FlipCard::new(v.len() as CardId, s, r));
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_cards_are_worth_ten() {
        assert_eq!(Rank::Ace.points(), 1);
        assert_eq!(Rank::Seven.points(), 7);
        assert_eq!(Rank::Ten.points(), 10);
        assert_eq!(Rank::Jack.points(), 10);
        assert_eq!(Rank::King.points(), 10);
    }

    #[test]
    fn flip21_deck_has_unique_ids() {
        let deck = flip21_deck();
        assert_eq!(deck.len(), FLIP21_DECK_SIZE);
        let ids: std::collections::HashSet<_> = deck.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), FLIP21_DECK_SIZE);
        assert!(deck.iter().all(|c| !c.face_up));
    }

    #[test]
    fn wild_effective_color_follows_choice() {
        let card = ClashCard::wild(0, ClashRank::Wild).played_as(Some(Color::Green));
        assert_eq!(card.effective_color(), Some(Color::Green));
        assert_eq!(card.returned_to_pile().effective_color(), None);

        let red = ClashCard::colored(1, Color::Red, ClashRank::Skip).played_as(Some(Color::Blue));
        assert_eq!(red.chosen_color, None);
    }

    #[test]
    fn clash_card_serializes_rank_as_tagged_value() {
        let card = ClashCard::colored(3, Color::Red, ClashRank::Number(7));
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"kind\":\"number\""));
        assert!(json.contains("\"value\":7"));
        let back: ClashCard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
    }
}
