//! # cardroom-engine: Card Game Rule Engines
//!
//! Pure rule engines for two turn-based card games played in a shared room:
//! Color Clash (match color, number or action; first to empty their hand
//! wins) and Flip21 (players against a dealer, closest to 21).
//!
//! Every operation takes a state by reference and returns a new state or a
//! [`errors::GameError`]. Nothing is retained between calls, so the same
//! snapshot always produces the same result on every client.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card value types for both games
//! - [`deck`] - Deterministic ChaCha20 shuffling
//! - [`color_clash`] - Color Clash deck, legality and turn effects
//! - [`flip21`] - Hand valuation, dealer policy and round resolution
//! - [`turn`] - Cyclic turn order and direction
//! - [`action`] - Game-agnostic [`action::GameState`] / [`action::Action`] API
//! - [`view`] - Status projections for presentation
//! - [`logger`] - JSONL log of committed actions
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use cardroom_engine::action::{apply, legal_actions, Action, GameKind, GameState};
//!
//! let players = vec!["ana".to_string(), "ben".to_string()];
//! let state = GameState::new_game(GameKind::ColorClash, players, 42).unwrap();
//!
//! // Whoever holds the turn can always draw
//! let actions = legal_actions(&state, "ana");
//! assert!(actions.contains(&Action::Draw));
//!
//! let next = apply(&state, "ana", &Action::Draw).unwrap();
//! assert_ne!(next, state);
//! ```
//!
//! ## Hand Valuation
//!
//! ```rust
//! use cardroom_engine::cards::{FlipCard, Rank, Suit};
//! use cardroom_engine::flip21::calculate_value;
//!
//! let hand = [
//!     FlipCard::new(0, Suit::Spades, Rank::Ace).face_up(),
//!     FlipCard::new(1, Suit::Hearts, Rank::Ace).face_up(),
//!     FlipCard::new(2, Suit::Clubs, Rank::Nine).face_up(),
//! ];
//! assert_eq!(calculate_value(&hand), 21);
//! ```

pub mod action;
pub mod cards;
pub mod color_clash;
pub mod deck;
pub mod errors;
pub mod flip21;
pub mod logger;
pub mod player;
pub mod turn;
pub mod view;
